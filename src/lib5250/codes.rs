/// TN5250 Protocol Constants and Codes
///
/// Command, order, opcode and attention-key values of the 5250 data stream,
/// as documented in the 5494 Functions Reference (SC30-3533) and RFC 1205.

/// Escape byte preceding every command in a record
pub const ESC: u8 = 0x04;

/// GDS record type for 5250 data
pub const RECORD_TYPE_GDS: u16 = 0x12A0;
/// Variable header length normally sent by the host
pub const VARIABLE_HEADER_LEN: u8 = 0x04;
/// Bytes before the variable header (length, type, reserved)
pub const FIXED_HEADER_LEN: usize = 6;

/// Header flag bits (byte 7)
pub const FLAG_ERR: u8 = 0x80;
pub const FLAG_ATN: u8 = 0x40;
pub const FLAG_SRQ: u8 = 0x04;
pub const FLAG_HLP: u8 = 0x02;

/// Record opcodes
pub const OPCODE_NO_OP: u8 = 0x00;
pub const OPCODE_INVITE: u8 = 0x01;
pub const OPCODE_OUTPUT_ONLY: u8 = 0x02;
pub const OPCODE_PUT_GET: u8 = 0x03;
pub const OPCODE_SAVE_SCREEN: u8 = 0x04;
pub const OPCODE_RESTORE_SCREEN: u8 = 0x05;
pub const OPCODE_READ_IMMEDIATE: u8 = 0x06;
pub const OPCODE_READ_SCREEN: u8 = 0x08;
pub const OPCODE_CANCEL_INVITE: u8 = 0x0A;
pub const OPCODE_MESSAGE_LIGHT_ON: u8 = 0x0B;
pub const OPCODE_MESSAGE_LIGHT_OFF: u8 = 0x0C;

/// 5250 Protocol Commands
pub const CMD_CLEAR_UNIT: u8 = 0x40;
pub const CMD_CLEAR_UNIT_ALTERNATE: u8 = 0x20;
pub const CMD_CLEAR_FORMAT_TABLE: u8 = 0x50;
pub const CMD_WRITE_TO_DISPLAY: u8 = 0x11;
pub const CMD_WRITE_ERROR_CODE: u8 = 0x21;
pub const CMD_WRITE_ERROR_CODE_WINDOW: u8 = 0x22;
pub const CMD_READ_INPUT_FIELDS: u8 = 0x42;
pub const CMD_READ_MDT_FIELDS: u8 = 0x52;
pub const CMD_READ_MDT_FIELDS_ALT: u8 = 0x82;
pub const CMD_READ_SCREEN_IMMEDIATE: u8 = 0x62;
pub const CMD_READ_IMMEDIATE: u8 = 0x72;
pub const CMD_SAVE_SCREEN: u8 = 0x02;
pub const CMD_SAVE_PARTIAL_SCREEN: u8 = 0x03;
pub const CMD_RESTORE_SCREEN: u8 = 0x12;
pub const CMD_RESTORE_PARTIAL_SCREEN: u8 = 0x13;
pub const CMD_ROLL: u8 = 0x23;
pub const CMD_WRITE_STRUCTURED_FIELD: u8 = 0xF3;

/// 5250 Protocol Orders
pub const SOH: u8 = 0x01; // Start of header
pub const RA: u8 = 0x02; // Repeat to address
pub const EA: u8 = 0x03; // Erase to address
pub const TD: u8 = 0x10; // Transparent data
pub const SBA: u8 = 0x11; // Set buffer address
pub const WEA: u8 = 0x12; // Write extended attribute
pub const IC: u8 = 0x13; // Insert cursor
pub const MC: u8 = 0x14; // Move cursor
pub const WDSF: u8 = 0x15; // Write to display structured field
pub const SF: u8 = 0x1D; // Start of field

/// Data bytes below 0x40 that are not orders
pub const DUP_CHAR: u8 = 0x1C;
pub const FIELD_MARK: u8 = 0x1E;

/// Structured field class for 5250
pub const SF_CLASS_5250: u8 = 0xD9;
pub const SF_5250_QUERY: u8 = 0x70;
pub const SF_5250_QUERY_STATION_STATE: u8 = 0x72;

/// Write to display structured field types
pub const DEFINE_SELECTION_FIELD: u8 = 0x50;
pub const CREATE_WINDOW: u8 = 0x51;
pub const UNREST_WIN_CURS_MOVE: u8 = 0x52;
pub const DEFINE_SCROLL_BAR_FIELD: u8 = 0x53;
pub const WRITE_DATA: u8 = 0x54;
pub const REM_GUI_SEL_FIELD: u8 = 0x58;
pub const REM_GUI_WINDOW: u8 = 0x59;
pub const REM_GUI_SCROLL_BAR_FIELD: u8 = 0x5B;
pub const REM_ALL_GUI_CONSTRUCTS: u8 = 0x5F;

/// Write extended attribute types
pub const WEA_PRIMARY: u8 = 0x01;
pub const WEA_FOREGROUND_COLOR: u8 = 0x03;
pub const WEA_IDEOGRAPHIC: u8 = 0x05;

/// Control character 1 (top three bits)
pub const CC1_MASK: u8 = 0xE0;
pub const CC1_LOCK: u8 = 0x20;
pub const CC1_RESET_MDT_NON_BYPASS: u8 = 0x40;
pub const CC1_RESET_MDT_ALL: u8 = 0x60;
pub const CC1_NULL_NON_BYPASS_MDT: u8 = 0x80;
pub const CC1_RESET_MDT_NULL_NON_BYPASS: u8 = 0xA0;
pub const CC1_NULL_MDT_RESET_NON_BYPASS: u8 = 0xC0;
pub const CC1_NULL_NON_BYPASS_RESET_ALL: u8 = 0xE0;

/// Control character 2 flags
pub const CC2_IC_ULOCK: u8 = 0x40;
pub const CC2_CLR_BLINK: u8 = 0x20;
pub const CC2_SET_BLINK: u8 = 0x10;
pub const CC2_UNLOCK: u8 = 0x08;
pub const CC2_ALARM: u8 = 0x04;
pub const CC2_MESSAGE_OFF: u8 = 0x02;
pub const CC2_MESSAGE_ON: u8 = 0x01;

/// Attention identifiers
pub const AID_ENTER: u8 = 0xF1;
pub const AID_HELP: u8 = 0xF3;
pub const AID_ROLL_DOWN: u8 = 0xF4;
pub const AID_ROLL_UP: u8 = 0xF5;
pub const AID_PRINT: u8 = 0xF6;
pub const AID_RECORD_BACKSPACE: u8 = 0xF8;
pub const AID_CLEAR: u8 = 0xBD;
pub const AID_F1: u8 = 0x31;
pub const AID_F13: u8 = 0xB1;
pub const AID_INBOUND_WSF: u8 = 0x88;

/// Field Attributes
/// Bits 0-2 always set to 001 to identify as an attribute byte.
pub const ATTR_5250_GREEN: u8 = 0x20; // Default
pub const ATTR_5250_WHITE: u8 = 0x22;
pub const ATTR_5250_NONDISP: u8 = 0x27; // Nondisplay
pub const ATTR_5250_RED: u8 = 0x28;
pub const ATTR_5250_TURQ: u8 = 0x30;
pub const ATTR_5250_YELLOW: u8 = 0x32;
pub const ATTR_5250_PINK: u8 = 0x38;
pub const ATTR_5250_BLUE: u8 = 0x3A;

pub const ATTR_5250_NORMAL: u8 = ATTR_5250_GREEN;

/// Attribute bit meanings within 0x20..=0x3F
pub const ATTR_REVERSE: u8 = 0x01;
pub const ATTR_UNDERLINE: u8 = 0x04;
pub const ATTR_NON_DISPLAY_BITS: u8 = 0x07;

/// True for bytes that encode a display attribute
pub fn is_attribute_byte(byte: u8) -> bool {
    (byte & 0xE0) == 0x20
}

/// Record opcodes as an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    NoOp,
    Invite,
    OutputOnly,
    PutGet,
    SaveScreen,
    RestoreScreen,
    ReadImmediate,
    ReadScreen,
    CancelInvite,
    MessageLightOn,
    MessageLightOff,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            OPCODE_NO_OP => Some(Self::NoOp),
            OPCODE_INVITE => Some(Self::Invite),
            OPCODE_OUTPUT_ONLY => Some(Self::OutputOnly),
            OPCODE_PUT_GET => Some(Self::PutGet),
            OPCODE_SAVE_SCREEN => Some(Self::SaveScreen),
            OPCODE_RESTORE_SCREEN => Some(Self::RestoreScreen),
            OPCODE_READ_IMMEDIATE => Some(Self::ReadImmediate),
            OPCODE_READ_SCREEN => Some(Self::ReadScreen),
            OPCODE_CANCEL_INVITE => Some(Self::CancelInvite),
            OPCODE_MESSAGE_LIGHT_ON => Some(Self::MessageLightOn),
            OPCODE_MESSAGE_LIGHT_OFF => Some(Self::MessageLightOff),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoOp => OPCODE_NO_OP,
            Self::Invite => OPCODE_INVITE,
            Self::OutputOnly => OPCODE_OUTPUT_ONLY,
            Self::PutGet => OPCODE_PUT_GET,
            Self::SaveScreen => OPCODE_SAVE_SCREEN,
            Self::RestoreScreen => OPCODE_RESTORE_SCREEN,
            Self::ReadImmediate => OPCODE_READ_IMMEDIATE,
            Self::ReadScreen => OPCODE_READ_SCREEN,
            Self::CancelInvite => OPCODE_CANCEL_INVITE,
            Self::MessageLightOn => OPCODE_MESSAGE_LIGHT_ON,
            Self::MessageLightOff => OPCODE_MESSAGE_LIGHT_OFF,
        }
    }
}

/// Enum representation of 5250 protocol commands for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    ClearUnit = CMD_CLEAR_UNIT as isize,
    ClearUnitAlternate = CMD_CLEAR_UNIT_ALTERNATE as isize,
    ClearFormatTable = CMD_CLEAR_FORMAT_TABLE as isize,
    WriteToDisplay = CMD_WRITE_TO_DISPLAY as isize,
    WriteErrorCode = CMD_WRITE_ERROR_CODE as isize,
    WriteErrorCodeWindow = CMD_WRITE_ERROR_CODE_WINDOW as isize,
    ReadInputFields = CMD_READ_INPUT_FIELDS as isize,
    ReadMdtFields = CMD_READ_MDT_FIELDS as isize,
    ReadMdtFieldsAlt = CMD_READ_MDT_FIELDS_ALT as isize,
    ReadScreenImmediate = CMD_READ_SCREEN_IMMEDIATE as isize,
    ReadImmediate = CMD_READ_IMMEDIATE as isize,
    SaveScreen = CMD_SAVE_SCREEN as isize,
    SavePartialScreen = CMD_SAVE_PARTIAL_SCREEN as isize,
    RestoreScreen = CMD_RESTORE_SCREEN as isize,
    RestorePartialScreen = CMD_RESTORE_PARTIAL_SCREEN as isize,
    Roll = CMD_ROLL as isize,
    WriteStructuredField = CMD_WRITE_STRUCTURED_FIELD as isize,
}

impl CommandCode {
    /// Convert a byte value to a CommandCode enum
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_CLEAR_UNIT => Some(Self::ClearUnit),
            CMD_CLEAR_UNIT_ALTERNATE => Some(Self::ClearUnitAlternate),
            CMD_CLEAR_FORMAT_TABLE => Some(Self::ClearFormatTable),
            CMD_WRITE_TO_DISPLAY => Some(Self::WriteToDisplay),
            CMD_WRITE_ERROR_CODE => Some(Self::WriteErrorCode),
            CMD_WRITE_ERROR_CODE_WINDOW => Some(Self::WriteErrorCodeWindow),
            CMD_READ_INPUT_FIELDS => Some(Self::ReadInputFields),
            CMD_READ_MDT_FIELDS => Some(Self::ReadMdtFields),
            CMD_READ_MDT_FIELDS_ALT => Some(Self::ReadMdtFieldsAlt),
            CMD_READ_SCREEN_IMMEDIATE => Some(Self::ReadScreenImmediate),
            CMD_READ_IMMEDIATE => Some(Self::ReadImmediate),
            CMD_SAVE_SCREEN => Some(Self::SaveScreen),
            CMD_SAVE_PARTIAL_SCREEN => Some(Self::SavePartialScreen),
            CMD_RESTORE_SCREEN => Some(Self::RestoreScreen),
            CMD_RESTORE_PARTIAL_SCREEN => Some(Self::RestorePartialScreen),
            CMD_ROLL => Some(Self::Roll),
            CMD_WRITE_STRUCTURED_FIELD => Some(Self::WriteStructuredField),
            _ => None,
        }
    }

    /// Convert CommandCode enum to byte value
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Read commands leave a pending read that the next attention key answers
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Self::ReadInputFields | Self::ReadMdtFields | Self::ReadMdtFieldsAlt
        )
    }
}

/// Enum representation of 5250 protocol orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderCode {
    StartOfHeader = SOH as isize,
    RepeatToAddress = RA as isize,
    EraseToAddress = EA as isize,
    TransparentData = TD as isize,
    SetBufferAddress = SBA as isize,
    WriteExtendedAttribute = WEA as isize,
    InsertCursor = IC as isize,
    MoveCursor = MC as isize,
    WriteDisplayStructuredField = WDSF as isize,
    StartOfField = SF as isize,
}

impl OrderCode {
    /// Convert a byte value to an OrderCode enum
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            SOH => Some(Self::StartOfHeader),
            RA => Some(Self::RepeatToAddress),
            EA => Some(Self::EraseToAddress),
            TD => Some(Self::TransparentData),
            SBA => Some(Self::SetBufferAddress),
            WEA => Some(Self::WriteExtendedAttribute),
            IC => Some(Self::InsertCursor),
            MC => Some(Self::MoveCursor),
            WDSF => Some(Self::WriteDisplayStructuredField),
            SF => Some(Self::StartOfField),
            _ => None,
        }
    }

    /// Convert OrderCode enum to byte value
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_conversion() {
        assert_eq!(CommandCode::from_u8(CMD_WRITE_TO_DISPLAY), Some(CommandCode::WriteToDisplay));
        assert_eq!(CommandCode::WriteToDisplay.to_u8(), CMD_WRITE_TO_DISPLAY);
        assert_eq!(CommandCode::from_u8(0xFF), None);
        assert!(CommandCode::ReadMdtFields.is_read());
        assert!(!CommandCode::ReadImmediate.is_read());
    }

    #[test]
    fn test_order_code_conversion() {
        for order in [SOH, RA, EA, TD, SBA, WEA, IC, MC, WDSF, SF] {
            assert_eq!(OrderCode::from_u8(order).map(OrderCode::to_u8), Some(order));
        }
        assert_eq!(OrderCode::from_u8(0x04), None);
    }

    #[test]
    fn test_opcode_conversion() {
        for value in 0..=0x0Cu8 {
            if let Some(opcode) = Opcode::from_u8(value) {
                assert_eq!(opcode.to_u8(), value);
            }
        }
        assert_eq!(Opcode::from_u8(0x07), None);
    }

    #[test]
    fn test_field_attributes() {
        assert_eq!(ATTR_5250_NORMAL, ATTR_5250_GREEN);
        assert!(is_attribute_byte(ATTR_5250_NONDISP));
        assert!(!is_attribute_byte(0x40));
        assert!(!is_attribute_byte(0x1D));
    }
}
