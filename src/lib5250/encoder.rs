//! Inbound (workstation to host) record construction
//!
//! Attention keys, read responses, save-screen images and the query reply
//! are all built here. Field content is validated against the format table
//! before anything is encoded, so a rejected submission never produces
//! bytes.

use std::sync::Arc;

use log::debug;

use super::codes::{
    CommandCode, AID_CLEAR, AID_ENTER, AID_F1, AID_F13, AID_HELP, AID_INBOUND_WSF, AID_PRINT,
    AID_RECORD_BACKSPACE, AID_ROLL_DOWN, AID_ROLL_UP, CC2_UNLOCK, CMD_CLEAR_UNIT,
    CMD_CLEAR_UNIT_ALTERNATE, CMD_WRITE_TO_DISPLAY, ESC, FIXED_HEADER_LEN, FLAG_ATN, FLAG_SRQ,
    IC, OPCODE_CANCEL_INVITE, OPCODE_NO_OP, OPCODE_PUT_GET, OPCODE_SAVE_SCREEN, RECORD_TYPE_GDS,
    SBA, SF, SF_5250_QUERY, SF_CLASS_5250, VARIABLE_HEADER_LEN,
};
use super::display::{Display, WIDE_COLS, WIDE_ROWS};
use super::field::{AdjustMode, FieldId, FieldShift};
use super::screen::NULL_CHAR;
use crate::codec::{Codec, Diagnostics, EncodeState};
use crate::config::MAX_RECORD_LEN;
use crate::error::{ProtocolError, ProtocolResult, ValidationError};

/// Total length of a record header
pub const RECORD_HEADER_LEN: usize = FIXED_HEADER_LEN + VARIABLE_HEADER_LEN as usize;

/// Wrap a payload in a GDS record header
///
/// Fails when header and payload together do not fit the two-byte length.
pub fn build_record(opcode: u8, flags: u8, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let total = RECORD_HEADER_LEN + payload.len();
    let length = u16::try_from(total).map_err(|_| ProtocolError::RecordTooLong {
        length: total,
        max: MAX_RECORD_LEN,
    })?;
    let mut record = Vec::with_capacity(total);
    record.extend_from_slice(&length.to_be_bytes());
    record.extend_from_slice(&RECORD_TYPE_GDS.to_be_bytes());
    record.extend_from_slice(&[0x00, 0x00]);
    record.push(VARIABLE_HEADER_LEN);
    record.push(flags);
    record.push(0x00);
    record.push(opcode);
    record.extend_from_slice(payload);
    Ok(record)
}

/// Operator submissions that cannot be framed are rejected before the wire
fn submission(opcode: u8, flags: u8, payload: &[u8]) -> Result<Vec<u8>, ValidationError> {
    build_record(opcode, flags, payload).map_err(|_| ValidationError::RecordTooLong {
        len: RECORD_HEADER_LEN + payload.len(),
        max: MAX_RECORD_LEN,
    })
}

/// Attention keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AidKey {
    Enter,
    /// Command function key 1 through 24
    F(u8),
    Clear,
    Help,
    RollUp,
    RollDown,
    Print,
    RecordBackspace,
    SysReq,
    Attention,
}

impl AidKey {
    /// Function key `n`, if it exists
    pub fn function(n: u8) -> Option<Self> {
        (1..=24).contains(&n).then_some(Self::F(n))
    }

    /// AID byte; SysReq and Attention travel as header flags instead
    pub fn code(self) -> Option<u8> {
        match self {
            Self::Enter => Some(AID_ENTER),
            Self::F(n @ 1..=12) => Some(AID_F1 + (n - 1)),
            Self::F(n @ 13..=24) => Some(AID_F13 + (n - 13)),
            Self::F(_) => None,
            Self::Clear => Some(AID_CLEAR),
            Self::Help => Some(AID_HELP),
            Self::RollUp => Some(AID_ROLL_UP),
            Self::RollDown => Some(AID_ROLL_DOWN),
            Self::Print => Some(AID_PRINT),
            Self::RecordBackspace => Some(AID_RECORD_BACKSPACE),
            Self::SysReq | Self::Attention => None,
        }
    }

    /// Whether field data follows the AID byte
    pub fn carries_data(self) -> bool {
        matches!(self, Self::Enter | Self::F(_) | Self::RollUp | Self::RollDown)
    }

    /// Header flag for keys sent without a payload
    pub fn header_flag(self) -> Option<u8> {
        match self {
            Self::SysReq => Some(FLAG_SRQ),
            Self::Attention => Some(FLAG_ATN),
            _ => None,
        }
    }
}

/// Device type and model reported in the query reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Four characters, e.g. "3179"
    pub device_type: String,
    /// Three characters, e.g. "002"
    pub model: String,
}

impl DeviceIdentity {
    /// Split a terminal type such as `IBM-3477-FC`
    pub fn from_terminal_type(terminal_type: &str) -> Self {
        let mut parts = terminal_type.split('-').skip(1);
        let device_type = parts
            .next()
            .filter(|t| !t.is_empty())
            .map(|t| t.chars().take(4).collect())
            .unwrap_or_else(|| "3179".to_string());
        let model: String = parts
            .next()
            .map(|m| m.chars().take(3).collect())
            .unwrap_or_else(|| "2".to_string());
        Self {
            device_type,
            model: format!("{model:0>3}"),
        }
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::from_terminal_type("IBM-3179-2")
    }
}

/// Builds inbound records with the session codec
#[derive(Debug, Clone)]
pub struct DataStreamEncoder {
    codec: Arc<dyn Codec>,
    diagnostics: Diagnostics,
}

impl DataStreamEncoder {
    pub fn new(codec: Arc<dyn Codec>, diagnostics: Diagnostics) -> Self {
        Self { codec, diagnostics }
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Record for an attention key
    ///
    /// Field data follows the rules of the outstanding read command: Read
    /// MDT sends modified fields without trailing nulls, Read Input Fields
    /// sends every input field at full length once any field is modified.
    pub fn encode_aid(&self, display: &Display, aid: AidKey) -> Result<Vec<u8>, ValidationError> {
        if let Some(flag) = aid.header_flag() {
            return submission(OPCODE_NO_OP, flag, &[]);
        }
        let code = aid.code().ok_or_else(|| ValidationError::UnknownKey(format!("{aid:?}")))?;

        let read = display.read_opcode().unwrap_or(CommandCode::ReadMdtFields);
        let fields = if aid.carries_data() {
            self.check_mandatory_enter(display)?;
            self.field_data(display, read)?
        } else {
            Vec::new()
        };

        let (row, col) = display.screen().cursor_coords();
        let mut payload = Vec::with_capacity(3 + fields.len());
        payload.push((row + 1) as u8);
        payload.push((col + 1) as u8);
        payload.push(code);
        payload.extend_from_slice(&fields);
        debug!("AID 0x{code:02X} with {} bytes of field data", fields.len());
        submission(OPCODE_PUT_GET, 0x00, &payload)
    }

    fn check_mandatory_enter(&self, display: &Display) -> Result<(), ValidationError> {
        let fields = display.fields();
        for id in fields.input_fields() {
            let Some(field) = fields.get(id) else { continue };
            if field.is_mandatory_enter() && fields.text(display.screen(), id).trim().is_empty() {
                let (row, col) = display.screen().coords(field.start);
                return Err(ValidationError::MandatoryEnter { row, col });
            }
        }
        Ok(())
    }

    /// SBA-prefixed field data for a read response
    pub fn field_data(&self, display: &Display, read: CommandCode) -> Result<Vec<u8>, ValidationError> {
        let fields = display.fields();
        let full_length = matches!(read, CommandCode::ReadInputFields | CommandCode::ReadImmediate);

        let selected: Vec<FieldId> = if full_length {
            if fields.modified_fields().is_empty() {
                Vec::new()
            } else {
                fields.input_fields()
            }
        } else {
            fields.modified_fields()
        };

        // Validate everything first so nothing is emitted on rejection
        for &id in &selected {
            self.validate_field(display, id)?;
        }

        let mut out = Vec::new();
        for id in selected {
            let signed = fields.get(id).and_then(|f| f.shift()) == Some(FieldShift::SignedNumeric);
            for segment in fields.segments(id) {
                let Some(field) = fields.get(segment) else { continue };
                let mut text = display.screen().text_range(field.start, field.length);
                if !full_length {
                    text.truncate(text.trim_end_matches(NULL_CHAR).len());
                }
                let (row, col) = display.screen().coords(field.start);
                out.push(SBA);
                out.push((row + 1) as u8);
                out.push((col + 1) as u8);
                if signed {
                    out.extend(self.encode_signed(&text));
                } else {
                    out.extend(self.codec.encode(&text, &self.diagnostics));
                }
            }
        }
        Ok(out)
    }

    /// Re-check content the host or operator placed in a field
    fn validate_field(&self, display: &Display, id: FieldId) -> Result<(), ValidationError> {
        let fields = display.fields();
        let Some(field) = fields.get(id) else {
            return Ok(());
        };
        let Some(format) = field.format.filter(|_| field.is_input()) else {
            return Ok(());
        };
        let text = fields.text(display.screen(), id);
        let text = match field.adjust() {
            AdjustMode::RightBlankFill => text.trim_start().to_string(),
            _ => text,
        };
        if text.is_empty() {
            return Ok(());
        }
        format.normalize(&text, fields.logical_length(id)).map(|_| ())
    }

    /// Digits with a trailing '-' become digits with zone D on the last one
    fn encode_signed(&self, text: &str) -> Vec<u8> {
        let negative = text.trim_end_matches(NULL_CHAR).ends_with('-');
        let mut bytes: Vec<u8> = Vec::with_capacity(text.len());
        let mut last_digit = None;
        for ch in text.chars() {
            match ch {
                '-' | '+' => continue,
                '0'..='9' => {
                    last_digit = Some(bytes.len());
                    bytes.push(0xF0 | (ch as u8 - b'0'));
                }
                _ => bytes.extend(self.codec.encode(&ch.to_string(), &self.diagnostics)),
            }
        }
        if negative {
            if let Some(i) = last_digit {
                bytes[i] = 0xD0 | (bytes[i] & 0x0F);
            }
        }
        bytes
    }

    /// Response to Read Immediate: cursor, no AID, input fields
    pub fn read_immediate_response(&self, display: &Display) -> Result<Vec<u8>, ValidationError> {
        let (row, col) = display.screen().cursor_coords();
        let mut payload = vec![(row + 1) as u8, (col + 1) as u8, 0x00];
        payload.extend(self.field_data(display, CommandCode::ReadImmediate)?);
        submission(OPCODE_PUT_GET, 0x00, &payload)
    }

    /// Screen content as host bytes, attribute positions included
    pub fn screen_bytes(&self, display: &Display) -> Vec<u8> {
        let mut out = Vec::with_capacity(display.screen().capacity());
        let mut state = EncodeState::default();
        for cell in display.screen().cells() {
            if cell.wide_tail {
                continue;
            }
            if cell.is_attribute_position {
                self.codec.finish_encode(&mut state, &mut out);
                out.push(cell.attribute);
            } else {
                self.codec.encode_char(&mut state, cell.ch, &mut out, &self.diagnostics);
            }
        }
        self.codec.finish_encode(&mut state, &mut out);
        out
    }

    /// Response to Read Screen Immediate
    pub fn read_screen_response(&self, display: &Display) -> ProtocolResult<Vec<u8>> {
        build_record(OPCODE_NO_OP, 0x00, &self.screen_bytes(display))
    }

    /// Data stream that rebuilds the current display when sent back
    ///
    /// The image clears the unit, rewrites every cell from (1,1) with Start
    /// Of Field orders where fields begin, puts the cursor back and repeats
    /// any outstanding read command.
    pub fn save_screen_image(&self, display: &Display) -> Vec<u8> {
        let screen = display.screen();
        let fields = display.fields();
        let mut out = Vec::with_capacity(screen.capacity() + 32);

        if screen.rows() == WIDE_ROWS && screen.cols() == WIDE_COLS {
            out.extend_from_slice(&[ESC, CMD_CLEAR_UNIT_ALTERNATE, 0x00]);
        } else {
            out.extend_from_slice(&[ESC, CMD_CLEAR_UNIT]);
        }
        let cc2 = if display.oia().is_keyboard_locked() { 0x00 } else { CC2_UNLOCK };
        out.extend_from_slice(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, cc2]);
        out.extend_from_slice(&[SBA, 1, 1]);

        let mut state = EncodeState::default();
        for (pos, cell) in screen.cells().iter().enumerate() {
            if cell.wide_tail {
                continue;
            }
            if !cell.is_attribute_position {
                self.codec.encode_char(&mut state, cell.ch, &mut out, &self.diagnostics);
                continue;
            }
            self.codec.finish_encode(&mut state, &mut out);
            match fields.fields().iter().find(|f| f.attribute_position() == pos && f.start == pos + 1) {
                Some(field) => {
                    out.push(SF);
                    if let Some(format) = field.format {
                        out.extend_from_slice(&format.with_mdt(field.is_modified()).to_bytes());
                        for control in &field.controls {
                            out.extend_from_slice(&[control.fcw1, control.fcw2]);
                        }
                    }
                    out.push(field.attribute);
                    out.extend_from_slice(&(field.length as u16).to_be_bytes());
                }
                None => out.push(cell.attribute),
            }
        }
        self.codec.finish_encode(&mut state, &mut out);

        let (row, col) = screen.cursor_coords();
        out.extend_from_slice(&[IC, (row + 1) as u8, (col + 1) as u8]);

        if let Some(read) = display.read_opcode() {
            out.extend_from_slice(&[ESC, read.to_u8(), 0x00, 0x00]);
        }
        out
    }

    /// Response to Save Screen
    pub fn save_screen_response(&self, display: &Display) -> ProtocolResult<Vec<u8>> {
        build_record(OPCODE_SAVE_SCREEN, 0x00, &self.save_screen_image(display))
    }

    /// Acknowledgement of Cancel Invite
    pub fn cancel_invite_response(&self) -> ProtocolResult<Vec<u8>> {
        build_record(OPCODE_CANCEL_INVITE, 0x00, &[])
    }

    /// Reply to a 5250 Query structured field
    pub fn query_reply(&self, device: &DeviceIdentity) -> ProtocolResult<Vec<u8>> {
        const REPLY_LEN: usize = 0x3A;
        let mut payload = Vec::with_capacity(REPLY_LEN + 3);

        // Cursor 0,0 and the inbound structured field AID
        payload.extend_from_slice(&[0x00, 0x00, AID_INBOUND_WSF]);
        payload.extend_from_slice(&(REPLY_LEN as u16).to_be_bytes());
        payload.extend_from_slice(&[SF_CLASS_5250, SF_5250_QUERY, 0x80]);
        // Controller hardware class and code level
        payload.extend_from_slice(&[0x06, 0x00, 0x01, 0x01, 0x00]);
        payload.extend_from_slice(&[0x00; 16]);
        // Display emulation
        payload.push(0x01);
        payload.extend(self.fixed_width_ebcdic(&device.device_type, 4));
        payload.extend(self.fixed_width_ebcdic(&device.model, 3));
        // Keyboard id, extended keyboard id, reserved
        payload.extend_from_slice(&[0x02, 0x00, 0x00]);
        // Display serial number
        payload.extend_from_slice(&[0x00, 0x61, 0x50, 0x00]);
        // Maximum input fields
        payload.extend_from_slice(&[0xFF, 0xFF]);
        payload.extend_from_slice(&[0x00, 0x00, 0x00]);
        // Controller/display capability
        payload.extend_from_slice(&[0x23, 0x31, 0x00, 0x00]);
        if self.codec.is_double_byte() {
            payload.extend_from_slice(&[0x02, 0x80]);
        } else {
            payload.extend_from_slice(&[0x00, 0x00]);
        }
        payload.resize(REPLY_LEN + 3, 0x00);
        build_record(OPCODE_NO_OP, 0x00, &payload)
    }

    fn fixed_width_ebcdic(&self, text: &str, width: usize) -> Vec<u8> {
        let padded: String = format!("{text:<width$}").chars().take(width).collect();
        self.codec.encode(&padded, &self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::lib5250::field::{Field, FieldFormat, FFW1_ID, FFW2_MANDATORY_ENTER};

    fn encoder() -> DataStreamEncoder {
        let codec = CodecRegistry::builtin().get("37").unwrap();
        DataStreamEncoder::new(codec, Diagnostics::disabled())
    }

    fn display_with(shift: u8, ffw2: u8, length: usize) -> Display {
        let mut display = Display::default();
        let screen = display.screen().clone();
        display
            .fields_mut()
            .define(Field::input(81, length, 0x24, FieldFormat::new(FFW1_ID | shift, ffw2), vec![]), &screen)
            .unwrap();
        display.begin_read(CommandCode::ReadMdtFields);
        display.set_cursor(81);
        display
    }

    #[test]
    fn test_record_header_layout() {
        let record = build_record(OPCODE_PUT_GET, 0x00, &[1, 2, 3]).unwrap();
        assert_eq!(record, vec![0x00, 0x0D, 0x12, 0xA0, 0x00, 0x00, 0x04, 0x00, 0x00, 0x03, 1, 2, 3]);
    }

    #[test]
    fn test_record_length_limit() {
        let largest = vec![0x40; MAX_RECORD_LEN - RECORD_HEADER_LEN];
        let record = build_record(OPCODE_PUT_GET, 0x00, &largest).unwrap();
        assert_eq!(record[..2], [0xFF, 0xFF]);

        let oversized = vec![0x40; MAX_RECORD_LEN - RECORD_HEADER_LEN + 1];
        assert_eq!(
            build_record(OPCODE_PUT_GET, 0x00, &oversized),
            Err(ProtocolError::RecordTooLong {
                length: MAX_RECORD_LEN + 1,
                max: MAX_RECORD_LEN,
            })
        );
        assert_eq!(
            submission(OPCODE_PUT_GET, 0x00, &oversized),
            Err(ValidationError::RecordTooLong {
                len: MAX_RECORD_LEN + 1,
                max: MAX_RECORD_LEN,
            })
        );
    }

    #[test]
    fn test_function_key_codes() {
        assert_eq!(AidKey::F(1).code(), Some(0x31));
        assert_eq!(AidKey::F(12).code(), Some(0x3C));
        assert_eq!(AidKey::F(13).code(), Some(0xB1));
        assert_eq!(AidKey::F(24).code(), Some(0xBC));
        assert_eq!(AidKey::function(25), None);
        assert_eq!(AidKey::Enter.code(), Some(0xF1));
    }

    #[test]
    fn test_enter_sends_modified_field() {
        let mut display = display_with(0x00, 0x00, 10);
        let (screen, fields) = display.screen_and_fields_mut();
        fields.set_text(screen, 0, "HI").unwrap();
        display.set_cursor(83);

        let record = encoder().encode_aid(&display, AidKey::Enter).unwrap();
        assert_eq!(&record[RECORD_HEADER_LEN..], &[2, 4, 0xF1, SBA, 2, 2, 0xC8, 0xC9]);
    }

    #[test]
    fn test_clear_sends_no_field_data() {
        let mut display = display_with(0x00, 0x00, 10);
        let (screen, fields) = display.screen_and_fields_mut();
        fields.set_text(screen, 0, "HI").unwrap();
        let record = encoder().encode_aid(&display, AidKey::Clear).unwrap();
        assert_eq!(&record[RECORD_HEADER_LEN..], &[2, 2, AID_CLEAR]);
    }

    #[test]
    fn test_read_input_fields_sends_full_length() {
        let mut display = display_with(0x00, 0x00, 4);
        display.begin_read(CommandCode::ReadInputFields);
        let (screen, fields) = display.screen_and_fields_mut();
        fields.set_text(screen, 0, "AB").unwrap();
        let record = encoder().encode_aid(&display, AidKey::Enter).unwrap();
        assert_eq!(&record[RECORD_HEADER_LEN + 3..], &[SBA, 2, 2, 0xC1, 0xC2, 0x00, 0x00]);
    }

    #[test]
    fn test_mandatory_enter_blocks_enter() {
        let display = display_with(0x00, FFW2_MANDATORY_ENTER, 5);
        assert!(matches!(
            encoder().encode_aid(&display, AidKey::Enter),
            Err(ValidationError::MandatoryEnter { row: 1, col: 1 })
        ));
        // Clear carries no data and is allowed
        assert!(encoder().encode_aid(&display, AidKey::Clear).is_ok());
    }

    #[test]
    fn test_negative_signed_numeric_uses_zone_d() {
        let mut display = display_with(0x07, 0x00, 5);
        let (screen, fields) = display.screen_and_fields_mut();
        fields.set_text(screen, 0, "-123").unwrap();
        let record = encoder().encode_aid(&display, AidKey::Enter).unwrap();
        assert_eq!(&record[RECORD_HEADER_LEN + 3..], &[SBA, 2, 2, 0xF1, 0xF2, 0xD3]);
    }

    #[test]
    fn test_host_written_invalid_numeric_rejected() {
        let mut display = display_with(0x03, 0x00, 5);
        for (offset, ch) in "12a45".chars().enumerate() {
            display.screen_mut().put_char(81 + offset, ch);
        }
        display.fields_mut().set_modified(0, true);
        assert!(matches!(
            encoder().encode_aid(&display, AidKey::Enter),
            Err(ValidationError::InvalidCharacter { ch: 'a', .. })
        ));
    }

    #[test]
    fn test_sysreq_and_attention_are_header_flags() {
        let display = Display::default();
        let record = encoder().encode_aid(&display, AidKey::SysReq).unwrap();
        assert_eq!(record.len(), RECORD_HEADER_LEN);
        assert_eq!(record[7], FLAG_SRQ);
        let record = encoder().encode_aid(&display, AidKey::Attention).unwrap();
        assert_eq!(record[7], FLAG_ATN);
    }

    #[test]
    fn test_query_reply_reports_device_in_ebcdic() {
        let record = encoder().query_reply(&DeviceIdentity::from_terminal_type("IBM-3477-FC")).unwrap();
        let payload = &record[RECORD_HEADER_LEN..];
        assert_eq!(payload.len(), 0x3A + 3);
        assert_eq!(&payload[..3], &[0x00, 0x00, 0x88]);
        assert_eq!(&payload[5..8], &[0xD9, 0x70, 0x80]);
        // "3477" then "0FC"
        assert_eq!(&payload[30..34], &[0xF3, 0xF4, 0xF7, 0xF7]);
        assert_eq!(&payload[34..37], &[0xF0, 0xC6, 0xC3]);
    }

    #[test]
    fn test_device_identity_defaults() {
        let id = DeviceIdentity::from_terminal_type("IBM-3179-2");
        assert_eq!(id.device_type, "3179");
        assert_eq!(id.model, "002");
        assert_eq!(DeviceIdentity::from_terminal_type("IBM-5555-C01").model, "C01");
    }
}
