//! 5250 data stream decoder
//!
//! Turns one host record (telnet framing already removed) into mutations of
//! a [`Display`]. Decoding runs against a working copy of the display and
//! only replaces the caller's state once the whole record has been accepted,
//! so a malformed record leaves the screen, fields and OIA exactly as they
//! were.
//!
//! Records carry a GDS header (RFC 1205) followed by commands, each
//! introduced by ESC. Write To Display carries the order stream that paints
//! the screen and defines fields.

use std::sync::Arc;

use log::{debug, trace, warn};

use super::codes::{
    is_attribute_byte, CommandCode, Opcode, OrderCode, ATTR_5250_NORMAL, DUP_CHAR, ESC, FIELD_MARK,
    FIXED_HEADER_LEN, OPCODE_PUT_GET, RECORD_TYPE_GDS, SF_5250_QUERY,
    SF_5250_QUERY_STATION_STATE, SF_CLASS_5250, WEA_FOREGROUND_COLOR, WEA_IDEOGRAPHIC,
    WEA_PRIMARY,
};
use super::display::Display;
use super::encoder::{build_record, DataStreamEncoder, DeviceIdentity, RECORD_HEADER_LEN};
use super::field::{Field, FieldControl, FieldFormat};
use super::screen::{Cell, Color, DirtyRegion, ExtendedAttribute};
use crate::codec::{Codec, DecodeState, Decoded, Diagnostics, REPLACEMENT_CHAR, SHIFT_IN, SHIFT_OUT};
use crate::error::{ProtocolError, ProtocolResult};

/// Erase-to-address type that also clears attribute positions
const EA_ERASE_ALL: u8 = 0xFF;

/// Clear Unit Alternate parameter values
const CUA_WIDE: u8 = 0x00;
const CUA_WIDE_NO_RESIZE: u8 = 0x80;

/// Parameter bytes of Save Partial Screen
const SAVE_PARTIAL_PARAMS: usize = 5;

/// Fixed part of a GDS record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Declared record length, header included
    pub length: usize,
    pub variable_header_len: u8,
    pub flags: u8,
    pub opcode: Opcode,
}

impl RecordHeader {
    pub fn parse(record: &[u8]) -> ProtocolResult<Self> {
        if record.len() < RECORD_HEADER_LEN {
            return Err(ProtocolError::UnexpectedEnd { offset: record.len() });
        }
        let length = usize::from(u16::from_be_bytes([record[0], record[1]]));
        if length > record.len() {
            return Err(ProtocolError::LengthMismatch {
                declared: length,
                available: record.len(),
            });
        }
        if length < RECORD_HEADER_LEN {
            return Err(ProtocolError::UnexpectedEnd { offset: length });
        }
        let record_type = u16::from_be_bytes([record[2], record[3]]);
        if record_type != RECORD_TYPE_GDS {
            return Err(ProtocolError::InvalidRecordType(record_type));
        }
        let variable_header_len = record[6];
        if FIXED_HEADER_LEN + usize::from(variable_header_len) > length {
            return Err(ProtocolError::UnexpectedEnd { offset: length });
        }
        let opcode = Opcode::from_u8(record[9]).ok_or(ProtocolError::UnknownOpcode(record[9]))?;
        Ok(Self {
            length,
            variable_header_len,
            flags: record[7],
            opcode,
        })
    }

    /// Offset of the first command byte
    pub fn payload_offset(&self) -> usize {
        FIXED_HEADER_LEN + usize::from(self.variable_header_len)
    }
}

/// One decoded Write To Display order
///
/// Addresses are kept as received (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    StartOfHeader(Vec<u8>),
    RepeatToAddress { row: u8, col: u8, ch: char },
    EraseToAddress { row: u8, col: u8, types: Vec<u8> },
    TransparentData(Vec<u8>),
    SetBufferAddress { row: u8, col: u8 },
    WriteExtendedAttribute { kind: u8, value: u8 },
    InsertCursor { row: u8, col: u8 },
    MoveCursor { row: u8, col: u8 },
    StartOfField {
        format: Option<FieldFormat>,
        controls: Vec<FieldControl>,
        attribute: u8,
        length: usize,
    },
    WriteStructuredField { class: u8, kind: u8, data: Vec<u8> },
    /// Inline attribute byte between text
    Attribute(u8),
    /// Run of text written at consecutive addresses
    Text(String),
}

/// Everything one record did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub header: RecordHeader,
    pub commands: Vec<CommandCode>,
    pub orders: Vec<Order>,
    /// Complete records to send back to the host
    pub responses: Vec<Vec<u8>>,
    /// Cells touched by this record
    pub dirty: Option<DirtyRegion>,
    pub oia_changed: bool,
    pub fields_changed: bool,
}

impl DecodeOutcome {
    fn new(header: RecordHeader) -> Self {
        Self {
            header,
            commands: Vec::new(),
            orders: Vec::new(),
            responses: Vec::new(),
            dirty: None,
            oia_changed: false,
            fields_changed: false,
        }
    }
}

/// Cursor over the bytes of a record
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn byte(&mut self) -> ProtocolResult<u8> {
        let byte = self.peek().ok_or(ProtocolError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> ProtocolResult<u16> {
        Ok(u16::from_be_bytes([self.byte()?, self.byte()?]))
    }

    fn take(&mut self, len: usize) -> ProtocolResult<&'a [u8]> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(ProtocolError::UnexpectedEnd { offset: self.data.len() });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// Write position and current attributes inside one Write To Display
struct WriteCursor {
    addr: usize,
    attribute: u8,
    extended: Option<ExtendedAttribute>,
    decode: DecodeState,
    text: String,
}

impl WriteCursor {
    fn new(display: &Display) -> Self {
        let addr = display.cursor();
        Self {
            addr,
            attribute: inherited_attribute(display, addr),
            extended: None,
            decode: DecodeState::default(),
            text: String::new(),
        }
    }

    fn advance(&mut self, display: &Display, cells: usize) {
        let capacity = display.screen().capacity().max(1);
        self.addr = (self.addr + cells) % capacity;
    }

    fn put(&mut self, display: &mut Display, ch: char) {
        display.screen_mut().write_char(self.addr, ch, self.attribute, self.extended);
        self.text.push(ch);
        self.advance(display, 1);
    }

    fn put_wide(&mut self, display: &mut Display, ch: char) {
        let capacity = display.screen().capacity().max(1);
        let tail = (self.addr + 1) % capacity;
        display.screen_mut().write_char(self.addr, ch, self.attribute, self.extended);
        display.screen_mut().write_wide_tail(tail, self.attribute, self.extended);
        self.text.push(ch);
        self.advance(display, 2);
    }

    fn move_to(&mut self, display: &Display, addr: usize) {
        self.addr = addr;
        self.attribute = inherited_attribute(display, addr);
        self.extended = None;
    }
}

/// Attribute text written at `addr` picks up when nothing else is set
fn inherited_attribute(display: &Display, addr: usize) -> u8 {
    display
        .screen()
        .cell_at(addr)
        .map(|cell| cell.attribute)
        .unwrap_or(ATTR_5250_NORMAL)
}

/// Stateless decoder shared by one session
#[derive(Debug, Clone)]
pub struct DataStreamDecoder {
    encoder: DataStreamEncoder,
    device: DeviceIdentity,
}

impl DataStreamDecoder {
    pub fn new(codec: Arc<dyn Codec>, diagnostics: Diagnostics, device: DeviceIdentity) -> Self {
        Self {
            encoder: DataStreamEncoder::new(codec, diagnostics),
            device,
        }
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        self.encoder.codec()
    }

    pub fn encoder(&self) -> &DataStreamEncoder {
        &self.encoder
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    /// Apply one record to `display`
    ///
    /// On error `display` is left untouched.
    pub fn decode(&self, display: &mut Display, record: &[u8]) -> ProtocolResult<DecodeOutcome> {
        let header = RecordHeader::parse(record)?;
        trace!("decoding {:?} record of {} bytes", header.opcode, header.length);

        let mut working = display.clone();
        let prior_dirty = working.screen_mut().take_dirty();
        let mut outcome = DecodeOutcome::new(header);

        self.apply_opcode(&mut working, &mut outcome)?;

        let mut reader = Reader::new(&record[..header.length], header.payload_offset());
        while !reader.is_empty() {
            self.command(&mut working, &mut reader, &mut outcome)?;
        }

        let dirty = working.screen_mut().take_dirty();
        let screen = working.screen_mut();
        for region in prior_dirty.into_iter().chain(dirty) {
            screen.include_region(region);
        }
        outcome.dirty = dirty;
        outcome.oia_changed = working.oia() != display.oia();
        outcome.fields_changed = working.fields() != display.fields();
        *display = working;
        Ok(outcome)
    }

    fn apply_opcode(&self, display: &mut Display, outcome: &mut DecodeOutcome) -> ProtocolResult<()> {
        match outcome.header.opcode {
            Opcode::MessageLightOn => display.oia_mut().set_message_light(true),
            Opcode::MessageLightOff => display.oia_mut().set_message_light(false),
            Opcode::CancelInvite => {
                debug!("host cancelled invite");
                display.begin_host_wait();
                outcome.responses.push(self.encoder.cancel_invite_response()?);
            }
            _ => {}
        }
        Ok(())
    }

    fn command(&self, display: &mut Display, reader: &mut Reader<'_>, outcome: &mut DecodeOutcome) -> ProtocolResult<()> {
        let offset = reader.offset();
        let escape = reader.byte()?;
        if escape != ESC {
            return Err(ProtocolError::MissingEscape { offset, found: escape });
        }
        let code = reader.byte()?;
        let command = CommandCode::from_u8(code).ok_or(ProtocolError::UnknownCommand(code))?;
        debug!("5250 command {command:?}");
        outcome.commands.push(command);

        match command {
            CommandCode::ClearUnit => display.clear_unit(),
            CommandCode::ClearUnitAlternate => {
                let parameter = reader.byte()?;
                if parameter != CUA_WIDE && parameter != CUA_WIDE_NO_RESIZE {
                    return Err(ProtocolError::InvalidParameter {
                        command: "clear unit alternate",
                        value: parameter,
                    });
                }
                display.clear_unit_alternate();
            }
            CommandCode::ClearFormatTable => display.clear_format_table(),
            CommandCode::WriteToDisplay => self.write_to_display(display, reader, outcome)?,
            CommandCode::WriteErrorCode | CommandCode::WriteErrorCodeWindow => {
                self.write_error_code(display, reader, command)?
            }
            CommandCode::ReadInputFields | CommandCode::ReadMdtFields | CommandCode::ReadMdtFieldsAlt => {
                let cc1 = reader.byte()?;
                let _cc2 = reader.byte()?;
                display.apply_cc1(cc1);
                display.begin_read(command);
            }
            CommandCode::ReadImmediate => {
                let response = match self.encoder.read_immediate_response(display) {
                    Ok(response) => response,
                    Err(err) => {
                        warn!("read immediate: field data rejected ({err}), sending cursor only");
                        let (row, col) = display.screen().cursor_coords();
                        build_record(OPCODE_PUT_GET, 0x00, &[(row + 1) as u8, (col + 1) as u8, 0x00])?
                    }
                };
                outcome.responses.push(response);
            }
            CommandCode::ReadScreenImmediate => {
                outcome.responses.push(self.encoder.read_screen_response(display)?);
            }
            CommandCode::SaveScreen => {
                outcome.responses.push(self.encoder.save_screen_response(display)?);
            }
            CommandCode::SavePartialScreen => {
                reader.take(SAVE_PARTIAL_PARAMS)?;
                outcome.responses.push(self.encoder.save_screen_response(display)?);
            }
            // The saved image follows as ordinary commands
            CommandCode::RestoreScreen | CommandCode::RestorePartialScreen => {}
            CommandCode::Roll => self.roll(display, reader)?,
            CommandCode::WriteStructuredField => self.write_structured_field(reader, outcome)?,
        }
        Ok(())
    }

    fn write_to_display(&self, display: &mut Display, reader: &mut Reader<'_>, outcome: &mut DecodeOutcome) -> ProtocolResult<()> {
        let cc1 = reader.byte()?;
        let cc2 = reader.byte()?;
        display.begin_write(cc1, cc2);

        let mut cursor = WriteCursor::new(display);
        while let Some(byte) = reader.peek() {
            if byte == ESC {
                break;
            }
            let offset = reader.offset();
            reader.byte()?;
            match OrderCode::from_u8(byte) {
                Some(order) => {
                    self.flush_text(display, &mut cursor, outcome);
                    self.order(order, display, reader, &mut cursor, outcome)?;
                }
                None => self.text_byte(byte, offset, display, &mut cursor, outcome)?,
            }
        }
        self.flush_text(display, &mut cursor, outcome);
        display.end_write(cc2);
        Ok(())
    }

    fn order(
        &self,
        order: OrderCode,
        display: &mut Display,
        reader: &mut Reader<'_>,
        cursor: &mut WriteCursor,
        outcome: &mut DecodeOutcome,
    ) -> ProtocolResult<()> {
        trace!("order {order:?} at address {}", cursor.addr);
        let decoded = match order {
            OrderCode::StartOfHeader => {
                let length = usize::from(reader.byte()?);
                if !(1..=7).contains(&length) {
                    return Err(ProtocolError::InvalidOrderLength {
                        order: "start of header",
                        length,
                    });
                }
                let data = reader.take(length)?.to_vec();
                let error_row = data
                    .get(3)
                    .map(|&row| usize::from(row))
                    .filter(|&row| row >= 1 && row <= display.height())
                    .map(|row| row - 1);
                display.fields_mut().clear();
                display.set_error_row(error_row);
                Order::StartOfHeader(data)
            }
            OrderCode::RepeatToAddress => {
                let (row, col) = (reader.byte()?, reader.byte()?);
                let target = self.address(display, row, col)?;
                let ch = self.single_char(reader.byte()?);
                if target < cursor.addr {
                    return Err(ProtocolError::AddressBehindCursor {
                        row: usize::from(row),
                        col: usize::from(col),
                    });
                }
                for pos in cursor.addr..=target {
                    display.screen_mut().write_char(pos, ch, cursor.attribute, cursor.extended);
                }
                cursor.advance(display, target - cursor.addr + 1);
                Order::RepeatToAddress { row, col, ch }
            }
            OrderCode::EraseToAddress => {
                let (row, col) = (reader.byte()?, reader.byte()?);
                let target = self.address(display, row, col)?;
                let length = usize::from(reader.byte()?);
                if !(2..=5).contains(&length) {
                    return Err(ProtocolError::InvalidOrderLength {
                        order: "erase to address",
                        length,
                    });
                }
                let types = reader.take(length - 1)?.to_vec();
                if target < cursor.addr {
                    return Err(ProtocolError::AddressBehindCursor {
                        row: usize::from(row),
                        col: usize::from(col),
                    });
                }
                let keep_attributes = !types.contains(&EA_ERASE_ALL);
                display.screen_mut().erase(cursor.addr, target, keep_attributes);
                cursor.advance(display, target - cursor.addr + 1);
                Order::EraseToAddress { row, col, types }
            }
            OrderCode::TransparentData => {
                let length = usize::from(reader.u16()?);
                let data = reader.take(length)?.to_vec();
                for &byte in &data {
                    self.codec_byte(byte, display, cursor);
                }
                self.flush_text(display, cursor, outcome);
                Order::TransparentData(data)
            }
            OrderCode::SetBufferAddress => {
                let (row, col) = (reader.byte()?, reader.byte()?);
                let addr = self.address(display, row, col)?;
                cursor.move_to(display, addr);
                Order::SetBufferAddress { row, col }
            }
            OrderCode::WriteExtendedAttribute => {
                let (kind, value) = (reader.byte()?, reader.byte()?);
                self.extended_attribute(cursor, kind, value);
                Order::WriteExtendedAttribute { kind, value }
            }
            OrderCode::InsertCursor => {
                let (row, col) = (reader.byte()?, reader.byte()?);
                let addr = self.address(display, row, col)?;
                display.set_pending_insert(addr);
                Order::InsertCursor { row, col }
            }
            OrderCode::MoveCursor => {
                let (row, col) = (reader.byte()?, reader.byte()?);
                let addr = self.address(display, row, col)?;
                display.set_cursor(addr);
                Order::MoveCursor { row, col }
            }
            OrderCode::WriteDisplayStructuredField => {
                let length = usize::from(reader.u16()?);
                let (class, kind, data) = structured_field_body(reader, length)?;
                debug!("skipping unsupported display structured field 0x{kind:02X}");
                Order::WriteStructuredField { class, kind, data }
            }
            OrderCode::StartOfField => self.start_of_field(display, reader, cursor)?,
        };
        outcome.orders.push(decoded);
        Ok(())
    }

    fn start_of_field(&self, display: &mut Display, reader: &mut Reader<'_>, cursor: &mut WriteCursor) -> ProtocolResult<Order> {
        let first = reader.peek().ok_or(ProtocolError::UnexpectedEnd { offset: reader.offset() })?;
        let mut format = None;
        let mut controls = Vec::new();
        if FieldFormat::is_format_word(first) {
            format = Some(FieldFormat::new(reader.byte()?, reader.byte()?));
            while reader.peek().is_some_and(|b| b & 0x80 != 0) {
                controls.push(FieldControl::new(reader.byte()?, reader.byte()?));
            }
        }
        let attribute = reader.byte()?;
        if !is_attribute_byte(attribute) {
            return Err(ProtocolError::InvalidFieldAttribute(attribute));
        }
        let length = usize::from(reader.u16()?);

        let start = cursor.addr + 1;
        let field = match format {
            Some(format) => Field::input(start, length, attribute, format, controls.clone()),
            None => Field::output(start, length, attribute),
        };
        {
            let (screen, fields) = display.screen_and_fields_mut();
            fields.define(field, screen)?;
            screen.write_attribute(cursor.addr, attribute);
            for pos in start..start + length {
                if let Some(cell) = screen.cell_at(pos).copied() {
                    screen.set_cell(
                        pos,
                        Cell {
                            attribute,
                            extended: None,
                            ..cell
                        },
                    );
                }
            }
        }
        cursor.addr = start;
        cursor.attribute = attribute;
        cursor.extended = None;
        Ok(Order::StartOfField {
            format,
            controls,
            attribute,
            length,
        })
    }

    fn extended_attribute(&self, cursor: &mut WriteCursor, kind: u8, value: u8) {
        let base = cursor
            .extended
            .unwrap_or_else(|| ExtendedAttribute::from_attribute_byte(cursor.attribute));
        match kind {
            WEA_PRIMARY if is_attribute_byte(value) => {
                cursor.attribute = value;
                cursor.extended = None;
            }
            WEA_FOREGROUND_COLOR => {
                cursor.extended = Some(ExtendedAttribute {
                    color: Color::from_foreground(value).or(base.color),
                    ..base
                });
            }
            WEA_IDEOGRAPHIC => {
                cursor.extended = Some(ExtendedAttribute {
                    ideographic: value != 0,
                    ..base
                });
            }
            other => debug!("ignoring extended attribute type 0x{other:02X}"),
        }
    }

    fn text_byte(
        &self,
        byte: u8,
        offset: usize,
        display: &mut Display,
        cursor: &mut WriteCursor,
        outcome: &mut DecodeOutcome,
    ) -> ProtocolResult<()> {
        match byte {
            0x00 | DUP_CHAR | FIELD_MARK => cursor.put(display, char::from(byte)),
            SHIFT_OUT | SHIFT_IN => self.codec_byte(byte, display, cursor),
            b if is_attribute_byte(b) => {
                self.flush_text(display, cursor, outcome);
                display.screen_mut().write_attribute(cursor.addr, b);
                cursor.attribute = b;
                cursor.extended = None;
                cursor.advance(display, 1);
                outcome.orders.push(Order::Attribute(b));
            }
            b if b < 0x40 => return Err(ProtocolError::UnknownOrder { order: b, offset }),
            b => self.codec_byte(b, display, cursor),
        }
        Ok(())
    }

    fn codec_byte(&self, byte: u8, display: &mut Display, cursor: &mut WriteCursor) {
        let diagnostics = self.encoder.diagnostics();
        match self.codec().decode_byte(&mut cursor.decode, byte, diagnostics) {
            Decoded::Char(ch) => cursor.put(display, ch),
            Decoded::Wide(ch) => cursor.put_wide(display, ch),
            // Shift controls hold a cell and display blank
            Decoded::ShiftOut => cursor.put(display, char::from(SHIFT_OUT)),
            Decoded::ShiftIn => cursor.put(display, char::from(SHIFT_IN)),
            Decoded::Pending => {}
        }
    }

    /// Close the current text run
    fn flush_text(&self, display: &mut Display, cursor: &mut WriteCursor, outcome: &mut DecodeOutcome) {
        let diagnostics = self.encoder.diagnostics();
        if let Some(ch) = self.codec().finish_decode(&mut cursor.decode, diagnostics) {
            cursor.put(display, ch);
        }
        cursor.decode = DecodeState::default();
        if !cursor.text.is_empty() {
            outcome.orders.push(Order::Text(std::mem::take(&mut cursor.text)));
        }
    }

    fn single_char(&self, byte: u8) -> char {
        match byte {
            0x00 | DUP_CHAR | FIELD_MARK => char::from(byte),
            _ => {
                let mut state = DecodeState::default();
                match self.codec().decode_byte(&mut state, byte, self.encoder.diagnostics()) {
                    Decoded::Char(ch) | Decoded::Wide(ch) => ch,
                    _ => REPLACEMENT_CHAR,
                }
            }
        }
    }

    /// Validate a 1-based row/column pair
    fn address(&self, display: &Display, row: u8, col: u8) -> ProtocolResult<usize> {
        if row == 0 || col == 0 {
            return Err(ProtocolError::InvalidAddress { row, col });
        }
        display
            .screen()
            .position(usize::from(row) - 1, usize::from(col) - 1)
            .ok_or(ProtocolError::InvalidAddress { row, col })
    }

    fn write_error_code(&self, display: &mut Display, reader: &mut Reader<'_>, command: CommandCode) -> ProtocolResult<()> {
        if command == CommandCode::WriteErrorCodeWindow {
            // Window start and end columns
            reader.take(2)?;
        }
        let mut message = Vec::new();
        let mut state = DecodeState::default();
        let diagnostics = self.encoder.diagnostics();
        while let Some(byte) = reader.peek() {
            if byte == ESC {
                break;
            }
            reader.byte()?;
            if byte < 0x40 && byte != SHIFT_OUT && byte != SHIFT_IN {
                message.push(' ');
                continue;
            }
            match self.codec().decode_byte(&mut state, byte, diagnostics) {
                Decoded::Char(ch) | Decoded::Wide(ch) => message.push(ch),
                Decoded::ShiftOut | Decoded::ShiftIn => message.push(' '),
                Decoded::Pending => {}
            }
        }
        message.extend(self.codec().finish_decode(&mut state, diagnostics));
        debug!("host error message: {}", message.iter().collect::<String>().trim());
        display.show_error(&message);
        Ok(())
    }

    fn roll(&self, display: &mut Display, reader: &mut Reader<'_>) -> ProtocolResult<()> {
        let direction = reader.byte()?;
        let top = reader.byte()?;
        let bottom = reader.byte()?;
        let rows = display.height();
        if top == 0 || usize::from(top) > rows {
            return Err(ProtocolError::InvalidParameter { command: "roll", value: top });
        }
        if bottom < top || usize::from(bottom) > rows {
            return Err(ProtocolError::InvalidParameter { command: "roll", value: bottom });
        }
        let lines = isize::from(direction & 0x1F);
        let lines = if direction & 0x80 != 0 { lines } else { -lines };
        display
            .screen_mut()
            .roll(usize::from(top) - 1, usize::from(bottom) - 1, lines);
        Ok(())
    }

    fn write_structured_field(&self, reader: &mut Reader<'_>, outcome: &mut DecodeOutcome) -> ProtocolResult<()> {
        while reader.peek().is_some_and(|b| b != ESC) {
            let length = usize::from(reader.u16()?);
            let (_, kind, _) = structured_field_body(reader, length)?;
            match kind {
                SF_5250_QUERY | SF_5250_QUERY_STATION_STATE => {
                    debug!("answering 5250 query (type 0x{kind:02X})");
                    outcome.responses.push(self.encoder.query_reply(&self.device)?);
                }
                other => debug!("skipping structured field type 0x{other:02X}"),
            }
        }
        Ok(())
    }
}

/// Class, type and data of a structured field whose length word was read
fn structured_field_body(reader: &mut Reader<'_>, length: usize) -> ProtocolResult<(u8, u8, Vec<u8>)> {
    if length < 4 {
        return Err(ProtocolError::InvalidStructuredField(format!("length {length} too short")));
    }
    let body = reader.take(length - 2).map_err(|_| {
        ProtocolError::InvalidStructuredField(format!("length {length} exceeds record"))
    })?;
    let (class, kind) = (body[0], body[1]);
    if class != SF_CLASS_5250 {
        return Err(ProtocolError::InvalidStructuredField(format!("class 0x{class:02X}")));
    }
    Ok((class, kind, body[2..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::lib5250::codes::*;
    use crate::lib5250::field::{FieldShift, FFW1_ID, FFW2_MANDATORY_ENTER};
    use crate::lib5250::oia::InhibitReason;
    use crate::lib5250::screen::NULL_CHAR;

    fn decoder() -> DataStreamDecoder {
        decoder_for("37")
    }

    fn decoder_for(codepage: &str) -> DataStreamDecoder {
        let codec = CodecRegistry::builtin().get(codepage).unwrap();
        DataStreamDecoder::new(codec, Diagnostics::disabled(), DeviceIdentity::default())
    }

    fn record(payload: &[u8]) -> Vec<u8> {
        build_record(OPCODE_PUT_GET, 0x00, payload).unwrap()
    }

    fn wtd(orders: &[u8]) -> Vec<u8> {
        let mut payload = vec![ESC, CMD_CLEAR_UNIT, ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK];
        payload.extend_from_slice(orders);
        record(&payload)
    }

    #[test]
    fn test_clear_then_field_then_text() {
        let decoder = decoder();
        let mut display = Display::default();
        // SF at (1,1): FFW alpha shift, mandatory enter; attribute; length 10
        let data = wtd(&[
            SBA, 1, 1, SF, FFW1_ID, FFW2_MANDATORY_ENTER, 0x20, 0x00, 0x0A, 0xC8, 0xC5, 0xD3, 0xD3, 0xD6,
        ]);
        let outcome = decoder.decode(&mut display, &data).unwrap();
        assert_eq!(outcome.commands, vec![CommandCode::ClearUnit, CommandCode::WriteToDisplay]);
        assert!(outcome.fields_changed);

        let fields = display.fields().fields();
        assert_eq!(fields.len(), 1);
        let field = &fields[0];
        assert_eq!(field.start, 1);
        assert_eq!(field.length, 10);
        assert_eq!(field.shift(), Some(FieldShift::AlphaShift));
        assert!(field.is_mandatory_enter());

        assert!(display.screen().cell(0, 0).unwrap().is_attribute_position);
        assert_eq!(display.screen().text_range(1, 10), "HELLO\0\0\0\0\0");
        assert_eq!(display.screen().row_text(0).trim_end(), " HELLO");
        assert!(!display.oia().is_keyboard_locked());
        assert_eq!(display.cursor(), 1);
    }

    #[test]
    fn test_failed_record_leaves_display_untouched() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder.decode(&mut display, &wtd(&[SBA, 2, 1, 0xC1])).unwrap();
        let before = display.clone();

        // Valid text followed by an unknown order byte
        let bad = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SBA, 3, 1, 0xC2, 0x05]);
        let err = decoder.decode(&mut display, &bad).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOrder { order: 0x05, .. }));
        assert_eq!(display, before);
    }

    #[test]
    fn test_header_validation() {
        let decoder = decoder();
        let mut display = Display::default();
        assert!(matches!(
            decoder.decode(&mut display, &[0x00, 0x0A]),
            Err(ProtocolError::UnexpectedEnd { .. })
        ));

        let mut long = record(&[ESC, CMD_CLEAR_UNIT]);
        long[1] = 0x40;
        assert!(matches!(
            decoder.decode(&mut display, &long),
            Err(ProtocolError::LengthMismatch { declared: 0x40, .. })
        ));

        let mut wrong_type = record(&[]);
        wrong_type[2] = 0x00;
        assert!(matches!(
            decoder.decode(&mut display, &wrong_type),
            Err(ProtocolError::InvalidRecordType(_))
        ));
    }

    #[test]
    fn test_command_requires_escape() {
        let decoder = decoder();
        let mut display = Display::default();
        let err = decoder.decode(&mut display, &record(&[CMD_CLEAR_UNIT])).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingEscape {
                offset: RECORD_HEADER_LEN,
                found: CMD_CLEAR_UNIT
            }
        );
        let err = decoder.decode(&mut display, &record(&[ESC, 0x99])).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand(0x99));
    }

    #[test]
    fn test_invalid_buffer_address() {
        let decoder = decoder();
        let mut display = Display::default();
        let err = decoder.decode(&mut display, &wtd(&[SBA, 25, 1])).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAddress { row: 25, col: 1 });
        let err = decoder.decode(&mut display, &wtd(&[SBA, 1, 0])).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAddress { row: 1, col: 0 });
    }

    #[test]
    fn test_repeat_to_address() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder.decode(&mut display, &wtd(&[SBA, 2, 1, RA, 2, 5, 0x5C, 0xC1])).unwrap();
        assert_eq!(&display.screen().row_text(1)[..6], "*****A");

        let err = decoder.decode(&mut display, &wtd(&[SBA, 2, 5, RA, 2, 1, 0x5C])).unwrap_err();
        assert_eq!(err, ProtocolError::AddressBehindCursor { row: 2, col: 1 });
    }

    #[test]
    fn test_erase_to_address() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 1, 1, RA, 1, 10, 0xC1, SBA, 1, 3, EA, 1, 5, 0x02, 0xFF]))
            .unwrap();
        assert_eq!(display.screen().text_range(0, 6), "AA\0\0\0A");

        let err = decoder.decode(&mut display, &wtd(&[EA, 1, 5, 0x06, 1, 2, 3, 4, 5])).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidOrderLength { length: 6, .. }));
    }

    #[test]
    fn test_start_of_header_clears_fields_and_sets_error_row() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 5, 1, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x05]))
            .unwrap();
        assert_eq!(display.fields().len(), 1);

        let keep = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SOH, 0x04, 0x00, 0x00, 0x00, 0x16]);
        let outcome = decoder.decode(&mut display, &keep).unwrap();
        assert!(outcome.fields_changed);
        assert!(display.fields().is_empty());
        assert_eq!(display.error_row(), 21);

        let bad = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SOH, 0x08, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            decoder.decode(&mut display, &bad),
            Err(ProtocolError::InvalidOrderLength { length: 8, .. })
        ));
    }

    #[test]
    fn test_write_without_header_keeps_fields() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 5, 1, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x05]))
            .unwrap();
        let outcome = decoder
            .decode(&mut display, &record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SBA, 1, 1, 0xC1]))
            .unwrap();
        assert!(!outcome.fields_changed);
        assert_eq!(display.fields().len(), 1);
    }

    #[test]
    fn test_overlapping_field_rejected() {
        let decoder = decoder();
        let mut display = Display::default();
        let data = wtd(&[
            SBA, 1, 1, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x0A, SBA, 1, 5, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x03,
        ]);
        assert_eq!(
            decoder.decode(&mut display, &data).unwrap_err(),
            ProtocolError::FieldOverlap { row: 1, col: 5 }
        );
    }

    #[test]
    fn test_field_past_end_rejected() {
        let decoder = decoder();
        let mut display = Display::default();
        let data = wtd(&[SBA, 24, 75, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x0A]);
        assert!(matches!(
            decoder.decode(&mut display, &data),
            Err(ProtocolError::FieldOutOfBounds { length: 10, .. })
        ));
    }

    #[test]
    fn test_output_only_field_and_bad_attribute() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder.decode(&mut display, &wtd(&[SBA, 3, 1, SF, 0x22, 0x00, 0x04])).unwrap();
        let field = &display.fields().fields()[0];
        assert!(field.format.is_none());
        assert!(!field.is_input());

        let err = decoder.decode(&mut display, &wtd(&[SF, 0x41, 0x00, 0x50, 0x00, 0x04])).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidFieldAttribute(0x50));
    }

    #[test]
    fn test_insert_cursor_applied_at_end_of_write() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[IC, 5, 10, SBA, 1, 1, 0xC1]))
            .unwrap();
        assert_eq!(display.screen().cursor_coords(), (4, 9));

        // Cursor stays where Move Cursor left it when the write keeps it
        let keep = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK | CC2_IC_ULOCK, MC, 3, 3]);
        decoder.decode(&mut display, &keep).unwrap();
        assert_eq!(display.screen().cursor_coords(), (2, 2));
    }

    #[test]
    fn test_write_extended_attribute_color() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 1, 1, WEA, WEA_FOREGROUND_COLOR, 0x02, 0xC1]))
            .unwrap();
        let cell = display.screen().cell(0, 0).unwrap();
        assert_eq!(cell.extended.and_then(|ext| ext.color), Some(Color::Red));
    }

    #[test]
    fn test_transparent_data_bypasses_orders() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 1, 1, TD, 0x00, 0x02, 0x11, 0xC1]))
            .unwrap();
        assert_eq!(display.screen().cell(0, 1).unwrap().ch, 'A');
        assert!(!display.screen().cell(0, 0).unwrap().is_attribute_position);
    }

    #[test]
    fn test_double_byte_text_occupies_two_cells() {
        let decoder = decoder_for("939");
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 1, 1, SHIFT_OUT, 0x42, 0xC1, SHIFT_IN, 0xC1]))
            .unwrap();
        let screen = display.screen();
        assert_eq!(screen.cell(0, 0).unwrap().display_char(), ' ');
        assert_eq!(screen.cell(0, 1).unwrap().ch, '\u{FF21}');
        assert!(screen.cell(0, 2).unwrap().wide_tail);
        assert_eq!(screen.cell(0, 3).unwrap().display_char(), ' ');
        assert_eq!(screen.cell(0, 4).unwrap().ch, 'A');
    }

    #[test]
    fn test_read_mdt_unlocks_and_records_read() {
        let decoder = decoder();
        let mut display = Display::default();
        let outcome = decoder
            .decode(&mut display, &record(&[ESC, CMD_READ_MDT_FIELDS, 0x00, 0x00]))
            .unwrap();
        assert!(outcome.oia_changed);
        assert!(!display.oia().is_keyboard_locked());
        assert_eq!(display.read_opcode(), Some(CommandCode::ReadMdtFields));
    }

    #[test]
    fn test_write_error_code_inhibits() {
        let decoder = decoder();
        let mut display = Display::default();
        let data = record(&[ESC, CMD_WRITE_ERROR_CODE, 0x20, 0xC5, 0xD9, 0xD9]);
        decoder.decode(&mut display, &data).unwrap();
        assert_eq!(display.oia().inhibit_reason(), InhibitReason::Other);
        assert_eq!(display.oia().inhibit_message(), Some("ERR"));
        assert_eq!(display.screen().row_text(23).trim(), "ERR");
    }

    #[test]
    fn test_roll_moves_rows() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder.decode(&mut display, &wtd(&[SBA, 2, 1, 0xC1])).unwrap();
        decoder
            .decode(&mut display, &record(&[ESC, CMD_ROLL, 0x81, 2, 10]))
            .unwrap();
        assert_eq!(display.screen().cell(2, 0).unwrap().ch, 'A');
        assert_eq!(display.screen().cell(1, 0).unwrap().ch, NULL_CHAR);

        let err = decoder.decode(&mut display, &record(&[ESC, CMD_ROLL, 0x01, 5, 30])).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidParameter { command: "roll", value: 30 });
    }

    #[test]
    fn test_query_structured_field_answered() {
        let decoder = decoder();
        let mut display = Display::default();
        let data = record(&[ESC, CMD_WRITE_STRUCTURED_FIELD, 0x00, 0x05, SF_CLASS_5250, SF_5250_QUERY, 0x00]);
        let outcome = decoder.decode(&mut display, &data).unwrap();
        assert_eq!(outcome.responses.len(), 1);
        let reply = &outcome.responses[0];
        assert_eq!(reply[RECORD_HEADER_LEN + 2], AID_INBOUND_WSF);

        let bad_class = record(&[ESC, CMD_WRITE_STRUCTURED_FIELD, 0x00, 0x04, 0xD0, SF_5250_QUERY]);
        assert!(matches!(
            decoder.decode(&mut display, &bad_class),
            Err(ProtocolError::InvalidStructuredField(_))
        ));
        let too_long = record(&[ESC, CMD_WRITE_STRUCTURED_FIELD, 0x00, 0x20, SF_CLASS_5250, SF_5250_QUERY]);
        assert!(matches!(
            decoder.decode(&mut display, &too_long),
            Err(ProtocolError::InvalidStructuredField(_))
        ));
    }

    #[test]
    fn test_clear_unit_alternate_parameter() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &record(&[ESC, CMD_CLEAR_UNIT_ALTERNATE, 0x00]))
            .unwrap();
        assert_eq!((display.height(), display.width()), (27, 132));
        let err = decoder
            .decode(&mut display, &record(&[ESC, CMD_CLEAR_UNIT_ALTERNATE, 0x01]))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParameter { value: 0x01, .. }));
    }

    #[test]
    fn test_cancel_invite_and_message_light() {
        let decoder = decoder();
        let mut display = Display::default();
        let outcome = decoder
            .decode(&mut display, &build_record(OPCODE_CANCEL_INVITE, 0x00, &[]).unwrap())
            .unwrap();
        assert_eq!(outcome.responses, vec![build_record(OPCODE_CANCEL_INVITE, 0x00, &[]).unwrap()]);
        assert!(display.oia().is_keyboard_locked());

        decoder
            .decode(&mut display, &build_record(OPCODE_MESSAGE_LIGHT_ON, 0x00, &[]).unwrap())
            .unwrap();
        assert!(display.oia().is_message_light_on());
    }

    #[test]
    fn test_dirty_region_accumulates_across_records() {
        let decoder = decoder();
        let mut display = Display::default();
        display.screen_mut().clear_dirty();
        let first = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SBA, 2, 3, 0xC1]);
        let outcome = decoder.decode(&mut display, &first).unwrap();
        assert_eq!(outcome.dirty, Some(DirtyRegion::cell(1, 2)));

        let second = record(&[ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SBA, 5, 10, 0xC1]);
        let outcome = decoder.decode(&mut display, &second).unwrap();
        assert_eq!(outcome.dirty, Some(DirtyRegion::cell(4, 9)));
        assert_eq!(
            display.screen().dirty_region(),
            Some(DirtyRegion {
                top: 1,
                left: 2,
                bottom: 4,
                right: 9
            })
        );
    }

    #[test]
    fn test_save_screen_replays() {
        let decoder = decoder();
        let mut display = Display::default();
        decoder
            .decode(&mut display, &wtd(&[SBA, 1, 1, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x05, 0xC1, 0xC2]))
            .unwrap();
        let outcome = decoder
            .decode(&mut display, &record(&[ESC, CMD_SAVE_SCREEN]))
            .unwrap();
        let saved = &outcome.responses[0];

        let mut restored = Display::default();
        let mut replay = vec![ESC, CMD_RESTORE_SCREEN];
        replay.extend_from_slice(&saved[RECORD_HEADER_LEN..]);
        decoder
            .decode(&mut restored, &build_record(OPCODE_RESTORE_SCREEN, 0x00, &replay).unwrap())
            .unwrap();
        assert_eq!(restored.screen().screen_text(), display.screen().screen_text());
        assert_eq!(restored.fields().fields(), display.fields().fields());
    }
}
