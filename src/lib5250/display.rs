//! Display state driven by the 5250 data stream
//!
//! `Display` ties the screen buffer, the format table and the OIA together
//! and carries the small amount of per-write state the protocol needs
//! (pending insert cursor, outstanding read command, error line). Local
//! editing operations triggered by keystrokes live here as well since they
//! touch all three.

use super::codes::{
    CommandCode, CC1_MASK, CC1_NULL_MDT_RESET_NON_BYPASS, CC1_NULL_NON_BYPASS_MDT,
    CC1_NULL_NON_BYPASS_RESET_ALL, CC1_RESET_MDT_ALL, CC1_RESET_MDT_NON_BYPASS,
    CC1_RESET_MDT_NULL_NON_BYPASS, CC2_ALARM, CC2_CLR_BLINK, CC2_IC_ULOCK, CC2_MESSAGE_OFF,
    CC2_MESSAGE_ON, CC2_SET_BLINK, CC2_UNLOCK, DUP_CHAR,
};
use super::field::{AdjustMode, FieldId, FieldRegistry, FieldShift};
use super::oia::{InhibitReason, Oia};
use super::screen::{ScreenBuffer, NULL_CHAR};
use crate::config::ScreenGeometry;
use crate::error::ValidationError;

/// Standard display size
pub const STANDARD_ROWS: usize = 24;
pub const STANDARD_COLS: usize = 80;
/// Size selected by Clear Unit Alternate
pub const WIDE_ROWS: usize = 27;
pub const WIDE_COLS: usize = 132;

/// What happened after a character was typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    Stored,
    /// The field filled up and is flagged auto-enter
    AutoEnter,
}

/// Screen, fields and operator information of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    screen: ScreenBuffer,
    fields: FieldRegistry,
    oia: Oia,
    pending_insert: Option<usize>,
    read_opcode: Option<CommandCode>,
    /// 0-based row set by Start Of Header
    error_row: Option<usize>,
    blinking_cursor: bool,
}

impl Display {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            screen: ScreenBuffer::new(rows, cols),
            fields: FieldRegistry::new(),
            oia: Oia::new(),
            pending_insert: None,
            read_opcode: None,
            error_row: None,
            blinking_cursor: false,
        }
    }

    pub fn with_geometry(geometry: ScreenGeometry) -> Self {
        Self::new(geometry.rows(), geometry.cols())
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.screen
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.fields
    }

    /// Screen and format table borrowed together
    pub fn screen_and_fields_mut(&mut self) -> (&mut ScreenBuffer, &mut FieldRegistry) {
        (&mut self.screen, &mut self.fields)
    }

    pub fn oia(&self) -> &Oia {
        &self.oia
    }

    pub fn oia_mut(&mut self) -> &mut Oia {
        &mut self.oia
    }

    pub fn width(&self) -> usize {
        self.screen.cols()
    }

    pub fn height(&self) -> usize {
        self.screen.rows()
    }

    pub fn read_opcode(&self) -> Option<CommandCode> {
        self.read_opcode
    }

    pub fn pending_insert(&self) -> Option<usize> {
        self.pending_insert
    }

    pub fn is_cursor_blinking(&self) -> bool {
        self.blinking_cursor
    }

    /// Row used for host error messages, 0-based
    pub fn error_row(&self) -> usize {
        self.error_row
            .filter(|&row| row < self.height())
            .unwrap_or_else(|| self.height().saturating_sub(1))
    }

    pub fn set_error_row(&mut self, row: Option<usize>) {
        self.error_row = row;
    }

    // ===== Commands =====

    /// Clear Unit: blank 24x80 display, no fields, keyboard locked
    pub fn clear_unit(&mut self) {
        self.reset_to(STANDARD_ROWS, STANDARD_COLS);
    }

    /// Clear Unit Alternate: blank 27x132 display
    pub fn clear_unit_alternate(&mut self) {
        self.reset_to(WIDE_ROWS, WIDE_COLS);
    }

    fn reset_to(&mut self, rows: usize, cols: usize) {
        if self.screen.rows() == rows && self.screen.cols() == cols {
            self.screen.clear();
        } else {
            self.screen.resize(rows, cols);
        }
        self.fields.clear();
        self.oia.lock_keyboard();
        self.oia.set_insert_mode(false);
        self.pending_insert = None;
        self.read_opcode = None;
        self.error_row = None;
    }

    /// Clear Format Table: drop every field definition
    pub fn clear_format_table(&mut self) {
        self.fields.clear();
        self.pending_insert = None;
        self.read_opcode = None;
        self.oia.lock_keyboard();
    }

    /// Start of a Write To Display
    pub fn begin_write(&mut self, cc1: u8, cc2: u8) {
        if cc2 & CC2_UNLOCK == 0 {
            self.oia.lock_keyboard();
        }
        if cc1 & CC1_MASK != 0 {
            self.read_opcode = None;
        }
        self.apply_cc1(cc1);
    }

    /// Field operations selected by the top three bits of CC1
    pub fn apply_cc1(&mut self, cc1: u8) {
        let (reset_non_bypass, reset_all, null_modified, null_all) = match cc1 & CC1_MASK {
            CC1_RESET_MDT_NON_BYPASS => (true, false, false, false),
            CC1_RESET_MDT_ALL => (false, true, false, false),
            CC1_NULL_NON_BYPASS_MDT => (false, false, true, false),
            CC1_RESET_MDT_NULL_NON_BYPASS => (true, false, false, true),
            CC1_NULL_MDT_RESET_NON_BYPASS => (true, false, true, false),
            CC1_NULL_NON_BYPASS_RESET_ALL => (false, true, false, true),
            _ => (false, false, false, false),
        };

        if null_all {
            self.fields.null_input_fields(&mut self.screen, false);
        } else if null_modified {
            self.fields.null_input_fields(&mut self.screen, true);
        }
        if reset_all {
            self.fields.reset_mdt(true);
        } else if reset_non_bypass {
            self.fields.reset_mdt(false);
        }
    }

    /// End of a Write To Display
    pub fn end_write(&mut self, cc2: u8) {
        if cc2 & CC2_MESSAGE_OFF != 0 {
            self.oia.set_message_light(false);
        }
        if cc2 & CC2_MESSAGE_ON != 0 {
            self.oia.set_message_light(true);
        }
        if cc2 & CC2_SET_BLINK != 0 && cc2 & CC2_CLR_BLINK == 0 {
            self.blinking_cursor = true;
        }
        if cc2 & CC2_CLR_BLINK != 0 {
            self.blinking_cursor = false;
        }
        if cc2 & CC2_ALARM != 0 {
            self.oia.sound_alarm();
        }
        if cc2 & CC2_UNLOCK != 0 {
            self.oia.unlock_keyboard();
        }
        if cc2 & CC2_IC_ULOCK == 0 || self.pending_insert.is_some() {
            self.set_cursor_home();
        }
        self.pending_insert = None;
    }

    /// A read command grants input until the next attention key
    pub fn begin_read(&mut self, command: CommandCode) {
        self.read_opcode = Some(command);
        self.oia.unlock_keyboard();
    }

    /// An attention key was sent; wait for the host again
    pub fn begin_host_wait(&mut self) {
        self.read_opcode = None;
        self.oia.lock_keyboard();
    }

    /// Host-signalled operator error with its message on the error line
    pub fn show_error(&mut self, message: &[char]) {
        let row = self.error_row();
        let Some(start) = self.screen.position(row, 0) else {
            return;
        };
        let end = start + self.width() - 1;
        self.screen.erase(start, end, false);
        for (offset, &ch) in message.iter().take(self.width()).enumerate() {
            self.screen.put_char(start + offset, ch);
        }
        let text: String = message.iter().collect();
        self.oia.set_inhibited(InhibitReason::Other, 0, Some(text.trim().to_string()));
    }

    // ===== Cursor =====

    pub fn cursor(&self) -> usize {
        self.screen.cursor()
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.screen.set_cursor(pos);
    }

    pub fn set_pending_insert(&mut self, pos: usize) {
        self.pending_insert = Some(pos);
    }

    /// Insert cursor if the host gave one, else the first input field
    pub fn set_cursor_home(&mut self) {
        let home = self.pending_insert.or_else(|| {
            self.fields
                .input_fields()
                .first()
                .and_then(|&id| self.fields.get(id))
                .map(|field| field.start)
        });
        self.screen.set_cursor(home.unwrap_or(0));
    }

    /// Arrow keys; the cursor wraps at the screen edges
    pub fn move_cursor(&mut self, rows: isize, cols: isize) {
        let capacity = self.screen.capacity() as isize;
        if capacity == 0 {
            return;
        }
        let delta = rows * self.width() as isize + cols;
        let pos = (self.cursor() as isize + delta).rem_euclid(capacity);
        self.screen.set_cursor(pos as usize);
    }

    pub fn tab(&mut self) {
        if let Some(start) = self
            .fields
            .next_input_field(self.cursor())
            .and_then(|id| self.fields.get(id))
            .map(|f| f.start)
        {
            self.screen.set_cursor(start);
        }
    }

    pub fn backtab(&mut self) {
        let cursor = self.cursor();
        // Inside a field past its first position, go to its start first
        if let Some(id) = self.fields.field_at(cursor) {
            if let Some(field) = self.fields.get(id) {
                if field.is_input() && cursor > field.start {
                    self.screen.set_cursor(field.start);
                    return;
                }
            }
        }
        if let Some(start) = self
            .fields
            .previous_input_field(cursor)
            .and_then(|id| self.fields.get(id))
            .map(|f| f.start)
        {
            self.screen.set_cursor(start);
        }
    }

    /// First input field starting on a later row
    pub fn newline(&mut self) {
        let cols = self.width();
        let next_row_start = (self.cursor() / cols + 1) * cols;
        let target = self
            .fields
            .input_fields()
            .into_iter()
            .filter_map(|id| self.fields.get(id))
            .map(|f| f.start)
            .find(|&start| start >= next_row_start);
        match target {
            Some(start) => self.screen.set_cursor(start),
            None => self.set_cursor_home(),
        }
    }

    // ===== Editing =====

    fn input_field_at_cursor(&self) -> Result<FieldId, ValidationError> {
        let cursor = self.cursor();
        let (row, col) = self.screen.coords(cursor);
        let id = self
            .fields
            .field_at(cursor)
            .ok_or(ValidationError::NoField { row, col })?;
        match self.fields.get(id) {
            Some(field) if field.is_input() => Ok(id),
            _ => Err(ValidationError::Protected { row, col }),
        }
    }

    /// Data positions of a logical field in order
    fn field_positions(&self, id: FieldId) -> Vec<usize> {
        self.fields
            .segments(id)
            .into_iter()
            .filter_map(|i| self.fields.get(i))
            .flat_map(|field| field.start..field.end())
            .collect()
    }

    /// Type one character at the cursor
    pub fn type_char(&mut self, ch: char) -> Result<TypeOutcome, ValidationError> {
        if self.oia.is_keyboard_locked() {
            return Err(ValidationError::KeyboardLocked);
        }
        let id = self.input_field_at_cursor()?;
        let (shift, monocase, auto_enter, exit_required) = match self.fields.get(id) {
            Some(field) => (
                field.shift().unwrap_or(FieldShift::AlphaShift),
                field.is_monocase(),
                field.is_auto_enter(),
                field.is_field_exit_required(),
            ),
            None => return Err(ValidationError::NoField { row: 0, col: 0 }),
        };
        if !shift.accepts(ch) {
            return Err(ValidationError::InvalidCharacter { ch, shift: shift.name() });
        }
        let ch = if monocase {
            ch.to_uppercase().next().unwrap_or(ch)
        } else {
            ch
        };

        let positions = self.field_positions(id);
        let cursor = self.cursor();
        let Some(index) = positions.iter().position(|&p| p == cursor) else {
            return Err(ValidationError::NoField { row: 0, col: 0 });
        };

        if self.oia.is_insert_mode() {
            let last = positions[positions.len() - 1];
            if self.screen.cell_at(last).map(|c| c.ch) != Some(NULL_CHAR) {
                return Err(ValidationError::TooLong {
                    len: positions.len() + 1,
                    max: positions.len(),
                });
            }
            for i in (index + 1..positions.len()).rev() {
                let prev = self.screen.cell_at(positions[i - 1]).map(|c| c.ch).unwrap_or(NULL_CHAR);
                self.screen.put_char(positions[i], prev);
            }
        }
        self.screen.put_char(cursor, ch);
        self.fields.set_modified(id, true);

        match positions.get(index + 1) {
            Some(&next) => self.screen.set_cursor(next),
            None if auto_enter => return Ok(TypeOutcome::AutoEnter),
            None if !exit_required => self.tab(),
            None => {}
        }
        Ok(TypeOutcome::Stored)
    }

    /// Move left within the current field
    pub fn backspace(&mut self) -> Result<(), ValidationError> {
        let id = self.input_field_at_cursor()?;
        let positions = self.field_positions(id);
        let cursor = self.cursor();
        if let Some(index) = positions.iter().position(|&p| p == cursor) {
            if index > 0 {
                self.screen.set_cursor(positions[index - 1]);
            }
        }
        Ok(())
    }

    /// Delete at the cursor, shifting the rest of the field left
    pub fn delete_char(&mut self) -> Result<(), ValidationError> {
        let id = self.input_field_at_cursor()?;
        let positions = self.field_positions(id);
        let cursor = self.cursor();
        if let Some(index) = positions.iter().position(|&p| p == cursor) {
            for i in index..positions.len() {
                let next = positions
                    .get(i + 1)
                    .and_then(|&p| self.screen.cell_at(p))
                    .map(|c| c.ch)
                    .unwrap_or(NULL_CHAR);
                self.screen.put_char(positions[i], next);
            }
            self.fields.set_modified(id, true);
        }
        Ok(())
    }

    pub fn toggle_insert(&mut self) {
        let insert = !self.oia.is_insert_mode();
        self.oia.set_insert_mode(insert);
    }

    /// Null from the cursor to the end of the field
    pub fn erase_eof(&mut self) -> Result<(), ValidationError> {
        let id = self.input_field_at_cursor()?;
        let cursor = self.cursor();
        for pos in self.field_positions(id).into_iter().filter(|&p| p >= cursor) {
            self.screen.put_char(pos, NULL_CHAR);
        }
        self.fields.set_modified(id, true);
        Ok(())
    }

    /// Fill the rest of the field with the duplicate character
    pub fn dup(&mut self) -> Result<(), ValidationError> {
        let id = self.input_field_at_cursor()?;
        let enabled = self
            .fields
            .get(id)
            .and_then(|f| f.format)
            .map(|f| f.dup_enabled())
            .unwrap_or(false);
        if !enabled {
            let (row, col) = self.screen.cursor_coords();
            return Err(ValidationError::Protected { row, col });
        }
        let cursor = self.cursor();
        for pos in self.field_positions(id).into_iter().filter(|&p| p >= cursor) {
            self.screen.put_char(pos, char::from(DUP_CHAR));
        }
        self.fields.set_modified(id, true);
        self.tab();
        Ok(())
    }

    /// Field Exit, Field+ and Field-: erase to end, adjust, move on
    ///
    /// `negative` marks a signed numeric value as negative.
    pub fn field_exit(&mut self, negative: bool) -> Result<(), ValidationError> {
        let id = self.input_field_at_cursor()?;
        let cursor = self.cursor();
        let positions = self.field_positions(id);
        for &pos in positions.iter().filter(|&&p| p >= cursor) {
            self.screen.put_char(pos, NULL_CHAR);
        }

        let Some(field) = self.fields.get(id) else {
            return Ok(());
        };
        let numeric = field.shift().map(FieldShift::is_numeric).unwrap_or(false);
        if negative && !numeric {
            return Err(ValidationError::InvalidCharacter {
                ch: '-',
                shift: field.shift().unwrap_or(FieldShift::AlphaShift).name(),
            });
        }
        let adjusting = !matches!(field.adjust(), AdjustMode::None);
        if adjusting || negative {
            let mut text = self.fields.text(&self.screen, id).trim().to_string();
            if negative {
                text.push('-');
            }
            self.fields.set_text(&mut self.screen, id, &text)?;
        }
        self.fields.set_modified(id, true);
        self.tab();
        Ok(())
    }

    /// Reset key: clears an operator error, never a host wait
    pub fn reset(&mut self) {
        self.oia.set_insert_mode(false);
        if self.oia.inhibit_reason() == InhibitReason::Other {
            self.oia.unlock_keyboard();
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(STANDARD_ROWS, STANDARD_COLS)
    }
}
