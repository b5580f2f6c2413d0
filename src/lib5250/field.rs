/// Field attribute and management logic for 5250
///
/// Input fields are defined by Start Of Field orders carrying a 16-bit Field
/// Format Word (FFW) and optional Field Control Words (FCW). The registry
/// keeps the fields of the current format table ordered by position; the
/// characters themselves live in the screen buffer.

use super::screen::{ScreenBuffer, NULL_CHAR};
use crate::error::{ProtocolError, ValidationError};

/// FFW1 bits (high byte)
pub const FFW1_ID_MASK: u8 = 0xC0;
pub const FFW1_ID: u8 = 0x40;
pub const FFW1_BYPASS: u8 = 0x20;
pub const FFW1_DUP_ENABLE: u8 = 0x10;
pub const FFW1_MDT: u8 = 0x08;
pub const FFW1_SHIFT_MASK: u8 = 0x07;

/// FFW2 bits (low byte)
pub const FFW2_AUTO_ENTER: u8 = 0x80;
pub const FFW2_FER: u8 = 0x40;
pub const FFW2_MONOCASE: u8 = 0x20;
pub const FFW2_MANDATORY_ENTER: u8 = 0x08;
pub const FFW2_ADJUST_MASK: u8 = 0x07;

/// FCW1 value marking a continued-field segment
pub const FCW_CONTINUED: u8 = 0x86;

/// Keyboard shift and data type of an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldShift {
    AlphaShift,
    AlphaOnly,
    NumericShift,
    NumericOnly,
    RightToLeft,
    DigitsOnly,
    Io,
    SignedNumeric,
}

impl FieldShift {
    pub fn from_bits(bits: u8) -> Self {
        match bits & FFW1_SHIFT_MASK {
            0 => Self::AlphaShift,
            1 => Self::AlphaOnly,
            2 => Self::NumericShift,
            3 => Self::NumericOnly,
            4 => Self::RightToLeft,
            5 => Self::DigitsOnly,
            6 => Self::Io,
            _ => Self::SignedNumeric,
        }
    }

    pub fn to_bits(self) -> u8 {
        match self {
            Self::AlphaShift => 0,
            Self::AlphaOnly => 1,
            Self::NumericShift => 2,
            Self::NumericOnly => 3,
            Self::RightToLeft => 4,
            Self::DigitsOnly => 5,
            Self::Io => 6,
            Self::SignedNumeric => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AlphaShift => "alpha shift",
            Self::AlphaOnly => "alpha only",
            Self::NumericShift => "numeric shift",
            Self::NumericOnly => "numeric only",
            Self::RightToLeft => "right-to-left",
            Self::DigitsOnly => "digits only",
            Self::Io => "I/O",
            Self::SignedNumeric => "signed numeric",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::NumericOnly | Self::DigitsOnly | Self::SignedNumeric)
    }

    /// Whether `ch` may be typed into a field of this shift
    pub fn accepts(self, ch: char) -> bool {
        match self {
            Self::NumericOnly | Self::DigitsOnly => ch.is_ascii_digit(),
            Self::SignedNumeric => ch.is_ascii_digit() || ch == '+' || ch == '-',
            Self::AlphaOnly => ch.is_alphabetic() || matches!(ch, ',' | '.' | '-' | ' '),
            Self::AlphaShift | Self::NumericShift | Self::RightToLeft | Self::Io => !ch.is_control(),
        }
    }
}

/// Right-adjust and fill behavior from FFW2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustMode {
    None,
    RightZeroFill,
    RightBlankFill,
    MandatoryFill,
}

impl AdjustMode {
    /// Reserved values 1 through 4 behave as no adjustment
    pub fn from_bits(bits: u8) -> Self {
        match bits & FFW2_ADJUST_MASK {
            5 => Self::RightZeroFill,
            6 => Self::RightBlankFill,
            7 => Self::MandatoryFill,
            _ => Self::None,
        }
    }
}

/// Field Format Word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldFormat {
    ffw1: u8,
    ffw2: u8,
}

impl FieldFormat {
    pub fn new(ffw1: u8, ffw2: u8) -> Self {
        Self { ffw1, ffw2 }
    }

    pub fn from_bits(ffw: u16) -> Self {
        let [ffw1, ffw2] = ffw.to_be_bytes();
        Self { ffw1, ffw2 }
    }

    pub fn bits(&self) -> u16 {
        u16::from_be_bytes([self.ffw1, self.ffw2])
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.ffw1, self.ffw2]
    }

    /// Same format with the MDT bit forced
    pub fn with_mdt(self, mdt: bool) -> Self {
        let ffw1 = if mdt { self.ffw1 | FFW1_MDT } else { self.ffw1 & !FFW1_MDT };
        Self { ffw1, ..self }
    }

    /// True when the first byte carries the FFW identifier bits
    pub fn is_format_word(first: u8) -> bool {
        first & FFW1_ID_MASK == FFW1_ID
    }

    pub fn shift(&self) -> FieldShift {
        FieldShift::from_bits(self.ffw1)
    }

    pub fn is_bypass(&self) -> bool {
        self.ffw1 & FFW1_BYPASS != 0
    }

    pub fn dup_enabled(&self) -> bool {
        self.ffw1 & FFW1_DUP_ENABLE != 0
    }

    pub fn mdt(&self) -> bool {
        self.ffw1 & FFW1_MDT != 0
    }

    pub fn auto_enter(&self) -> bool {
        self.ffw2 & FFW2_AUTO_ENTER != 0
    }

    pub fn field_exit_required(&self) -> bool {
        self.ffw2 & FFW2_FER != 0
    }

    pub fn monocase(&self) -> bool {
        self.ffw2 & FFW2_MONOCASE != 0
    }

    pub fn mandatory_enter(&self) -> bool {
        self.ffw2 & FFW2_MANDATORY_ENTER != 0
    }

    pub fn adjust(&self) -> AdjustMode {
        AdjustMode::from_bits(self.ffw2)
    }

    /// Check `text` against this format and return what should be stored
    ///
    /// Monocase folding, sign normalization and right adjustment are applied
    /// here, so the result is exactly what goes into the field.
    pub fn normalize(&self, text: &str, length: usize) -> Result<String, ValidationError> {
        let chars: Vec<char> = if self.monocase() {
            text.chars().flat_map(char::to_uppercase).collect()
        } else {
            text.chars().collect()
        };
        let shift = self.shift();

        let mut value: Vec<char> = if shift == FieldShift::SignedNumeric {
            normalize_signed(&chars)?
        } else {
            if let Some(&ch) = chars.iter().find(|&&ch| !shift.accepts(ch)) {
                return Err(ValidationError::InvalidCharacter { ch, shift: shift.name() });
            }
            chars
        };

        if value.len() > length {
            return Err(ValidationError::TooLong {
                len: value.len(),
                max: length,
            });
        }

        if !value.is_empty() && value.len() < length {
            let fill = match self.adjust() {
                AdjustMode::RightZeroFill => Some('0'),
                AdjustMode::RightBlankFill => Some(' '),
                AdjustMode::MandatoryFill => return Err(ValidationError::MandatoryFill),
                AdjustMode::None => None,
            };
            if let Some(fill) = fill {
                let mut padded = vec![fill; length - value.len()];
                padded.append(&mut value);
                value = padded;
            }
        }

        Ok(value.into_iter().collect())
    }
}

/// Digits with an optional sign at either end, returned as digits followed
/// by '-' when negative
fn normalize_signed(chars: &[char]) -> Result<Vec<char>, ValidationError> {
    let mut negative = false;
    let mut digits = Vec::with_capacity(chars.len());
    let last = chars.len().saturating_sub(1);
    let mut seen_sign = false;
    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            '0'..='9' => digits.push(ch),
            '+' | '-' => {
                if seen_sign || (i != 0 && i != last) {
                    return Err(ValidationError::MisplacedSign);
                }
                seen_sign = true;
                negative = ch == '-';
            }
            _ => {
                return Err(ValidationError::InvalidCharacter {
                    ch,
                    shift: FieldShift::SignedNumeric.name(),
                })
            }
        }
    }
    if negative {
        if digits.is_empty() {
            return Err(ValidationError::MisplacedSign);
        }
        digits.push('-');
    }
    Ok(digits)
}

/// Position of a segment within a continued field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    First,
    Middle,
    Last,
}

/// Field Control Word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldControl {
    pub fcw1: u8,
    pub fcw2: u8,
}

impl FieldControl {
    pub fn new(fcw1: u8, fcw2: u8) -> Self {
        Self { fcw1, fcw2 }
    }

    pub fn continuation(&self) -> Option<Continuation> {
        if self.fcw1 & FCW_CONTINUED != FCW_CONTINUED {
            return None;
        }
        match self.fcw2 {
            0x01 => Some(Continuation::First),
            0x03 => Some(Continuation::Middle),
            0x02 => Some(Continuation::Last),
            _ => None,
        }
    }
}

/// One entry of the format table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Linear position of the first data cell
    pub start: usize,
    pub length: usize,
    pub attribute: u8,
    /// Absent for output-only fields
    pub format: Option<FieldFormat>,
    pub controls: Vec<FieldControl>,
    modified: bool,
}

impl Field {
    pub fn input(start: usize, length: usize, attribute: u8, format: FieldFormat, controls: Vec<FieldControl>) -> Self {
        Self {
            start,
            length,
            attribute,
            modified: format.mdt(),
            format: Some(format),
            controls,
        }
    }

    pub fn output(start: usize, length: usize, attribute: u8) -> Self {
        Self {
            start,
            length,
            attribute,
            format: None,
            controls: Vec::new(),
            modified: false,
        }
    }

    /// Position of the attribute byte preceding the data
    pub fn attribute_position(&self) -> usize {
        self.start.saturating_sub(1)
    }

    /// One past the last data cell
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn contains(&self, pos: usize) -> bool {
        (self.start..self.end()).contains(&pos)
    }

    /// Accepts operator input
    pub fn is_input(&self) -> bool {
        self.format.map(|f| !f.is_bypass()).unwrap_or(false)
    }

    pub fn is_bypass(&self) -> bool {
        !self.is_input()
    }

    pub fn shift(&self) -> Option<FieldShift> {
        self.format.map(|f| f.shift())
    }

    pub fn is_mandatory_enter(&self) -> bool {
        self.format.map(|f| f.mandatory_enter()).unwrap_or(false)
    }

    pub fn is_auto_enter(&self) -> bool {
        self.format.map(|f| f.auto_enter()).unwrap_or(false)
    }

    pub fn is_field_exit_required(&self) -> bool {
        self.format.map(|f| f.field_exit_required()).unwrap_or(false)
    }

    pub fn is_monocase(&self) -> bool {
        self.format.map(|f| f.monocase()).unwrap_or(false)
    }

    pub fn adjust(&self) -> AdjustMode {
        self.format.map(|f| f.adjust()).unwrap_or(AdjustMode::None)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn continuation(&self) -> Option<Continuation> {
        self.controls.iter().find_map(FieldControl::continuation)
    }

    pub fn is_continued(&self) -> bool {
        self.continuation().is_some()
    }

    /// Extent including the attribute byte, used for overlap checks
    fn footprint(&self) -> std::ops::Range<usize> {
        self.attribute_position()..self.end().max(self.start)
    }
}

/// Identifier of a logical field: the index of its first segment
pub type FieldId = usize;

/// Fields of the current format table, ordered by position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All segments in position order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Add a field from a Start Of Field order
    ///
    /// A field starting where an existing one starts replaces it. Any other
    /// overlap, or a field running past the end of the display, is rejected.
    pub fn define(&mut self, field: Field, screen: &ScreenBuffer) -> Result<(), ProtocolError> {
        let (row, col) = screen.coords(field.attribute_position());
        if field.start == 0 || field.end() > screen.capacity() {
            return Err(ProtocolError::FieldOutOfBounds {
                row: row + 1,
                col: col + 1,
                length: field.length,
            });
        }

        let replace = self.fields.iter().position(|f| f.start == field.start);
        let footprint = field.footprint();
        let overlaps = self.fields.iter().enumerate().any(|(i, existing)| {
            let other = existing.footprint();
            Some(i) != replace && footprint.start < other.end && other.start < footprint.end
        });
        if overlaps {
            return Err(ProtocolError::FieldOverlap {
                row: row + 1,
                col: col + 1,
            });
        }

        match replace {
            Some(i) => self.fields[i] = field,
            None => {
                let at = self.fields.partition_point(|f| f.start < field.start);
                self.fields.insert(at, field);
            }
        }
        Ok(())
    }

    /// Segments grouped into logical fields
    fn chains(&self) -> Vec<Vec<usize>> {
        let mut chains = Vec::new();
        let mut open: Option<Vec<usize>> = None;
        for (i, field) in self.fields.iter().enumerate() {
            match field.continuation() {
                Some(Continuation::First) => {
                    chains.extend(open.take());
                    open = Some(vec![i]);
                }
                Some(Continuation::Middle) => match open.as_mut() {
                    Some(chain) => chain.push(i),
                    None => chains.push(vec![i]),
                },
                Some(Continuation::Last) => match open.take() {
                    Some(mut chain) => {
                        chain.push(i);
                        chains.push(chain);
                    }
                    None => chains.push(vec![i]),
                },
                None => {
                    chains.extend(open.take());
                    chains.push(vec![i]);
                }
            }
        }
        chains.extend(open);
        chains
    }

    /// Logical field ids in position order
    pub fn logical_fields(&self) -> Vec<FieldId> {
        self.chains().into_iter().map(|chain| chain[0]).collect()
    }

    /// Segment indexes making up a logical field
    pub fn segments(&self, id: FieldId) -> Vec<usize> {
        self.chains()
            .into_iter()
            .find(|chain| chain[0] == id)
            .unwrap_or_default()
    }

    pub fn logical_length(&self, id: FieldId) -> usize {
        self.segments(id).iter().map(|&i| self.fields[i].length).sum()
    }

    /// Index of the segment whose data covers `pos`
    pub fn segment_at(&self, pos: usize) -> Option<usize> {
        self.fields.iter().position(|f| f.contains(pos))
    }

    /// Logical field whose data covers `pos`
    pub fn field_at(&self, pos: usize) -> Option<FieldId> {
        let segment = self.segment_at(pos)?;
        self.chains()
            .into_iter()
            .find(|chain| chain.contains(&segment))
            .map(|chain| chain[0])
    }

    /// Logical fields accepting input, in tab order
    pub fn input_fields(&self) -> Vec<FieldId> {
        self.logical_fields()
            .into_iter()
            .filter(|&id| self.fields[id].is_input())
            .collect()
    }

    /// First input field starting after `pos`, wrapping around
    pub fn next_input_field(&self, pos: usize) -> Option<FieldId> {
        let inputs = self.input_fields();
        let current = self.field_at(pos);
        inputs
            .iter()
            .copied()
            .find(|&id| self.fields[id].start > pos && Some(id) != current)
            .or_else(|| inputs.first().copied())
    }

    /// Last input field starting before the field at `pos`, wrapping around
    pub fn previous_input_field(&self, pos: usize) -> Option<FieldId> {
        let inputs = self.input_fields();
        let anchor = self
            .field_at(pos)
            .map(|id| self.fields[id].start)
            .unwrap_or(pos);
        inputs
            .iter()
            .rev()
            .copied()
            .find(|&id| self.fields[id].start < anchor)
            .or_else(|| inputs.last().copied())
    }

    /// Raw content of a logical field with trailing nulls removed
    pub fn text(&self, screen: &ScreenBuffer, id: FieldId) -> String {
        let raw: String = self
            .segments(id)
            .iter()
            .map(|&i| screen.text_range(self.fields[i].start, self.fields[i].length))
            .collect();
        raw.trim_end_matches(NULL_CHAR)
            .chars()
            .map(|ch| if ch == NULL_CHAR { ' ' } else { ch })
            .collect()
    }

    /// Validate and store operator text, setting the modified data tag
    pub fn set_text(&mut self, screen: &mut ScreenBuffer, id: FieldId, text: &str) -> Result<(), ValidationError> {
        let field = self.fields.get(id).ok_or_else(|| {
            let (row, col) = screen.coords(screen.cursor());
            ValidationError::NoField { row, col }
        })?;
        let Some(format) = field.format.filter(|_| field.is_input()) else {
            let (row, col) = screen.coords(field.start);
            return Err(ValidationError::Protected { row, col });
        };

        let segments = self.segments(id);
        let length = segments.iter().map(|&i| self.fields[i].length).sum();
        let value = format.normalize(text, length)?;

        let mut chars = value.chars();
        for &i in &segments {
            let field = &mut self.fields[i];
            for pos in field.start..field.end() {
                screen.put_char(pos, chars.next().unwrap_or(NULL_CHAR));
            }
            field.set_modified(true);
        }
        Ok(())
    }

    pub fn is_modified(&self, id: FieldId) -> bool {
        self.segments(id).iter().any(|&i| self.fields[i].is_modified())
    }

    pub fn set_modified(&mut self, id: FieldId, modified: bool) {
        for i in self.segments(id) {
            self.fields[i].set_modified(modified);
        }
    }

    /// Logical fields with the modified data tag set
    pub fn modified_fields(&self) -> Vec<FieldId> {
        self.logical_fields()
            .into_iter()
            .filter(|&id| self.is_modified(id))
            .collect()
    }

    /// Clear MDT on input fields, or on every field
    pub fn reset_mdt(&mut self, include_bypass: bool) {
        for field in &mut self.fields {
            if include_bypass || field.is_input() {
                field.set_modified(false);
            }
        }
    }

    /// Null the content of input fields, optionally only modified ones
    pub fn null_input_fields(&mut self, screen: &mut ScreenBuffer, only_modified: bool) {
        for field in &self.fields {
            if field.is_input() && (!only_modified || field.is_modified()) {
                for pos in field.start..field.end() {
                    screen.put_char(pos, NULL_CHAR);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(shift: FieldShift, ffw2: u8) -> FieldFormat {
        FieldFormat::new(FFW1_ID | shift.to_bits(), ffw2)
    }

    #[test]
    fn test_format_word_bits() {
        let ffw = FieldFormat::from_bits(0x4B28);
        assert_eq!(ffw.shift(), FieldShift::NumericOnly);
        assert!(ffw.mdt());
        assert!(!ffw.is_bypass());
        assert!(ffw.monocase());
        assert!(ffw.mandatory_enter());
        assert!(!ffw.auto_enter());
        assert_eq!(ffw.adjust(), AdjustMode::None);
        assert_eq!(ffw.bits(), 0x4B28);

        let ffw = FieldFormat::from_bits(0x70C7);
        assert!(ffw.is_bypass());
        assert!(ffw.dup_enabled());
        assert_eq!(ffw.shift(), FieldShift::AlphaShift);
        assert!(ffw.auto_enter());
        assert!(ffw.field_exit_required());
        assert_eq!(ffw.adjust(), AdjustMode::MandatoryFill);
    }

    #[test]
    fn test_reserved_adjust_values() {
        for bits in 1..=4 {
            assert_eq!(AdjustMode::from_bits(bits), AdjustMode::None);
        }
        assert_eq!(AdjustMode::from_bits(5), AdjustMode::RightZeroFill);
        assert_eq!(AdjustMode::from_bits(6), AdjustMode::RightBlankFill);
    }

    #[test]
    fn test_numeric_rejects_letters() {
        let ffw = format(FieldShift::NumericOnly, 0);
        assert_eq!(
            ffw.normalize("12a45", 5),
            Err(ValidationError::InvalidCharacter {
                ch: 'a',
                shift: "numeric only"
            })
        );
        assert_eq!(ffw.normalize("12345", 5).unwrap(), "12345");
    }

    #[test]
    fn test_too_long_is_rejected_not_truncated() {
        let ffw = format(FieldShift::AlphaShift, 0);
        assert_eq!(ffw.normalize("ABCDEF", 5), Err(ValidationError::TooLong { len: 6, max: 5 }));
    }

    #[test]
    fn test_signed_numeric() {
        let ffw = format(FieldShift::SignedNumeric, 0);
        assert_eq!(ffw.normalize("-42", 5).unwrap(), "42-");
        assert_eq!(ffw.normalize("42-", 5).unwrap(), "42-");
        assert_eq!(ffw.normalize("+42", 5).unwrap(), "42");
        assert_eq!(ffw.normalize("4-2", 5), Err(ValidationError::MisplacedSign));
        assert_eq!(ffw.normalize("-42-", 5), Err(ValidationError::MisplacedSign));
        assert!(ffw.normalize("4x", 5).is_err());
    }

    #[test]
    fn test_adjust_modes() {
        let zero = format(FieldShift::NumericOnly, 5);
        assert_eq!(zero.normalize("42", 5).unwrap(), "00042");
        assert_eq!(zero.normalize("", 5).unwrap(), "");

        let blank = format(FieldShift::AlphaShift, 6);
        assert_eq!(blank.normalize("AB", 4).unwrap(), "  AB");

        let fill = format(FieldShift::AlphaShift, 7);
        assert_eq!(fill.normalize("AB", 4), Err(ValidationError::MandatoryFill));
        assert_eq!(fill.normalize("ABCD", 4).unwrap(), "ABCD");
        assert_eq!(fill.normalize("", 4).unwrap(), "");
    }

    #[test]
    fn test_monocase_uppercases() {
        let ffw = format(FieldShift::AlphaShift, FFW2_MONOCASE);
        assert_eq!(ffw.normalize("wrkactjob", 10).unwrap(), "WRKACTJOB");
    }

    #[test]
    fn test_define_rejects_overlap_and_overflow() {
        let screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        let ffw = format(FieldShift::AlphaShift, 0);
        registry.define(Field::input(11, 10, 0x24, ffw, vec![]), &screen).unwrap();

        let err = registry.define(Field::input(15, 10, 0x24, ffw, vec![]), &screen).unwrap_err();
        assert!(matches!(err, ProtocolError::FieldOverlap { .. }));

        let err = registry.define(Field::output(1915, 10, 0x20), &screen).unwrap_err();
        assert!(matches!(err, ProtocolError::FieldOutOfBounds { .. }));

        // Adjacent field whose attribute sits right after the first field
        registry.define(Field::input(22, 5, 0x24, ffw, vec![]), &screen).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_define_same_start_replaces() {
        let screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        registry
            .define(Field::input(11, 10, 0x24, format(FieldShift::AlphaShift, 0), vec![]), &screen)
            .unwrap();
        registry
            .define(Field::input(11, 4, 0x24, format(FieldShift::DigitsOnly, 0), vec![]), &screen)
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().length, 4);
        assert_eq!(registry.get(0).unwrap().shift(), Some(FieldShift::DigitsOnly));
    }

    #[test]
    fn test_continued_fields_merge() {
        let mut screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        let ffw = format(FieldShift::AlphaShift, 0);
        let first = vec![FieldControl::new(FCW_CONTINUED, 0x01)];
        let middle = vec![FieldControl::new(FCW_CONTINUED, 0x03)];
        let last = vec![FieldControl::new(FCW_CONTINUED, 0x02)];
        registry.define(Field::input(76, 4, 0x24, ffw, first), &screen).unwrap();
        registry.define(Field::input(81, 3, 0x24, ffw, middle), &screen).unwrap();
        registry.define(Field::input(161, 3, 0x24, ffw, last), &screen).unwrap();

        assert_eq!(registry.logical_fields(), vec![0]);
        assert_eq!(registry.logical_length(0), 10);
        assert_eq!(registry.field_at(162), Some(0));

        registry.set_text(&mut screen, 0, "ABCDEFGHI").unwrap();
        assert_eq!(screen.text_range(76, 4), "ABCD");
        assert_eq!(screen.text_range(81, 3), "EFG");
        assert_eq!(screen.text_range(161, 3), "HI\0");
        assert_eq!(registry.text(&screen, 0), "ABCDEFGHI");
        assert!(registry.is_modified(0));
    }

    #[test]
    fn test_set_text_on_output_field_is_rejected() {
        let mut screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        registry.define(Field::output(5, 5, 0x20), &screen).unwrap();
        assert!(matches!(
            registry.set_text(&mut screen, 0, "X"),
            Err(ValidationError::Protected { .. })
        ));
    }

    #[test]
    fn test_tab_order_wraps() {
        let screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        let ffw = format(FieldShift::AlphaShift, 0);
        registry.define(Field::input(10, 5, 0x24, ffw, vec![]), &screen).unwrap();
        registry.define(Field::output(20, 5, 0x20), &screen).unwrap();
        registry.define(Field::input(30, 5, 0x24, ffw, vec![]), &screen).unwrap();

        assert_eq!(registry.next_input_field(0), Some(0));
        assert_eq!(registry.next_input_field(11), Some(2));
        assert_eq!(registry.next_input_field(31), Some(0));
        assert_eq!(registry.previous_input_field(31), Some(0));
        assert_eq!(registry.previous_input_field(11), Some(2));
    }

    #[test]
    fn test_reset_and_null() {
        let mut screen = ScreenBuffer::new(24, 80);
        let mut registry = FieldRegistry::new();
        let ffw = format(FieldShift::AlphaShift, 0);
        registry.define(Field::input(10, 5, 0x24, ffw, vec![]), &screen).unwrap();
        registry.define(Field::input(20, 5, 0x24, ffw, vec![]), &screen).unwrap();
        registry.set_text(&mut screen, 0, "ONE").unwrap();
        registry.set_text(&mut screen, 1, "TWO").unwrap();
        registry.set_modified(1, false);

        registry.null_input_fields(&mut screen, true);
        assert_eq!(registry.text(&screen, 0), "");
        assert_eq!(registry.text(&screen, 1), "TWO");

        registry.reset_mdt(false);
        assert!(registry.modified_fields().is_empty());
    }
}
