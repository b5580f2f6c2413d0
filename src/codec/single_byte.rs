//! Single-byte EBCDIC code pages
//!
//! Each codec is a 256-entry decode table plus the reverse map built from
//! it. The built-in pages share the CP037 layout and differ only in a handful
//! of positions, so they are expressed as overrides of that table.

use std::collections::HashMap;

use super::pages::*;
use super::{Codec, DecodeState, Decoded, Diagnostics, EncodeState, REPLACEMENT_CHAR, SUBSTITUTE_BYTE};
use crate::error::EncodingError;

/// CCSID 37, EBCDIC US/Canada
pub(crate) const CP037: [char; 256] = [
    // 0x00-0x0F: Control characters
    '\x00', '\x01', '\x02', '\x03', '\u{009C}', '\t', '\u{0086}', '\x7F',
    '\u{0097}', '\u{008D}', '\u{008E}', '\x0B', '\x0C', '\r', '\x0E', '\x0F',
    // 0x10-0x1F: Control characters
    '\x10', '\x11', '\x12', '\x13', '\u{009D}', '\u{0085}', '\x08', '\u{0087}',
    '\x18', '\x19', '\u{0092}', '\u{008F}', '\x1C', '\x1D', '\x1E', '\x1F',
    // 0x20-0x2F: Control characters and special
    '\u{0080}', '\u{0081}', '\u{0082}', '\u{0083}', '\u{0084}', '\n', '\x17', '\x1B',
    '\u{0088}', '\u{0089}', '\u{008A}', '\u{008B}', '\u{008C}', '\x05', '\x06', '\x07',
    // 0x30-0x3F: Control characters
    '\u{0090}', '\u{0091}', '\x16', '\u{0093}', '\u{0094}', '\u{0095}', '\u{0096}', '\x04',
    '\u{0098}', '\u{0099}', '\u{009A}', '\u{009B}', '\x14', '\x15', '\u{009E}', '\x1A',
    // 0x40-0x4F: Space and special characters
    ' ', '\u{00A0}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E1}', '\u{00E3}', '\u{00E5}',
    '\u{00E7}', '\u{00F1}', '\u{00A2}', '.', '<', '(', '+', '|',
    // 0x50-0x5F: Ampersand and special characters
    '&', '\u{00E9}', '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00ED}', '\u{00EE}', '\u{00EF}',
    '\u{00EC}', '\u{00DF}', '!', '$', '*', ')', ';', '\u{00AC}',
    // 0x60-0x6F: Dash and special characters
    '-', '/', '\u{00C2}', '\u{00C4}', '\u{00C0}', '\u{00C1}', '\u{00C3}', '\u{00C5}',
    '\u{00C7}', '\u{00D1}', '\u{00A6}', ',', '%', '_', '>', '?',
    // 0x70-0x7F: Special characters and quotes
    '\u{00F8}', '\u{00C9}', '\u{00CA}', '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}',
    '\u{00CC}', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80-0x8F: Special character and lowercase a-i
    '\u{00D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{00AB}', '\u{00BB}', '\u{00F0}', '\u{00FD}', '\u{00FE}', '\u{00B1}',
    // 0x90-0x9F: Degree symbol and lowercase j-r
    '\u{00B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{00AA}', '\u{00BA}', '\u{00E6}', '\u{00B8}', '\u{00C6}', '\u{00A4}',
    // 0xA0-0xAF: Micro sign and lowercase s-z
    '\u{00B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{00A1}', '\u{00BF}', '\u{00D0}', '\u{00DD}', '\u{00DE}', '\u{00AE}',
    // 0xB0-0xBF: Caret and special characters
    '^', '\u{00A3}', '\u{00A5}', '\u{00B7}', '\u{00A9}', '\u{00A7}', '\u{00B6}', '\u{00BC}',
    '\u{00BD}', '\u{00BE}', '[', ']', '\u{00AF}', '\u{00A8}', '\u{00B4}', '\u{00D7}',
    // 0xC0-0xCF: Left brace and uppercase A-I
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{00AD}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00F3}', '\u{00F5}',
    // 0xD0-0xDF: Right brace and uppercase J-R
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{00B9}', '\u{00FB}', '\u{00FC}', '\u{00F9}', '\u{00FA}', '\u{00FF}',
    // 0xE0-0xEF: Backslash and uppercase S-Z
    '\\', '\u{00F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{00B2}', '\u{00D4}', '\u{00D6}', '\u{00D2}', '\u{00D3}', '\u{00D5}',
    // 0xF0-0xFF: Digits 0-9 and special characters
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{00B3}', '\u{00DB}', '\u{00DC}', '\u{00D9}', '\u{00DA}', '\u{009F}',
];

/// Positions where CCSID 500 (International) differs from CCSID 37
const CP500_OVERRIDES: [(u8, char); 7] = [
    (0x4A, '['),
    (0x4F, '!'),
    (0x5A, ']'),
    (0x5F, '^'),
    (0xB0, '\u{00A2}'),
    (0xBA, '\u{00AC}'),
    (0xBB, '|'),
];

/// The euro variants replace the currency sign at 0x9F
const EURO_OVERRIDE: [(u8, char); 1] = [(0x9F, '\u{20AC}')];

/// National pages built directly on CP037: id, description, overrides
const NATIONAL_PAGES: [(&str, &str, &[(u8, char)]); 17] = [
    ("273", "EBCDIC Germany/Austria", &CP273_OVERRIDES),
    ("277", "EBCDIC Denmark/Norway", &CP277_OVERRIDES),
    ("278", "EBCDIC Finland/Sweden", &CP278_OVERRIDES),
    ("280", "EBCDIC Italy", &CP280_OVERRIDES),
    ("284", "EBCDIC Spain/Latin America", &CP284_OVERRIDES),
    ("285", "EBCDIC United Kingdom", &CP285_OVERRIDES),
    ("297", "EBCDIC France", &CP297_OVERRIDES),
    ("424", "EBCDIC Hebrew", &CP424_OVERRIDES),
    ("870", "EBCDIC Latin-2 multilingual", &CP870_OVERRIDES),
    ("871", "EBCDIC Iceland", &CP871_OVERRIDES),
    ("875", "EBCDIC Greek", &CP875_OVERRIDES),
    ("1025", "EBCDIC Cyrillic multilingual", &CP1025_OVERRIDES),
    ("1026", "EBCDIC Turkish", &CP1026_OVERRIDES),
    ("1112", "EBCDIC Baltic", &CP1112_OVERRIDES),
    ("1122", "EBCDIC Estonian", &CP1122_OVERRIDES),
    ("1141", "EBCDIC Germany/Austria with euro", &CP1141_OVERRIDES),
    ("1147", "EBCDIC France with euro", &CP1147_OVERRIDES),
];

/// Table-driven single-byte codec
#[derive(Debug, Clone)]
pub struct SingleByteCodec {
    id: String,
    description: String,
    table: [char; 256],
    reverse: HashMap<char, u8>,
}

impl SingleByteCodec {
    pub fn new(id: impl Into<String>, description: impl Into<String>, table: [char; 256]) -> Self {
        let mut reverse = HashMap::with_capacity(256);
        for (byte, &ch) in table.iter().enumerate() {
            if ch == REPLACEMENT_CHAR {
                continue;
            }
            // The lowest byte wins when a character appears twice.
            reverse.entry(ch).or_insert(byte as u8);
        }
        Self {
            id: id.into(),
            description: description.into(),
            table,
            reverse,
        }
    }

    pub fn cp037() -> Self {
        Self::new("37", "EBCDIC US/Canada", CP037)
    }

    pub fn cp500() -> Self {
        Self::cp037()
            .with_id("500", "EBCDIC International")
            .with_overrides(&CP500_OVERRIDES)
    }

    pub fn cp1140() -> Self {
        Self::cp037()
            .with_id("1140", "EBCDIC US/Canada with euro")
            .with_overrides(&EURO_OVERRIDE)
    }

    pub fn cp1148() -> Self {
        Self::cp500()
            .with_id("1148", "EBCDIC International with euro")
            .with_overrides(&EURO_OVERRIDE)
    }

    /// Every page expressed as CP037 plus overrides, other than 37 itself
    pub fn national_pages() -> impl Iterator<Item = Self> {
        NATIONAL_PAGES.iter().map(|(id, description, overrides)| {
            Self::cp037().with_id(*id, *description).with_overrides(overrides)
        })
    }

    /// Katakana page, the single-byte half of CCSID 930
    pub fn cp290() -> Self {
        Self::cp037()
            .with_id("290", "EBCDIC Japanese katakana")
            .with_overrides(&CP290_OVERRIDES)
    }

    /// Latin extended page, the single-byte half of CCSID 939
    pub fn cp1027() -> Self {
        Self::cp037()
            .with_id("1027", "EBCDIC Japanese Latin extended")
            .with_overrides(&CP1027_OVERRIDES)
    }

    /// Same table under another id
    pub fn with_id(mut self, id: impl Into<String>, description: impl Into<String>) -> Self {
        self.id = id.into();
        self.description = description.into();
        self
    }

    /// Replace individual table positions and rebuild the reverse map
    pub fn with_overrides(self, overrides: &[(u8, char)]) -> Self {
        let mut table = self.table;
        for &(byte, ch) in overrides {
            table[byte as usize] = ch;
        }
        Self::new(self.id, self.description, table)
    }

    pub fn decode_table_byte(&self, byte: u8) -> char {
        self.table[byte as usize]
    }

    pub fn encode_table_char(&self, ch: char) -> Option<u8> {
        self.reverse.get(&ch).copied()
    }

    /// Table lookup that reports positions the page leaves undefined
    pub(crate) fn decode_reported(&self, byte: u8, diagnostics: &Diagnostics) -> char {
        let ch = self.decode_table_byte(byte);
        if ch == REPLACEMENT_CHAR {
            diagnostics.report(EncodingError::UnmappableBytes {
                codec: self.id.clone(),
                bytes: vec![byte],
            });
        }
        ch
    }
}

impl Codec for SingleByteCodec {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn decode_byte(&self, _state: &mut DecodeState, byte: u8, diagnostics: &Diagnostics) -> Decoded {
        Decoded::Char(self.decode_reported(byte, diagnostics))
    }

    fn encode_char(&self, _state: &mut EncodeState, ch: char, out: &mut Vec<u8>, diagnostics: &Diagnostics) {
        match self.encode_table_char(ch) {
            Some(byte) => out.push(byte),
            None => {
                diagnostics.report(EncodingError::UnmappableChar {
                    codec: self.id.clone(),
                    ch,
                });
                out.push(SUBSTITUTE_BYTE);
            }
        }
    }
}
