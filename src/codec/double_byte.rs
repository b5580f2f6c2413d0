//! Double-byte (DBCS) code pages
//!
//! Host text mixes single-byte and double-byte runs. A run of byte pairs is
//! bracketed by shift-out (0x0E) and shift-in (0x0F); outside those brackets
//! bytes go through the single-byte half of the codec.

use std::collections::HashMap;

use log::warn;
use once_cell::sync::Lazy;

use super::{
    Codec, DecodeState, Decoded, Diagnostics, EncodeState, SingleByteCodec, REPLACEMENT_CHAR,
    SHIFT_IN, SHIFT_OUT, SUBSTITUTE_BYTE,
};
use crate::error::EncodingError;

/// Double-byte blank
pub const DBCS_SPACE: u16 = 0x4040;

/// IBM CCSID 300, the Japanese double-byte set shared by 930 and 939.
/// User-defined rows (private use area) are left out.
static CCSID300: Lazy<Vec<(u16, char)>> = Lazy::new(|| parse_pairs(include_str!("tables/ccsid300.txt")));

/// Parse `code scalar` hex lines, skipping comments and malformed lines
fn parse_pairs(source: &str) -> Vec<(u16, char)> {
    let mut pairs = Vec::new();
    for line in source.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line.split_once(' ').and_then(|(code, scalar)| {
            let code = u16::from_str_radix(code, 16).ok()?;
            let ch = u32::from_str_radix(scalar.trim(), 16).ok().and_then(char::from_u32)?;
            Some((code, ch))
        });
        match parsed {
            Some(pair) => pairs.push(pair),
            None => warn!("skipping malformed double-byte table line {line:?}"),
        }
    }
    pairs
}

/// Codec combining a single-byte page with a pair table
#[derive(Debug, Clone)]
pub struct DoubleByteCodec {
    id: String,
    description: String,
    single: SingleByteCodec,
    pairs: HashMap<u16, char>,
    reverse: HashMap<char, u16>,
}

impl DoubleByteCodec {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        single: SingleByteCodec,
        pairs: impl IntoIterator<Item = (u16, char)>,
    ) -> Self {
        let pairs: HashMap<u16, char> = pairs.into_iter().collect();
        let mut reverse = HashMap::with_capacity(pairs.len());
        for (&code, &ch) in &pairs {
            // The lowest code wins when a character appears twice.
            reverse
                .entry(ch)
                .and_modify(|existing: &mut u16| *existing = (*existing).min(code))
                .or_insert(code);
        }
        Self {
            id: id.into(),
            description: description.into(),
            single,
            pairs,
            reverse,
        }
    }

    /// CCSID 930, Japanese katakana with the CCSID 300 double-byte set
    pub fn cp930() -> Self {
        Self::new("930", "Japanese katakana (DBCS)", SingleByteCodec::cp290(), CCSID300.iter().copied())
    }

    /// CCSID 939, Japanese Latin extended with the CCSID 300 double-byte set
    pub fn cp939() -> Self {
        Self::new("939", "Japanese Latin extended (DBCS)", SingleByteCodec::cp1027(), CCSID300.iter().copied())
    }

    /// Add or replace pair mappings
    pub fn with_pairs(self, extra: impl IntoIterator<Item = (u16, char)>) -> Self {
        let mut pairs = self.pairs;
        pairs.extend(extra);
        Self::new(self.id, self.description, self.single, pairs)
    }

    pub fn decode_pair(&self, code: u16) -> Option<char> {
        self.pairs.get(&code).copied()
    }

    pub fn encode_pair(&self, ch: char) -> Option<u16> {
        self.reverse.get(&ch).copied()
    }
}

impl Codec for DoubleByteCodec {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_double_byte(&self) -> bool {
        true
    }

    fn decode_byte(&self, state: &mut DecodeState, byte: u8, diagnostics: &Diagnostics) -> Decoded {
        match byte {
            SHIFT_OUT => {
                state.double_byte = true;
                state.pending = None;
                return Decoded::ShiftOut;
            }
            SHIFT_IN => {
                state.double_byte = false;
                if let Some(orphan) = state.pending.take() {
                    diagnostics.report(EncodingError::UnmappableBytes {
                        codec: self.id.clone(),
                        bytes: vec![orphan],
                    });
                }
                return Decoded::ShiftIn;
            }
            _ => {}
        }

        if !state.double_byte {
            return Decoded::Char(self.single.decode_reported(byte, diagnostics));
        }

        let Some(first) = state.pending.take() else {
            state.pending = Some(byte);
            return Decoded::Pending;
        };
        let code = u16::from_be_bytes([first, byte]);
        match self.decode_pair(code) {
            Some(ch) => Decoded::Wide(ch),
            None => {
                diagnostics.report(EncodingError::UnmappableBytes {
                    codec: self.id.clone(),
                    bytes: vec![first, byte],
                });
                Decoded::Wide(REPLACEMENT_CHAR)
            }
        }
    }

    fn encode_char(&self, state: &mut EncodeState, ch: char, out: &mut Vec<u8>, diagnostics: &Diagnostics) {
        if let Some(code) = self.encode_pair(ch) {
            if !state.double_byte {
                out.push(SHIFT_OUT);
                state.double_byte = true;
            }
            out.extend_from_slice(&code.to_be_bytes());
            return;
        }

        if state.double_byte {
            out.push(SHIFT_IN);
            state.double_byte = false;
        }
        match self.single.encode_table_char(ch) {
            Some(byte) if byte != SHIFT_OUT && byte != SHIFT_IN => out.push(byte),
            _ => {
                diagnostics.report(EncodingError::UnmappableChar {
                    codec: self.id.clone(),
                    ch,
                });
                out.push(SUBSTITUTE_BYTE);
            }
        }
    }

    fn finish_encode(&self, state: &mut EncodeState, out: &mut Vec<u8>) {
        if state.double_byte {
            out.push(SHIFT_IN);
            state.double_byte = false;
        }
    }
}
