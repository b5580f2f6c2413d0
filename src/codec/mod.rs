//! Host character encodings
//!
//! A [`Codec`] translates between host EBCDIC bytes and Unicode. Codecs are
//! stateless and shared between sessions; double-byte shift state lives in
//! the [`DecodeState`] and [`EncodeState`] values owned by whoever is walking
//! a byte run.
//!
//! Unmappable input never fails an operation. It is replaced with
//! [`REPLACEMENT_CHAR`] or [`SUBSTITUTE_BYTE`] and reported through
//! [`Diagnostics`].

pub mod double_byte;
mod pages;
pub mod single_byte;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;
use tokio::sync::mpsc;

use crate::error::EncodingError;

pub use double_byte::DoubleByteCodec;
pub use single_byte::SingleByteCodec;

/// Shift out: start of a double-byte run
pub const SHIFT_OUT: u8 = 0x0E;
/// Shift in: end of a double-byte run
pub const SHIFT_IN: u8 = 0x0F;
/// EBCDIC SUB, emitted for characters the codec cannot encode
pub const SUBSTITUTE_BYTE: u8 = 0x3F;
/// Emitted for byte sequences the codec cannot decode
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Result of feeding one byte to a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A character occupying one display cell
    Char(char),
    /// A double-byte character occupying two display cells
    Wide(char),
    /// Shift-out control; occupies a cell and displays as blank
    ShiftOut,
    /// Shift-in control; occupies a cell and displays as blank
    ShiftIn,
    /// First byte of a double-byte pair, nothing to display yet
    Pending,
}

/// Shift state while decoding a byte run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeState {
    pub double_byte: bool,
    pub pending: Option<u8>,
}

/// Shift state while encoding a character run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeState {
    pub double_byte: bool,
}

/// Destination for encoding problems
///
/// Cloneable and cheap; a disabled sink only logs.
#[derive(Clone, Default)]
pub struct Diagnostics {
    tx: Option<mpsc::UnboundedSender<EncodingError>>,
}

impl Diagnostics {
    /// Sink that only logs
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Sink that forwards every report to the returned receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EncodingError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn report(&self, error: EncodingError) {
        warn!("{error}");
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is listening any more.
            let _ = tx.send(error);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("forwarding", &self.tx.is_some())
            .finish()
    }
}

/// Translation between host bytes and Unicode for one CCSID
pub trait Codec: Send + Sync + fmt::Debug {
    /// Registry key, the CCSID number as a string
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn is_double_byte(&self) -> bool {
        false
    }

    /// Feed one host byte
    fn decode_byte(&self, state: &mut DecodeState, byte: u8, diagnostics: &Diagnostics) -> Decoded;

    /// Append the host bytes for one character
    fn encode_char(&self, state: &mut EncodeState, ch: char, out: &mut Vec<u8>, diagnostics: &Diagnostics);

    /// Close any open shift state at the end of a run
    fn finish_encode(&self, state: &mut EncodeState, out: &mut Vec<u8>) {
        let _ = (state, out);
    }

    /// Close any open shift state at the end of a decoded run
    fn finish_decode(&self, state: &mut DecodeState, diagnostics: &Diagnostics) -> Option<char> {
        let pending = state.pending.take()?;
        diagnostics.report(EncodingError::UnmappableBytes {
            codec: self.id().to_string(),
            bytes: vec![pending],
        });
        Some(REPLACEMENT_CHAR)
    }

    /// Decode a complete byte run into text
    fn decode(&self, bytes: &[u8], diagnostics: &Diagnostics) -> String {
        let mut state = DecodeState::default();
        let mut text = String::with_capacity(bytes.len());
        for &byte in bytes {
            match self.decode_byte(&mut state, byte, diagnostics) {
                Decoded::Char(ch) | Decoded::Wide(ch) => text.push(ch),
                Decoded::ShiftOut | Decoded::ShiftIn | Decoded::Pending => {}
            }
        }
        if let Some(ch) = self.finish_decode(&mut state, diagnostics) {
            text.push(ch);
        }
        text
    }

    /// Encode text into a complete byte run
    fn encode(&self, text: &str, diagnostics: &Diagnostics) -> Vec<u8> {
        let mut state = EncodeState::default();
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            self.encode_char(&mut state, ch, &mut out, diagnostics);
        }
        self.finish_encode(&mut state, &mut out);
        out
    }
}

/// Immutable set of codecs keyed by CCSID
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Registry holding the built-in codecs: CP037 and its national variants,
    /// the euro pages and the Japanese mixed pages 930 and 939
    pub fn builtin() -> Self {
        CodecRegistryBuilder::new().with_builtins().build()
    }

    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::new()
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Codec>, EncodingError> {
        self.codecs
            .get(&normalize_id(id))
            .cloned()
            .ok_or_else(|| EncodingError::UnknownCodepage(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.codecs.contains_key(&normalize_id(id))
    }

    /// Registered ids in ascending numeric order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        ids.sort_by_key(|id| id.parse::<u32>().unwrap_or(u32::MAX));
        ids
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Collects codecs before the registry is frozen
#[derive(Debug, Default)]
pub struct CodecRegistryBuilder {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins(self) -> Self {
        let builder = self
            .register(SingleByteCodec::cp037())
            .register(SingleByteCodec::cp500())
            .register(SingleByteCodec::cp1140())
            .register(SingleByteCodec::cp1148())
            .register(DoubleByteCodec::cp930())
            .register(DoubleByteCodec::cp939());
        SingleByteCodec::national_pages().fold(builder, |builder, codec| builder.register(codec))
    }

    /// Add a codec, replacing any earlier one with the same id
    pub fn register<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.codecs.insert(normalize_id(codec.id()), Arc::new(codec));
        self
    }

    pub fn build(self) -> CodecRegistry {
        CodecRegistry { codecs: self.codecs }
    }
}

/// Accepts "37", "037", "cp037", "CCSID 37" and "IBM-037" as the same id
fn normalize_id(id: &str) -> String {
    let lower = id.trim().to_ascii_lowercase();
    let stripped = ["ccsid", "ibm-", "ibm", "cp"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower)
        .trim();
    let digits = stripped.trim_start_matches('0');
    if digits.is_empty() {
        stripped.to_string()
    } else {
        digits.to_string()
    }
}
