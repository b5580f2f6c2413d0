//! Error taxonomy for the 5250 session core
//!
//! Every failure a session can produce falls into one of five families.
//! Protocol, negotiation and transport errors are fatal to the session that
//! raised them. Encoding problems are recovered locally and only reported.
//! Validation errors are returned to the caller that attempted the write and
//! never reach the wire.

use std::io;

/// Malformed or unsupported host data stream content
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected end of record at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("record length field ({declared}) exceeds available data ({available})")]
    LengthMismatch { declared: usize, available: usize },

    #[error("invalid record type 0x{0:04X}")]
    InvalidRecordType(u16),

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("expected escape before command at offset {offset}, found 0x{found:02X}")]
    MissingEscape { offset: usize, found: u8 },

    #[error("unknown command 0x{0:02X}")]
    UnknownCommand(u8),

    #[error("unknown order 0x{order:02X} at offset {offset}")]
    UnknownOrder { order: u8, offset: usize },

    #[error("invalid buffer address row={row} col={col}")]
    InvalidAddress { row: u8, col: u8 },

    #[error("address row={row} col={col} precedes current position")]
    AddressBehindCursor { row: usize, col: usize },

    #[error("invalid {order} length {length}")]
    InvalidOrderLength { order: &'static str, length: usize },

    #[error("field at row={row} col={col} with length {length} exceeds the display")]
    FieldOutOfBounds { row: usize, col: usize, length: usize },

    #[error("field at row={row} col={col} overlaps an existing field")]
    FieldOverlap { row: usize, col: usize },

    #[error("invalid field attribute 0x{0:02X}")]
    InvalidFieldAttribute(u8),

    #[error("invalid structured field: {0}")]
    InvalidStructuredField(String),

    #[error("invalid parameter 0x{value:02X} for {command}")]
    InvalidParameter { command: &'static str, value: u8 },

    #[error("record of {length} bytes exceeds the {max} byte limit")]
    RecordTooLong { length: usize, max: usize },
}

impl ProtocolError {
    /// Program check code shown in the OIA
    pub fn check_code(&self) -> u16 {
        match self {
            ProtocolError::UnexpectedEnd { .. } => 0x0001,
            ProtocolError::LengthMismatch { .. } => 0x0002,
            ProtocolError::InvalidRecordType(_) => 0x0003,
            ProtocolError::UnknownOpcode(_) => 0x0004,
            ProtocolError::MissingEscape { .. } => 0x0005,
            ProtocolError::UnknownCommand(_) => 0x0006,
            ProtocolError::UnknownOrder { .. } => 0x0007,
            ProtocolError::InvalidAddress { .. } => 0x0008,
            ProtocolError::AddressBehindCursor { .. } => 0x0009,
            ProtocolError::InvalidOrderLength { .. } => 0x000A,
            ProtocolError::FieldOutOfBounds { .. } => 0x000B,
            ProtocolError::FieldOverlap { .. } => 0x000C,
            ProtocolError::InvalidFieldAttribute(_) => 0x000D,
            ProtocolError::InvalidStructuredField(_) => 0x000E,
            ProtocolError::InvalidParameter { .. } => 0x000F,
            ProtocolError::RecordTooLong { .. } => 0x0010,
        }
    }
}

/// Telnet option negotiation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("binary transmission required")]
    BinaryRequired,

    #[error("end-of-record required")]
    EndOfRecordRequired,

    #[error("malformed subnegotiation for option {option}")]
    MalformedSubnegotiation { option: u8 },

    #[error("device name too long ({0} bytes)")]
    DeviceNameTooLong(usize),

    #[error("negotiation is not complete")]
    Incomplete,
}

impl NegotiationError {
    /// Communication check code shown in the OIA
    pub fn check_code(&self) -> u16 {
        match self {
            NegotiationError::BinaryRequired => 0x0101,
            NegotiationError::EndOfRecordRequired => 0x0102,
            NegotiationError::MalformedSubnegotiation { .. } => 0x0103,
            NegotiationError::DeviceNameTooLong(_) => 0x0104,
            NegotiationError::Incomplete => 0x0105,
        }
    }
}

/// Failures while reading the telnet byte stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelnetError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// A record broke the framing limits
    #[error(transparent)]
    Framing(#[from] ProtocolError),
}

/// Byte stream failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed by peer")]
    ConnectionReset,

    #[error("keepalive timing mark unanswered after {0:?}")]
    KeepaliveTimeout(std::time::Duration),

    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Communication check code shown in the OIA
    pub fn check_code(&self) -> u16 {
        match self {
            TransportError::Io(_) => 0x0001,
            TransportError::ConnectionReset => 0x0002,
            TransportError::KeepaliveTimeout(_) => 0x0003,
            TransportError::Connect { .. } => 0x0004,
        }
    }
}

/// Character translation failures
///
/// These are substituted in place and reported through the codec
/// diagnostics sink rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("unknown codepage {0}")]
    UnknownCodepage(String),

    #[error("codec {codec}: unmappable byte sequence {bytes:02X?}")]
    UnmappableBytes { codec: String, bytes: Vec<u8> },

    #[error("codec {codec}: unmappable character {ch:?}")]
    UnmappableChar { codec: String, ch: char },
}

/// Field content rejected before encoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no input field at row={row} col={col}")]
    NoField { row: usize, col: usize },

    #[error("field at row={row} col={col} is protected")]
    Protected { row: usize, col: usize },

    #[error("text of {len} characters exceeds field length {max}")]
    TooLong { len: usize, max: usize },

    #[error("character {ch:?} not allowed in a {shift} field")]
    InvalidCharacter { ch: char, shift: &'static str },

    #[error("misplaced sign in signed numeric field")]
    MisplacedSign,

    #[error("mandatory fill field must be completely filled or left empty")]
    MandatoryFill,

    #[error("mandatory enter field at row={row} col={col} is empty")]
    MandatoryEnter { row: usize, col: usize },

    #[error("keyboard is locked")]
    KeyboardLocked,

    #[error("record of {len} bytes exceeds the {max} byte limit")]
    RecordTooLong { len: usize, max: usize },

    #[error("unknown key mnemonic {0:?}")]
    UnknownKey(String),
}

/// Rejected session configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to hand out a pooled session
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("pool exhausted ({active} of {max} sessions in use)")]
    Exhausted { active: usize, max: usize },

    #[error("no pooled session became free within {0:?}")]
    Timeout(std::time::Duration),

    #[error("no valid session available after validation failure")]
    NoValidSession,

    #[error("pool has been shut down")]
    Shutdown,

    /// The factory could not open a session
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Broad classification attached to session termination events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Protocol,
    Negotiation,
    Transport,
    Encoding,
    Validation,
    Closed,
}

/// Top-level error returned by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session is closed")]
    Closed,

    #[error("session is not ready")]
    NotReady,

    #[error("timed out waiting for keyboard unlock")]
    UnlockTimeout,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Protocol(_) => ErrorKind::Protocol,
            SessionError::Negotiation(_) => ErrorKind::Negotiation,
            SessionError::Transport(_) => ErrorKind::Transport,
            SessionError::Encoding(_) => ErrorKind::Encoding,
            SessionError::Validation(_) | SessionError::Config(_) => ErrorKind::Validation,
            SessionError::Closed | SessionError::NotReady | SessionError::UnlockTimeout => {
                ErrorKind::Closed
            }
        }
    }

    /// Whether the session must stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Protocol | ErrorKind::Negotiation | ErrorKind::Transport
        )
    }
}

impl From<TelnetError> for SessionError {
    fn from(err: TelnetError) -> Self {
        match err {
            TelnetError::Negotiation(err) => SessionError::Negotiation(err),
            TelnetError::Framing(err) => SessionError::Protocol(err),
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError::Transport(TransportError::Io(err))
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type PoolResult<T> = Result<T, PoolError>;
