//! Protocol core for IBM 5250/5250E terminal emulation
//!
//! Everything a TN5250 client needs below the user interface: telnet
//! negotiation, the 5250 data stream codec, the screen/field/OIA model
//! one async session per host connection, and a pool of reusable sessions.

/// Host character encodings (EBCDIC code pages, DBCS)
pub mod codec;

/// Session and pool configuration
pub mod config;

/// Error types shared across the crate
pub mod error;

/// LIB5250: IBM 5250 protocol implementation
/// Complete TN5250 protocol support for AS/400 systems
pub mod lib5250;

pub use codec::{Codec, CodecRegistry, Diagnostics};
pub use config::{ScreenGeometry, SessionConfig, SessionPoolConfig};
pub use error::{ErrorKind, PoolError, SessionError, SessionResult};
pub use lib5250::{Key, Modifiers, PooledSession, Session, SessionEvent, SessionListener, SessionPool, SessionState};
