//! IBM 5250 display station emulation
//!
//! Telnet negotiation (RFC 2877/4777), the 5250 data stream in both
//! directions, and the screen, field and OIA model the stream drives.

pub mod codes;
pub mod display;
pub mod encoder;
pub mod field;
pub mod keys;
pub mod oia;
pub mod pool;
pub mod protocol;
pub mod screen;
pub mod session;
pub mod telnet;

// Re-exports for easy access
pub use display::Display;
pub use encoder::{AidKey, DataStreamEncoder, DeviceIdentity};
pub use field::{Field, FieldFormat, FieldId, FieldRegistry, FieldShift};
pub use keys::{parse_keys, Key, KeyEffect, Modifiers};
pub use oia::{InhibitReason, Oia};
pub use pool::{PoolStats, PooledSession, SessionPool};
pub use protocol::{DataStreamDecoder, DecodeOutcome, Order, RecordHeader};
pub use screen::{Cell, DirtyRegion, ScreenBuffer};
pub use session::{ChannelListener, Session, SessionEvent, SessionListener, SessionState, SessionStatus};
pub use telnet::{frame_record, DeviceSettings, Negotiator, NegotiatorState, Received, TelnetOption};
