//! Wire protocol spoken with the remote injection service
//!
//! Contains the static control surface of the emulated PS4 controller and the
//! binary frame codec built on top of it.
//!
//! # Frames
//!
//! ```text
//! status probe   : 0x00 0x00
//! status reply   : <code> <reserved>            (code 0x00 = ok)
//! state update   : 0x01 <N> N × (<control> <value: i32 BE>)
//! ```

pub mod controls;
pub mod encoder;
pub mod error;

pub use controls::{Control, ControlKind, ControlValue};
pub use encoder::{encode, ChangeSet, MessageType, StatusReply, STATUS_REQUEST};
pub use error::ProtocolError;

/// Default address of the remote injection service
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default UDP port of the remote injection service
pub const DEFAULT_PORT: u16 = 51914;
