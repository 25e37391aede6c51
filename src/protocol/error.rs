//! Error definitions for the wire codec

use thiserror::Error;

/// Errors raised while building or parsing protocol frames
///
/// The control surface is closed and change sets are bounded by construction,
/// so any of these showing up at runtime points to a programming error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The control code is not part of the control surface
    #[error("Unknown control code: {0}")]
    UnknownControl(u8),

    /// More entries than the one-byte count field can describe
    #[error("Too many entries for one frame: {0} (max 255)")]
    TooManyEntries(usize),

    /// The value lies outside the domain of its control
    #[error("Value {value} out of range for control {code}")]
    ValueOutOfRange { code: u8, value: i16 },

    /// A frame is shorter than its layout requires
    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}
