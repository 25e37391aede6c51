//! Controller side of the bridge
//!
//! Turns the physical gamepad into a [`ControllerState`] over the control
//! surface of the emulated controller:
//!
//! ```text
//! Gamepad ──► GilrsInput ──► InputEvent ──► StateTranslator ──► ControllerState
//!             (raw indices)                 (static tables)
//! ```
//!
//! Anything that can produce [`InputEvent`]s without blocking can stand in for
//! the gamepad through the [`InputSource`] trait.

pub mod gilrs_input;
pub mod state;
pub mod translator;

pub use gilrs_input::{GilrsInput, InputError, InputSettings};
pub use state::ControllerState;
pub use translator::StateTranslator;

/// Discrete event delivered by an input device
///
/// Indices follow the SDL layout of a DualShock 4: axes `0..=5`, buttons
/// `0..=12`, one hat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Axis moved to `value`, nominally in `[-1.0, 1.0]`
    AxisMove { axis: u8, value: f32 },

    ButtonDown(u8),
    ButtonUp(u8),

    /// Hat moved, `x` and `y` each in `{-1, 0, 1}`, `y == 1` is up
    HatMove { hat: u8, x: i8, y: i8 },

    /// The active device went away
    Disconnected,

    /// Device-specific event with no meaning for the bridge
    Other,
}

/// Non-blocking source of input events
pub trait InputSource {
    /// Returns the next pending event, or `None` when nothing is queued
    fn poll_event(&mut self) -> Option<InputEvent>;
}
