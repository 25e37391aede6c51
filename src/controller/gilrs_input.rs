//! Gamepad input through gilrs
//!
//! Presents the first connected gamepad as an [`InputSource`] with the SDL
//! DualShock 4 index layout expected by the translator. gilrs already names
//! buttons and axes, so this adapter maps names back onto raw indices, folds
//! the D-pad into hat 0 and flips stick Y axes (gilrs reports up as positive,
//! the remote expects down as positive).

use crate::controller::{InputEvent, InputSource};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

// Input conditioning applied before events leave the adapter
#[derive(Clone, Debug)]
pub struct InputSettings {
    pub joystick_deadzone: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),
}

pub struct GilrsInput {
    gilrs: Gilrs,
    converter: EventConverter<GamepadId>,
}

impl GilrsInput {
    pub fn create(settings: InputSettings) -> Result<Self, InputError> {
        debug!("Creating gamepad input with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::InitializationError(e.to_string()));
            }
        };

        let mut input = Self {
            gilrs,
            converter: EventConverter::new(settings.joystick_deadzone),
        };
        input.select_gamepad();
        Ok(input)
    }

    fn select_gamepad(&mut self) {
        let mut gamepads = self.gilrs.gamepads().peekable();
        if gamepads.peek().is_none() {
            warn!("No gamepad connected, waiting for one to appear");
            return;
        }

        let mut selected = None;
        for (idx, (id, gamepad)) in gamepads.enumerate() {
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                idx,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
            selected.get_or_insert((id, gamepad.name().to_string()));
        }

        if let Some((id, name)) = selected {
            info!("Selected gamepad: {} ({})", name, id);
            self.converter.select(id);
        }
    }

    fn convert_event(&mut self, id: GamepadId, event: EventType) -> Option<InputEvent> {
        match event {
            EventType::Connected => {
                self.converter.connected(id);
                None
            }
            EventType::Disconnected => {
                let converted = self.converter.disconnected(id);
                if converted.is_some() {
                    self.select_gamepad();
                }
                converted
            }
            EventType::AxisChanged(axis, value, _) => self.converter.axis(id, axis, value),
            EventType::ButtonPressed(button, _) => self.converter.button(id, button, true),
            EventType::ButtonReleased(button, _) => self.converter.button(id, button, false),
            _ => {
                trace!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

impl InputSource for GilrsInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if let Some(input) = self.convert_event(id, event) {
                trace!("Captured event: {:?}", input);
                return Some(input);
            }
        }
        None
    }
}

/// Turns events of the active gamepad into raw [`InputEvent`]s
///
/// Generic over the gamepad id so it works without a gilrs backend.
#[derive(Debug)]
struct EventConverter<Id> {
    // Only events from this gamepad are forwarded
    active: Option<Id>,
    deadzone: f32,
    hat: HatTracker,
}

impl<Id: Copy + PartialEq + fmt::Display> EventConverter<Id> {
    fn new(deadzone: f32) -> Self {
        Self {
            active: None,
            deadzone,
            hat: HatTracker::default(),
        }
    }

    fn select(&mut self, id: Id) {
        self.active = Some(id);
    }

    fn connected(&mut self, id: Id) {
        if self.active.is_none() {
            info!("Gamepad {} connected, adopting it", id);
            self.active = Some(id);
        }
    }

    /// Emits [`InputEvent::Disconnected`] only when the active pad goes away
    fn disconnected(&mut self, id: Id) -> Option<InputEvent> {
        if self.active != Some(id) {
            return None;
        }
        warn!("Active gamepad {} disconnected", id);
        self.active = None;
        self.hat.reset();
        Some(InputEvent::Disconnected)
    }

    fn axis(&mut self, id: Id, axis: Axis, value: f32) -> Option<InputEvent> {
        if !self.is_active(id) {
            return None;
        }
        self.hat
            .axis(axis, value)
            .or_else(|| map_axis(axis, value, self.deadzone))
    }

    fn button(&mut self, id: Id, button: Button, pressed: bool) -> Option<InputEvent> {
        if !self.is_active(id) {
            return None;
        }
        if let Some(event) = self.hat.button(button, pressed) {
            return Some(event);
        }

        let Some(index) = button_index(button) else {
            debug!("Ignoring unsupported button: {:?}", button);
            return None;
        };
        Some(if pressed {
            InputEvent::ButtonDown(index)
        } else {
            InputEvent::ButtonUp(index)
        })
    }

    fn is_active(&self, id: Id) -> bool {
        if self.active == Some(id) {
            true
        } else {
            trace!("Skipping event from non-active gamepad: {}", id);
            false
        }
    }
}

/// Hat 0 position assembled from D-pad buttons or D-pad axes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HatTracker {
    x: i8,
    y: i8,
}

impl HatTracker {
    /// Returns a hat move for D-pad buttons, `None` for anything else
    fn button(&mut self, button: Button, pressed: bool) -> Option<InputEvent> {
        let (component, direction) = match button {
            Button::DPadLeft => (&mut self.x, -1),
            Button::DPadRight => (&mut self.x, 1),
            Button::DPadUp => (&mut self.y, 1),
            Button::DPadDown => (&mut self.y, -1),
            _ => return None,
        };
        if pressed {
            *component = direction;
        } else if *component == direction {
            // Releasing a direction that was already overridden keeps the newer one
            *component = 0;
        }
        Some(self.event())
    }

    fn axis(&mut self, axis: Axis, value: f32) -> Option<InputEvent> {
        match axis {
            Axis::DPadX => self.x = hat_component(value),
            Axis::DPadY => self.y = hat_component(value),
            _ => return None,
        }
        Some(self.event())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn event(&self) -> InputEvent {
        InputEvent::HatMove {
            hat: 0,
            x: self.x,
            y: self.y,
        }
    }
}

// Stick and trigger axes onto SDL indices; stick Y is flipped so down is positive
fn map_axis(axis: Axis, value: f32, deadzone: f32) -> Option<InputEvent> {
    let (axis, value) = match axis {
        Axis::LeftStickX => (0, apply_deadzone(value, deadzone)),
        Axis::LeftStickY => (1, -apply_deadzone(value, deadzone)),
        Axis::LeftZ => (2, value),
        Axis::RightStickX => (3, apply_deadzone(value, deadzone)),
        Axis::RightStickY => (4, -apply_deadzone(value, deadzone)),
        Axis::RightZ => (5, value),
        _ => {
            debug!("Ignoring unsupported axis: {:?}", axis);
            return None;
        }
    };
    Some(InputEvent::AxisMove { axis, value })
}

// gilrs button name to SDL DualShock 4 index
fn button_index(button: Button) -> Option<u8> {
    match button {
        Button::South => Some(0),
        Button::East => Some(1),
        Button::North => Some(2),
        Button::West => Some(3),
        Button::LeftTrigger => Some(4),
        Button::RightTrigger => Some(5),
        Button::LeftTrigger2 => Some(6),
        Button::RightTrigger2 => Some(7),
        Button::Select => Some(8),
        Button::Start => Some(9),
        Button::Mode => Some(10),
        Button::LeftThumb => Some(11),
        Button::RightThumb => Some(12),
        _ => None,
    }
}

fn hat_component(value: f32) -> i8 {
    if value > 0.5 {
        1
    } else if value < -0.5 {
        -1
    } else {
        0
    }
}

// Axial deadzone: each stick axis is snapped and rescaled on its own
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
