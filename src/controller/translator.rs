//! Translation of raw input events into control surface values

use crate::controller::{ControllerState, InputEvent};
use crate::protocol::{Control, ControlValue};
use tracing::{debug, trace};

/// Raw axis index to control; axes 2 and 5 are the analog triggers, which the
/// remote only knows as digital L2/R2.
const AXIS_TABLE: [Option<Control>; 6] = [
    Some(Control::LeftStickX),
    Some(Control::LeftStickY),
    None,
    Some(Control::RightStickX),
    Some(Control::RightStickY),
    None,
];

/// Raw button index to control
const BUTTON_TABLE: [Control; 13] = [
    Control::Cross,
    Control::Circle,
    Control::Triangle,
    Control::Square,
    Control::L1,
    Control::R1,
    Control::L2,
    Control::R2,
    Control::Share,
    Control::Options,
    Control::Ps,
    Control::L3,
    Control::R3,
];

/// The directional pad is the first hat
const DPAD_HAT: u8 = 0;

/// Scales a raw axis reading to a signed control value
///
/// Out-of-range readings are clamped to `[-1.0, 1.0]` first, so the result
/// always lies in `[-127, 127]`.
pub fn translate_axis(raw: f32) -> ControlValue {
    let limit = f32::from(ControlValue::AXIS_LIMIT);
    let scaled = (raw.clamp(-1.0, 1.0) * limit).round();
    // NaN casts to 0, which is center.
    ControlValue::new(scaled as i16)
}

/// Owner of the [`ControllerState`] for one session
#[derive(Debug, Default)]
pub struct StateTranslator {
    state: ControllerState,
}

impl StateTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event; returns whether it touched modeled state
    ///
    /// Unknown axes, buttons, hats and event kinds are ignored.
    pub fn apply_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::AxisMove { axis, value } => {
                match AXIS_TABLE.get(axis as usize).copied().flatten() {
                    Some(control) => {
                        self.state.set(control, translate_axis(value));
                        true
                    }
                    None => {
                        trace!("Ignoring unmapped axis {}", axis);
                        false
                    }
                }
            }
            InputEvent::ButtonDown(button) => self.set_button(button, true),
            InputEvent::ButtonUp(button) => self.set_button(button, false),
            InputEvent::HatMove { hat, x, y } => {
                if hat != DPAD_HAT {
                    trace!("Ignoring hat {}", hat);
                    return false;
                }
                self.state.set(Control::Left, ControlValue::from_pressed(x == -1));
                self.state.set(Control::Right, ControlValue::from_pressed(x == 1));
                self.state.set(Control::Up, ControlValue::from_pressed(y == 1));
                self.state.set(Control::Down, ControlValue::from_pressed(y == -1));
                true
            }
            InputEvent::Disconnected => {
                debug!("Input device gone, returning controls to neutral");
                self.reset();
                true
            }
            InputEvent::Other => false,
        }
    }

    fn set_button(&mut self, button: u8, pressed: bool) -> bool {
        match BUTTON_TABLE.get(button as usize) {
            Some(&control) => {
                self.state.set(control, ControlValue::from_pressed(pressed));
                true
            }
            None => {
                trace!("Ignoring unmapped button {}", button);
                false
            }
        }
    }

    /// Copy of the full state at call time
    pub fn snapshot(&self) -> ControllerState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dpad(translator: &StateTranslator) -> [i16; 4] {
        let state = translator.snapshot();
        [Control::Left, Control::Right, Control::Up, Control::Down].map(|c| state.get(c).get())
    }

    #[test]
    fn axis_scaling_endpoints() {
        assert_eq!(translate_axis(1.0).get(), 127);
        assert_eq!(translate_axis(-1.0).get(), -127);
        assert_eq!(translate_axis(0.0).get(), 0);
    }

    #[test]
    fn axis_scaling_rounds() {
        assert_eq!(translate_axis(0.5).get(), 64);
        assert_eq!(translate_axis(-0.25).get(), -32);
        assert_eq!(translate_axis(0.1).get(), 13);
    }

    #[test]
    fn axis_scaling_matches_formula_across_range() {
        for step in -100..=100 {
            let raw = step as f32 / 100.0;
            let expected = (raw * 127.0).round().clamp(-127.0, 127.0) as i16;
            assert_eq!(translate_axis(raw).get(), expected, "raw {raw}");
        }
    }

    #[test]
    fn axis_out_of_range_is_clamped() {
        assert_eq!(translate_axis(1.7).get(), 127);
        assert_eq!(translate_axis(-3.0).get(), -127);
        assert_eq!(translate_axis(f32::NAN).get(), 0);
    }

    #[test]
    fn axis_events_follow_the_table() {
        let mut translator = StateTranslator::new();
        assert!(translator.apply_event(&InputEvent::AxisMove { axis: 0, value: 1.0 }));
        assert!(translator.apply_event(&InputEvent::AxisMove { axis: 4, value: -1.0 }));

        let state = translator.snapshot();
        assert_eq!(state.get(Control::LeftStickX).get(), 127);
        assert_eq!(state.get(Control::RightStickY).get(), -127);
        assert_eq!(state.get(Control::LeftStickY).get(), 0);
    }

    #[test]
    fn trigger_axes_are_ignored() {
        let mut translator = StateTranslator::new();
        assert!(!translator.apply_event(&InputEvent::AxisMove { axis: 2, value: 1.0 }));
        assert!(!translator.apply_event(&InputEvent::AxisMove { axis: 5, value: 1.0 }));
        assert!(!translator.apply_event(&InputEvent::AxisMove { axis: 9, value: 1.0 }));
        assert_eq!(translator.snapshot(), ControllerState::default());
    }

    #[test]
    fn last_axis_write_wins() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::AxisMove { axis: 1, value: 0.9 });
        translator.apply_event(&InputEvent::AxisMove { axis: 1, value: -0.5 });
        assert_eq!(translator.snapshot().get(Control::LeftStickY).get(), -64);
    }

    #[test]
    fn buttons_are_binary() {
        let mut translator = StateTranslator::new();
        for (index, control) in BUTTON_TABLE.iter().enumerate() {
            translator.apply_event(&InputEvent::ButtonDown(index as u8));
            assert_eq!(translator.snapshot().get(*control), ControlValue::PRESSED);
            assert_eq!(translator.snapshot().get(*control).get(), 255);

            translator.apply_event(&InputEvent::ButtonUp(index as u8));
            assert_eq!(translator.snapshot().get(*control).get(), 0);
        }
    }

    #[test]
    fn button_table_layout() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::ButtonDown(0));
        translator.apply_event(&InputEvent::ButtonDown(10));
        translator.apply_event(&InputEvent::ButtonDown(12));

        let active: Vec<Control> = translator.snapshot().active().map(|(c, _)| c).collect();
        assert_eq!(active, vec![Control::Ps, Control::Cross, Control::R3]);
    }

    #[test]
    fn unknown_buttons_are_ignored() {
        let mut translator = StateTranslator::new();
        assert!(!translator.apply_event(&InputEvent::ButtonDown(13)));
        assert!(!translator.apply_event(&InputEvent::ButtonUp(200)));
        assert!(!translator.apply_event(&InputEvent::Other));
        assert_eq!(translator.snapshot(), ControllerState::default());
    }

    #[test]
    fn hat_left() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::HatMove { hat: 0, x: -1, y: 0 });
        assert_eq!(dpad(&translator), [255, 0, 0, 0]);
    }

    #[test]
    fn hat_up_right() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::HatMove { hat: 0, x: 1, y: 1 });
        assert_eq!(dpad(&translator), [0, 255, 255, 0]);
    }

    #[test]
    fn hat_down_then_centered() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::HatMove { hat: 0, x: 0, y: -1 });
        assert_eq!(dpad(&translator), [0, 0, 0, 255]);

        translator.apply_event(&InputEvent::HatMove { hat: 0, x: 0, y: 0 });
        assert_eq!(dpad(&translator), [0, 0, 0, 0]);
    }

    #[test]
    fn secondary_hats_are_ignored() {
        let mut translator = StateTranslator::new();
        assert!(!translator.apply_event(&InputEvent::HatMove { hat: 1, x: 1, y: 0 }));
        assert_eq!(dpad(&translator), [0, 0, 0, 0]);
    }

    #[test]
    fn disconnect_returns_to_neutral() {
        let mut translator = StateTranslator::new();
        translator.apply_event(&InputEvent::ButtonDown(4));
        translator.apply_event(&InputEvent::AxisMove { axis: 3, value: 0.7 });
        translator.apply_event(&InputEvent::HatMove { hat: 0, x: 1, y: 0 });

        assert!(translator.apply_event(&InputEvent::Disconnected));
        assert_eq!(translator.snapshot(), ControllerState::default());
    }

    #[test]
    fn snapshot_is_detached() {
        let mut translator = StateTranslator::new();
        let before = translator.snapshot();
        translator.apply_event(&InputEvent::ButtonDown(1));
        assert_eq!(before.get(Control::Circle), ControlValue::RELEASED);
        assert_eq!(translator.snapshot().get(Control::Circle), ControlValue::PRESSED);
    }
}
