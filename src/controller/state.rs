use crate::protocol::{Control, ControlValue};

/// Current value of every control on the emulated controller
///
/// Total over [`Control::ALL`]; a fresh state has every axis centered and every
/// button released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    values: [ControlValue; Control::COUNT],
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            values: Control::ALL.map(Control::default_value),
        }
    }
}

impl ControllerState {
    pub fn get(&self, control: Control) -> ControlValue {
        self.values[control.index()]
    }

    pub(crate) fn set(&mut self, control: Control, value: ControlValue) {
        self.values[control.index()] = value;
    }

    /// Controls and their values in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Control, ControlValue)> + '_ {
        Control::ALL
            .iter()
            .map(move |&control| (control, self.values[control.index()]))
    }

    /// Controls currently away from their default value
    pub fn active(&self) -> impl Iterator<Item = (Control, ControlValue)> + '_ {
        self.iter()
            .filter(|(control, value)| *value != control.default_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_neutral() {
        let state = ControllerState::default();
        assert_eq!(state.iter().count(), Control::COUNT);
        assert_eq!(state.active().count(), 0);
        assert_eq!(state.get(Control::LeftStickY), ControlValue::CENTER);
        assert_eq!(state.get(Control::Ps), ControlValue::RELEASED);
    }

    #[test]
    fn active_lists_only_touched_controls() {
        let mut state = ControllerState::default();
        state.set(Control::R1, ControlValue::PRESSED);
        state.set(Control::RightStickX, ControlValue::new(-30));

        let active: Vec<_> = state.active().collect();
        assert_eq!(
            active,
            vec![
                (Control::RightStickX, ControlValue::new(-30)),
                (Control::R1, ControlValue::PRESSED),
            ]
        );
    }
}
