//! Control surface of the emulated PS4 controller
//!
//! Codes are protocol-visible and must never be renumbered. Analog controls
//! occupy `0..=7`, digital controls `128..=147`.

use std::fmt::{self, Display};

/// Value domain of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Signed axis, `-128..=127`, `0` is center
    Analog,

    /// Two-point button, either [`ControlValue::RELEASED`] or [`ControlValue::PRESSED`]
    Digital,
}

impl ControlKind {
    /// Checks whether `value` lies inside the domain of this kind
    pub fn accepts(self, value: ControlValue) -> bool {
        match self {
            ControlKind::Analog => (-128..=127).contains(&value.0),
            ControlKind::Digital => {
                value == ControlValue::RELEASED || value == ControlValue::PRESSED
            }
        }
    }
}

/// Intensity or pressed state of one control
///
/// Held as `i16` so both the signed analog range and the unsigned button
/// value 255 fit without reinterpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlValue(i16);

impl ControlValue {
    pub const CENTER: ControlValue = ControlValue(0);
    pub const RELEASED: ControlValue = ControlValue(0);
    pub const PRESSED: ControlValue = ControlValue(255);

    /// Largest magnitude an analog axis reaches after translation
    pub const AXIS_LIMIT: i16 = 127;

    pub const fn new(raw: i16) -> Self {
        ControlValue(raw)
    }

    pub fn from_pressed(pressed: bool) -> Self {
        if pressed {
            ControlValue::PRESSED
        } else {
            ControlValue::RELEASED
        }
    }

    pub const fn get(self) -> i16 {
        self.0
    }

    /// 32-bit big-endian wire representation, sign-extended for negative axes
    pub fn to_wire(self) -> [u8; 4] {
        i32::from(self.0).to_be_bytes()
    }
}

impl Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every axis and button the remote service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Control {
    LeftStickX = 0,
    LeftStickY = 1,
    RightStickX = 2,
    RightStickY = 3,

    /// Touchpad finger coordinates
    Finger1X = 4,
    Finger1Y = 5,
    Finger2X = 6,
    Finger2Y = 7,

    Share = 128,
    Options = 129,
    Ps = 130,

    /// Directional pad
    Up = 131,
    Right = 132,
    Down = 133,
    Left = 134,

    Triangle = 135,
    Circle = 136,
    Cross = 137,
    Square = 138,
    L1 = 139,
    R1 = 140,
    L2 = 141,
    R2 = 142,
    L3 = 143,
    R3 = 144,

    /// Touchpad click and finger presence
    Touchpad = 145,
    Finger1 = 146,
    Finger2 = 147,
}

impl Control {
    pub const COUNT: usize = 28;

    /// All controls in declaration order
    pub const ALL: [Control; Control::COUNT] = [
        Control::LeftStickX,
        Control::LeftStickY,
        Control::RightStickX,
        Control::RightStickY,
        Control::Finger1X,
        Control::Finger1Y,
        Control::Finger2X,
        Control::Finger2Y,
        Control::Share,
        Control::Options,
        Control::Ps,
        Control::Up,
        Control::Right,
        Control::Down,
        Control::Left,
        Control::Triangle,
        Control::Circle,
        Control::Cross,
        Control::Square,
        Control::L1,
        Control::R1,
        Control::L2,
        Control::R2,
        Control::L3,
        Control::R3,
        Control::Touchpad,
        Control::Finger1,
        Control::Finger2,
    ];

    /// First code of the digital range
    const DIGITAL_BASE: u8 = 128;

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Control> {
        Control::ALL.get(Self::position_of(code)?).copied()
    }

    pub fn kind(self) -> ControlKind {
        if self.code() < Self::DIGITAL_BASE {
            ControlKind::Analog
        } else {
            ControlKind::Digital
        }
    }

    pub fn default_value(self) -> ControlValue {
        match self.kind() {
            ControlKind::Analog => ControlValue::CENTER,
            ControlKind::Digital => ControlValue::RELEASED,
        }
    }

    /// Slot of this control inside [`Control::ALL`]
    pub fn index(self) -> usize {
        Self::slot(self.code())
    }

    const ANALOG_COUNT: usize = 8;

    // Codes are dense inside both ranges, so the slot is a plain offset.
    fn slot(code: u8) -> usize {
        if code < Self::DIGITAL_BASE {
            code as usize
        } else {
            (code - Self::DIGITAL_BASE) as usize + Self::ANALOG_COUNT
        }
    }

    fn position_of(code: u8) -> Option<usize> {
        let slot = Self::slot(code);
        let limit = if code < Self::DIGITAL_BASE {
            Self::ANALOG_COUNT
        } else {
            Self::COUNT
        };
        (slot < limit).then_some(slot)
    }
}

impl From<Control> for u8 {
    fn from(control: Control) -> Self {
        control.code()
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
