//! Frame codec for the state update and status messages

use crate::controller::ControllerState;
use crate::protocol::{Control, ControlValue, ProtocolError};
use tracing::trace;

/// Probe sent once before streaming to check the remote is alive
pub const STATUS_REQUEST: [u8; 2] = [MessageType::Status as u8, 0x00];

/// Status code the remote answers with when it is ready
pub const STATUS_OK: u8 = 0x00;

/// Most entries a single frame can carry
pub const MAX_ENTRIES: usize = u8::MAX as usize;

const HEADER_LEN: usize = 2;
const ENTRY_LEN: usize = 5;

/// First byte of every datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Status = 0x00,
    StateUpdate = 0x01,
}

/// Ordered (control code, value) pairs for one outbound frame
///
/// Behaves like a map: inserting a code twice overwrites the earlier value in
/// place, so order stays that of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: Vec<(u8, ControlValue)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u8, value: ControlValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == code) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((code, value)),
        }
    }

    pub fn insert_control(&mut self, control: Control, value: ControlValue) {
        self.insert(control.code(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u8, ControlValue)> {
        self.entries.iter()
    }

    /// Size in bytes of the frame this change set encodes to
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + ENTRY_LEN * self.entries.len()
    }
}

impl From<&ControllerState> for ChangeSet {
    /// Full snapshot in control declaration order
    fn from(state: &ControllerState) -> Self {
        let mut changes = Self::new();
        for (control, value) in state.iter() {
            changes.insert_control(control, value);
        }
        changes
    }
}

/// Serializes a change set into a state update frame
///
/// Every code must belong to the control surface and every value must lie in
/// its control's domain.
pub fn encode(changes: &ChangeSet) -> Result<Vec<u8>, ProtocolError> {
    if changes.len() > MAX_ENTRIES {
        return Err(ProtocolError::TooManyEntries(changes.len()));
    }

    let mut frame = Vec::with_capacity(changes.frame_len());
    frame.push(MessageType::StateUpdate as u8);
    frame.push(changes.len() as u8);

    for &(code, value) in changes.iter() {
        let control = Control::from_code(code).ok_or(ProtocolError::UnknownControl(code))?;
        if !control.kind().accepts(value) {
            return Err(ProtocolError::ValueOutOfRange {
                code,
                value: value.get(),
            });
        }
        frame.push(code);
        frame.extend_from_slice(&value.to_wire());
    }

    trace!("Encoded {} entries into {} bytes", changes.len(), frame.len());
    Ok(frame)
}

/// Reply to [`STATUS_REQUEST`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReply {
    pub code: u8,
}

impl StatusReply {
    pub fn parse(datagram: &[u8]) -> Result<Self, ProtocolError> {
        match datagram.first() {
            Some(&code) => Ok(Self { code }),
            None => Err(ProtocolError::Truncated {
                expected: 1,
                actual: 0,
            }),
        }
    }

    pub fn is_ok(self) -> bool {
        self.code == STATUS_OK
    }
}
