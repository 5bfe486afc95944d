//! One-shot latch between the capture surface and the lookup path.
//!
//! The camera delivers a stream of capture events; only the first event per
//! armed session may reach the orchestrator. The latch is an explicit
//! two-state machine so the reset-on-representation contract is testable on
//! its own.

/// A decoded capture event delivered by the camera boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEvent {
    pub code: String,
    pub symbology: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GateState {
    Armed,
    Consumed,
}

#[derive(Debug)]
pub struct ScanGate {
    state: GateState,
}

impl ScanGate {
    /// A new gate starts armed.
    pub fn new() -> Self {
        Self {
            state: GateState::Armed,
        }
    }

    /// Re-arms the gate when the capture surface is freshly presented.
    pub fn rearm(&mut self) {
        self.state = GateState::Armed;
    }

    pub fn is_armed(&self) -> bool {
        self.state == GateState::Armed
    }

    /// Forwards the event if the gate is still armed, consuming the session.
    /// Every further event is dropped until the next `rearm`.
    pub fn offer(&mut self, event: ScanEvent) -> Option<ScanEvent> {
        match self.state {
            GateState::Armed => {
                self.state = GateState::Consumed;
                Some(event)
            }
            GateState::Consumed => None,
        }
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}
