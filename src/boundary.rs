use crate::events::{EventBus, TourEvent};
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Clear,
    Tripped(String),
}

/// Two-state fault boundary around scene loading and traversal. Once tripped
/// it stays tripped — the guarded operation no longer runs and the fallback
/// message is exposed — until the owner remounts it with a fresh identity.
/// Faults degrade to the fallback; navigation around the screen keeps working.
pub struct ErrorBoundary {
    context: String,
    state: BoundaryState,
}

impl ErrorBoundary {
    pub fn new(context: impl Into<String>) -> Self {
        Self { context: context.into(), state: BoundaryState::Clear }
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_tripped(&self) -> bool {
        matches!(self.state, BoundaryState::Tripped(_))
    }

    pub fn fallback_message(&self) -> Option<&str> {
        match &self.state {
            BoundaryState::Tripped(message) => Some(message),
            BoundaryState::Clear => None,
        }
    }

    /// Runs the operation unless the boundary is already tripped. A fault
    /// trips the boundary and is reported, never rethrown past this seam.
    pub fn guard<T>(&mut self, events: &mut EventBus, op: impl FnOnce() -> Result<T>) -> Option<T> {
        if self.is_tripped() {
            return None;
        }
        match op() {
            Ok(value) => Some(value),
            Err(err) => {
                self.trip(format!("{err:#}"), events);
                None
            }
        }
    }

    /// Records an externally observed fault (e.g. an async load failure
    /// surfacing on poll). Only the Clear→Tripped transition logs.
    pub fn trip(&mut self, message: impl Into<String>, events: &mut EventBus) {
        if self.is_tripped() {
            return;
        }
        let message = message.into();
        events.push(TourEvent::BoundaryTripped { context: self.context.clone(), message: message.clone() });
        self.state = BoundaryState::Tripped(message);
    }

    /// Fresh subtree identity: the only way out of Tripped.
    pub fn remount(&mut self) {
        self.state = BoundaryState::Clear;
    }
}
