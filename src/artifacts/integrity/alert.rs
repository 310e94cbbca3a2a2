use crate::artifacts::integrity::event::CorruptionEvent;
use std::sync::{Mutex, PoisonError};
use tracing::error;

/// Receiver of corruption events
///
/// The engine calls `send` once per corrupted verification, after recovery
/// has been attempted, so the event already says whether it was recovered.
pub trait AlertSink: Send + Sync + std::fmt::Debug {
    fn send(&self, event: &CorruptionEvent);
}

/// Logs events at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn send(&self, event: &CorruptionEvent) {
        error!(
            paths = ?event.affected_paths,
            corruption = event.corruption_type.as_str(),
            severity = event.severity.as_str(),
            recovered = event.auto_recovered,
            recovery = event.recovery_method.map(|method| method.as_str()).unwrap_or("-"),
            detected_by = %event.detected_by,
            "asset corruption detected"
        );
    }
}

/// Keeps events in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryAlertSink {
    events: Mutex<Vec<CorruptionEvent>>,
}

impl MemoryAlertSink {
    pub fn events(&self) -> Vec<CorruptionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AlertSink for MemoryAlertSink {
    fn send(&self, event: &CorruptionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
