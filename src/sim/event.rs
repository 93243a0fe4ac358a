use std::fmt;

use crate::gnc::AutopilotPhase;
use crate::vehicle::StackStatus;
use super::runner::TelemetryRow;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    PhaseChange { from: AutopilotPhase, to: AutopilotPhase },
    RetroIgnition,
    RetroBurnout,
    Jettison(StackStatus),
    Touchdown { speed: f64 },
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::PhaseChange { from, to } => write!(f, "{} -> {}", from, to),
            EventKind::RetroIgnition => f.write_str("retro ignition"),
            EventKind::RetroBurnout => f.write_str("retro burnout"),
            EventKind::Jettison(status) => write!(f, "{}", status),
            EventKind::Touchdown { speed } => write!(f, "touchdown at {:.2} m/s", speed),
        }
    }
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub time: f64,
    pub altitude: f64,
    pub kind: EventKind,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive telemetry rows and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &TelemetryRow, current: &TelemetryRow) -> Option<EventKind>;
}

/// Detects autopilot phase transitions.
pub struct PhaseChangeDetector;

impl EventDetector for PhaseChangeDetector {
    fn check(&mut self, prev: &TelemetryRow, current: &TelemetryRow) -> Option<EventKind> {
        match (prev.phase, current.phase) {
            (Some(from), Some(to)) if from != to => Some(EventKind::PhaseChange { from, to }),
            _ => None,
        }
    }
}

/// Detects the retro level switching on and off.
pub struct RetroDetector;

impl EventDetector for RetroDetector {
    fn check(&mut self, prev: &TelemetryRow, current: &TelemetryRow) -> Option<EventKind> {
        if prev.retro == 0.0 && current.retro > 0.0 {
            Some(EventKind::RetroIgnition)
        } else if prev.retro > 0.0 && current.retro == 0.0 {
            Some(EventKind::RetroBurnout)
        } else {
            None
        }
    }
}

/// Detects hardware dropped from the stack.
pub struct JettisonDetector;

impl EventDetector for JettisonDetector {
    fn check(&mut self, prev: &TelemetryRow, current: &TelemetryRow) -> Option<EventKind> {
        if current.stack != prev.stack {
            Some(EventKind::Jettison(current.stack))
        } else {
            None
        }
    }
}

/// The detectors every closed-loop run uses.
pub fn default_detectors() -> Vec<Box<dyn EventDetector>> {
    vec![Box::new(PhaseChangeDetector), Box::new(RetroDetector), Box::new(JettisonDetector)]
}
