use crate::dynamics::state::{ThrusterCommand, VehicleState};
use super::autopilot::AutopilotPhase;

/// Trait for descent controllers.
///
/// Implement this to fly the simulated lander with something other than the
/// built-in autopilot.
pub trait Controller {
    /// Compute thruster commands from the current vehicle snapshot.
    fn control(&mut self, state: &VehicleState, dt: f64) -> ThrusterCommand;

    /// Return to the initial state of the sequence.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }

    /// Current descent phase, for controllers that sequence one.
    fn phase(&self) -> Option<AutopilotPhase> {
        None
    }

    /// Steady-state throttle requested on the last tick.
    fn target_throttle(&self) -> Option<f64> {
        None
    }
}
