pub mod integrator;
pub mod vessel;
pub mod runner;
pub mod event;

pub use runner::{simulate, simulate_with, FlightLog, Scenario, TelemetryRow, Touchdown};
pub use integrator::rk4_step;
pub use vessel::SimLander;
pub use event::{EventKind, SimEvent};
