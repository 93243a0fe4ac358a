pub mod state;
pub mod lander;

pub use state::{Deriv, RateCommand, SimState, ThrusterCommand, VehicleState};
pub use lander::derivatives;
