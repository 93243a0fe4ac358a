pub mod controller;
pub mod frame;
pub mod rate;
pub mod attitude;
pub mod guidance;
pub mod autopilot;

pub use controller::Controller;
pub use rate::RateController;
pub use attitude::AttitudeController;
pub use guidance::terminal_throttle;
pub use autopilot::{Autopilot, AutopilotPhase};
