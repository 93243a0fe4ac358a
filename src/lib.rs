pub mod config;
pub mod error;
pub mod dynamics;
pub mod vehicle;
mod gnc_mod;
pub mod sim;
pub mod io;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub mod types {
    pub use crate::config::{AutopilotConfig, LUNAR_G};
    pub use crate::dynamics::state::{RateCommand, SimState, ThrusterCommand, VehicleState};
    pub use crate::error::{AutopilotError, ConfigError, Result};
    pub use crate::vehicle::{LanderConfig, StackStatus};
}
