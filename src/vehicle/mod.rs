pub mod adapter;
pub mod lander;
pub mod stack;

pub use adapter::{ThrusterSettings, VehicleAdapter};
pub use lander::{presets, LanderBuilder, LanderConfig};
pub use stack::StackStatus;
