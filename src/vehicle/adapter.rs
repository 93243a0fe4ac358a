use crate::dynamics::state::{RateCommand, ThrusterCommand, VehicleState};

/// Boundary between the autopilot and whatever flies the vehicle.
///
/// The adapter owns the actuators: settings persist between ticks until a
/// command overwrites them.
pub trait VehicleAdapter {
    fn state(&self) -> VehicleState;

    fn set_vernier(&mut self, cmd: &RateCommand);

    fn set_retro(&mut self, level: f64);

    fn vernier_levels(&self) -> [f64; 3];

    fn retro_level(&self) -> f64;

    /// Write every actuator the command touches.
    fn apply(&mut self, cmd: &ThrusterCommand) {
        if let Some(v) = &cmd.vernier {
            self.set_vernier(v);
        }
        if let Some(level) = cmd.retro {
            self.set_retro(level);
        }
    }
}

/// Latched actuator settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThrusterSettings {
    pub vernier: RateCommand,
    pub retro: f64,
}

impl ThrusterSettings {
    pub fn apply(&mut self, cmd: &ThrusterCommand) {
        if let Some(v) = cmd.vernier {
            self.vernier = RateCommand {
                levels: v.levels.map(|l| l.clamp(0.0, 1.0)),
                deflection: v.deflection,
            };
        }
        if let Some(level) = cmd.retro {
            self.retro = level.clamp(0.0, 1.0);
        }
    }
}
