use nalgebra::{UnitQuaternion, Vector3};
use tracing::info;

use crate::dynamics::state::{RateCommand, SimState, ThrusterCommand, VehicleState};
use crate::vehicle::{LanderConfig, StackStatus, ThrusterSettings, VehicleAdapter};
use super::integrator::rk4_step;
use super::runner::Scenario;

// ---------------------------------------------------------------------------
// Simulated lander: the vehicle adapter used in closed-loop runs
// ---------------------------------------------------------------------------

/// Lander flying over flat terrain.
///
/// The autopilot's body rates follow the host simulator's left-handed
/// convention, so the adapter reports the right-handed simulation rates negated.
/// Positions, velocities and forces are reported unchanged.
#[derive(Debug, Clone)]
pub struct SimLander {
    pub lander: LanderConfig,
    pub state: SimState,
    pub stack: StackStatus,
    pub thrusters: ThrusterSettings,
    pub surface_elevation: f64,
    pub gravity: f64,
}

impl SimLander {
    /// Falling straight down at the scenario speed, roll axis tilted by the
    /// scenario attitude offset about body x.
    pub fn new(lander: LanderConfig, scenario: &Scenario) -> Self {
        let state = SimState {
            time: 0.0,
            pos: Vector3::new(0.0, 0.0, scenario.altitude),
            vel: Vector3::new(scenario.horizontal_speed, 0.0, -scenario.speed),
            quat: UnitQuaternion::from_axis_angle(&Vector3::x_axis(), scenario.attitude_offset),
            omega: Vector3::zeros(),
            retro_prop: lander.retro_prop_mass,
            vernier_prop: lander.vernier_prop_mass,
        };
        Self {
            lander,
            state,
            stack: StackStatus::Full,
            thrusters: ThrusterSettings::default(),
            surface_elevation: scenario.surface_elevation,
            gravity: scenario.gravity,
        }
    }

    pub fn mass(&self) -> f64 {
        self.lander.mass(self.stack, self.state.retro_prop, self.state.vernier_prop)
    }

    pub fn radar_altitude(&self) -> f64 {
        self.state.pos.z
    }

    /// Integrate one step, then drop whatever is spent.
    /// Returns the new stack status when a jettison happened.
    pub fn advance(&mut self, dt: f64) -> Option<StackStatus> {
        self.state = rk4_step(&self.state, &self.lander, self.stack, &self.thrusters, self.gravity, dt);

        let next = self.stack.check_jettison(self.state.retro_prop, self.lander.retro_prop_mass)?;
        info!(time = self.state.time, altitude = self.state.pos.z, "{}", next);
        self.stack = next;
        if !next.has_retro() {
            self.state.retro_prop = 0.0;
            self.thrusters.retro = 0.0;
        }
        Some(next)
    }

    /// Clamp onto the terrain and return the impact speed.
    pub fn touch_down(&mut self) -> f64 {
        let speed = self.state.vel.norm();
        self.state.pos.z = 0.0;
        speed
    }
}

impl VehicleAdapter for SimLander {
    fn state(&self) -> VehicleState {
        VehicleState {
            altitude: self.surface_elevation + self.state.pos.z,
            surface_elevation: self.surface_elevation,
            surface_velocity: self.state.body_velocity(),
            angular_velocity: -self.state.omega,
            mass: self.mass(),
        }
    }

    fn set_vernier(&mut self, cmd: &RateCommand) {
        self.thrusters.apply(&ThrusterCommand::vernier(*cmd));
    }

    fn set_retro(&mut self, level: f64) {
        // a dropped case cannot be relit
        if self.stack.has_retro() {
            self.thrusters.retro = level.clamp(0.0, 1.0);
        }
    }

    fn vernier_levels(&self) -> [f64; 3] {
        self.thrusters.vernier.levels
    }

    fn retro_level(&self) -> f64 {
        self.thrusters.retro
    }
}
