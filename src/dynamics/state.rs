use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{AutopilotError, Result};

// ---------------------------------------------------------------------------
// Vehicle snapshot consumed by the autopilot once per tick
// ---------------------------------------------------------------------------

/// Read-only vehicle state as reported by the vehicle adapter.
///
/// Vectors are in the vehicle body frame; the roll axis is body +z and points
/// away from the engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub altitude: f64,                  // m above the reference surface
    pub surface_elevation: f64,         // m, terrain height below the vehicle
    pub surface_velocity: Vector3<f64>, // m/s, surface-relative, body frame
    pub angular_velocity: Vector3<f64>, // rad/s, body frame
    pub mass: f64,                      // kg
}

impl VehicleState {
    /// Height above the terrain directly below.
    pub fn radar_altitude(&self) -> f64 {
        self.altitude - self.surface_elevation
    }

    /// Surface-relative speed.
    pub fn speed(&self) -> f64 {
        self.surface_velocity.norm()
    }

    /// Fails on the first NaN or infinite field.
    pub fn check_finite(&self) -> Result<()> {
        let fields = [
            ("altitude", self.altitude),
            ("surface_elevation", self.surface_elevation),
            ("surface_velocity.x", self.surface_velocity.x),
            ("surface_velocity.y", self.surface_velocity.y),
            ("surface_velocity.z", self.surface_velocity.z),
            ("angular_velocity.x", self.angular_velocity.x),
            ("angular_velocity.y", self.angular_velocity.y),
            ("angular_velocity.z", self.angular_velocity.z),
            ("mass", self.mass),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some(&(field, value)) => Err(AutopilotError::NonFiniteState { field, value }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands produced by the autopilot
// ---------------------------------------------------------------------------

/// Output of the angular-velocity controller: one throttle per vernier engine
/// and the thrust-vector deflection of vernier 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateCommand {
    pub levels: [f64; 3],  // [0, 1]
    pub deflection: f64,   // rad, vernier 1 only
}

impl RateCommand {
    /// All verniers off, no deflection.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Same throttle on every engine, no deflection.
    pub fn uniform(level: f64) -> Self {
        let l = level.clamp(0.0, 1.0);
        Self { levels: [l, l, l], deflection: 0.0 }
    }

    /// Thrust direction of vernier 1 in the body frame.
    pub fn thrust_direction(&self) -> Vector3<f64> {
        Vector3::new(self.deflection.sin(), 0.0, self.deflection.cos())
    }
}

/// Everything the autopilot asks of the thrusters for one tick.
///
/// `None` leaves the corresponding actuator at its current setting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThrusterCommand {
    pub vernier: Option<RateCommand>,
    pub retro: Option<f64>,
}

impl ThrusterCommand {
    pub fn vernier(cmd: RateCommand) -> Self {
        Self { vernier: Some(cmd), retro: None }
    }

    pub fn idle() -> Self {
        Self::vernier(RateCommand::idle())
    }

    /// Touch nothing this tick.
    pub fn hold() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Simulation state of the lander (6DOF + propellant)
// ---------------------------------------------------------------------------

/// Frame: local vertical, flat terrain, +z up, origin on the terrain below the
/// starting point. Body rates are right-handed here; see `sim::vessel` for the
/// conversion to the autopilot's convention.
#[derive(Debug, Clone)]
pub struct SimState {
    pub time: f64,
    pub pos: Vector3<f64>,           // m, pos.z is height above terrain
    pub vel: Vector3<f64>,           // m/s
    pub quat: UnitQuaternion<f64>,   // body→local rotation
    pub omega: Vector3<f64>,         // rad/s, body frame
    pub retro_prop: f64,             // kg
    pub vernier_prop: f64,           // kg
}

impl SimState {
    pub fn apply(&self, d: &Deriv, dt: f64) -> SimState {
        let q_raw = self.quat.quaternion() + d.dquat * dt;
        SimState {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            vel: self.vel + d.dvel * dt,
            quat: UnitQuaternion::new_normalize(q_raw),
            omega: self.omega + d.domega * dt,
            retro_prop: (self.retro_prop + d.dretro_prop * dt).max(0.0),
            vernier_prop: (self.vernier_prop + d.dvernier_prop * dt).max(0.0),
        }
    }

    /// Roll axis in the local frame.
    pub fn body_z(&self) -> Vector3<f64> {
        self.quat * Vector3::z()
    }

    /// Velocity expressed in the body frame.
    pub fn body_velocity(&self) -> Vector3<f64> {
        self.quat.inverse() * self.vel
    }
}

#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dquat: Quaternion<f64>,  // raw quaternion derivative, not unit
    pub domega: Vector3<f64>,
    pub dretro_prop: f64,
    pub dvernier_prop: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> VehicleState {
        VehicleState {
            altitude: 1500.0,
            surface_elevation: 300.0,
            surface_velocity: Vector3::new(3.0, 4.0, 0.0),
            angular_velocity: Vector3::zeros(),
            mass: 400.0,
        }
    }

    #[test]
    fn radar_altitude_subtracts_terrain() {
        assert_eq!(snapshot().radar_altitude(), 1200.0);
        assert_eq!(snapshot().speed(), 5.0);
    }

    #[test]
    fn nan_field_is_named() {
        let mut s = snapshot();
        s.angular_velocity.y = f64::NAN;
        match s.check_finite() {
            Err(AutopilotError::NonFiniteState { field, .. }) => assert_eq!(field, "angular_velocity.y"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(snapshot().check_finite().is_ok());
    }

    #[test]
    fn uniform_command_is_clamped() {
        assert_eq!(RateCommand::uniform(1.7).levels, [1.0; 3]);
        assert_eq!(RateCommand::uniform(-0.2).levels, [0.0; 3]);
    }

    #[test]
    fn undeflected_thrust_is_along_roll_axis() {
        let d = RateCommand::idle().thrust_direction();
        assert_eq!(d, Vector3::z());
    }
}
