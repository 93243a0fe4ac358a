use nalgebra::Vector3;

use crate::config::{ControlGains, VernierGeometry};
use crate::dynamics::state::RateCommand;
use super::frame::{retrograde_angle, retrograde_axis};
use super::rate::RateController;

// ---------------------------------------------------------------------------
// Vernier attitude control: hold the roll axis against the velocity vector
// ---------------------------------------------------------------------------

/// Outer loop. Turns the pointing error into a desired body rate and hands it
/// to the rate loop together with the steady-state throttle.
#[derive(Debug, Clone)]
pub struct AttitudeController {
    pub angle_gain: f64,
    pub angle_deadband: f64,
    pub max_rate: f64,
    pub rate: RateController,
}

impl AttitudeController {
    pub fn new(gains: &ControlGains, vernier: &VernierGeometry) -> Self {
        Self {
            angle_gain: gains.angle_gain,
            angle_deadband: gains.angle_deadband,
            max_rate: gains.max_rate,
            rate: RateController::new(gains, vernier),
        }
    }

    /// Desired body rate for a surface-relative velocity `v` (body frame).
    ///
    /// The sign follows the host's left-handed body-rate convention: a negative
    /// rate about `z × (−v)` turns the roll axis toward `−v`.
    pub fn desired_rate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let angle = match retrograde_angle(v) {
            Some(a) if a >= self.angle_deadband => a,
            _ => return Vector3::zeros(),
        };
        let axis = retrograde_axis(v).unwrap_or_else(|| {
            // Velocity straight along +z: any transverse axis works
            tracing::warn!(angle, "velocity along roll axis, correcting about body x");
            Vector3::x()
        });
        let magnitude = -(self.angle_gain * angle).min(self.max_rate);
        axis * magnitude
    }

    /// Full vernier command for one tick.
    pub fn command(&self, v: &Vector3<f64>, omega: &Vector3<f64>, throttle: f64) -> RateCommand {
        let omega_d = self.desired_rate(v);
        self.rate.command(&omega_d, omega, throttle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controller() -> AttitudeController {
        AttitudeController::new(&ControlGains::default(), &VernierGeometry::default())
    }

    #[test]
    fn converged_attitude_commands_no_rate() {
        let ctl = controller();
        // 0.005 rad off, inside the 0.01 rad deadband
        let v = Vector3::new(0.005_f64.sin(), 0.0, -0.005_f64.cos()) * 100.0;
        assert_eq!(ctl.desired_rate(&v), Vector3::zeros());
    }

    #[test]
    fn small_error_is_proportional() {
        let ctl = controller();
        let angle: f64 = 0.02;
        let v = Vector3::new(angle.sin(), 0.0, -angle.cos()) * 300.0;
        let w = ctl.desired_rate(&v);
        // axis = z × (−v) = (0, −sin, 0), rate = −0.5·0.02
        assert_relative_eq!(w, Vector3::new(0.0, 0.01, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn large_error_saturates_rate() {
        let ctl = controller();
        let v = Vector3::new(-40.0, 30.0, -10.0);
        let w = ctl.desired_rate(&v);
        assert_relative_eq!(w.norm(), 0.02, epsilon = 1e-12);
        assert_eq!(w.z, 0.0);
    }

    #[test]
    fn zero_velocity_is_treated_as_aligned() {
        let ctl = controller();
        assert_eq!(ctl.desired_rate(&Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn tail_first_velocity_uses_fallback_axis() {
        let ctl = controller();
        let w = ctl.desired_rate(&Vector3::new(0.0, 0.0, 20.0));
        assert_relative_eq!(w, Vector3::new(-0.02, 0.0, 0.0), epsilon = 1e-12);
        assert!(w.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn aligned_and_still_passes_throttle_through() {
        let ctl = controller();
        let cmd = ctl.command(&Vector3::new(0.0, 0.0, -1700.0), &Vector3::zeros(), 0.0);
        assert_eq!(cmd, RateCommand::uniform(0.0));
        let cmd = ctl.command(&Vector3::new(0.0, 0.0, -60.0), &Vector3::zeros(), 0.42);
        assert_eq!(cmd.levels, [0.42; 3]);
    }
}
