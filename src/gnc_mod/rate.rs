use nalgebra::Vector3;

use crate::config::{ControlGains, VernierGeometry};
use crate::dynamics::state::RateCommand;

// ---------------------------------------------------------------------------
// Angular-velocity controller (inner attitude loop)
// ---------------------------------------------------------------------------

/// Maps a body-rate error into three vernier throttles and the deflection of
/// vernier 1, while holding the requested steady-state throttle.
///
/// Proportional per axis, no integrator: the output depends only on the inputs
/// of the current call.
#[derive(Debug, Clone)]
pub struct RateController {
    pub gain: Vector3<f64>,
    pub deadband: f64,
    pub vernier: VernierGeometry,
}

impl RateController {
    pub fn new(gains: &ControlGains, vernier: &VernierGeometry) -> Self {
        Self {
            gain: gains.rate_gain,
            deadband: gains.rate_deadband,
            vernier: vernier.clone(),
        }
    }

    /// Compute the vernier command driving `actual` toward `desired`.
    pub fn command(&self, desired: &Vector3<f64>, actual: &Vector3<f64>, throttle: f64) -> RateCommand {
        let error = actual - desired;
        if error.norm() < self.deadband {
            return RateCommand::uniform(throttle);
        }

        let v = &self.vernier;
        let r = v.moment_arm;

        // Vernier 1 holds the steady-state level, kept off the stops so 2 and 3 have room
        let f1 = v.rated_thrust * throttle.clamp(v.thrust1_min, v.thrust1_max);

        let moment = self.gain.component_mul(&error);

        // Roll is only reachable through vernier 1's deflection
        let roll = (-moment.z / (r * f1)).clamp(-1.0, 1.0);
        let alpha = roll.asin().clamp(-v.max_deflection, v.max_deflection);

        // Pitch and yaw from the 120° layout, given f1 and alpha
        let (s, c) = alpha.sin_cos();
        let common = f1 * c - moment.x / r;
        let split = (v.station * f1 * s - moment.y) / (3.0_f64.sqrt() * r);
        let f_minus = common - split;  // vernier 3, at -x
        let f_plus = common + split;   // vernier 2, at +x

        RateCommand {
            levels: [
                (f1 / v.rated_thrust).clamp(0.0, 1.0),
                (f_plus / v.rated_thrust).clamp(0.0, 1.0),
                (f_minus / v.rated_thrust).clamp(0.0, 1.0),
            ],
            deflection: alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controller() -> RateController {
        RateController::new(&ControlGains::default(), &VernierGeometry::default())
    }

    /// Body moment produced by a command, using the engine layout.
    fn realized_moment(ctl: &RateController, cmd: &RateCommand) -> Vector3<f64> {
        let v = &ctl.vernier;
        let dirs = [cmd.thrust_direction(), Vector3::z(), Vector3::z()];
        v.positions()
            .iter()
            .zip(dirs.iter())
            .zip(cmd.levels.iter())
            .map(|((r, d), l)| r.cross(&(d * (*l * v.rated_thrust))))
            .sum()
    }

    #[test]
    fn deadband_holds_requested_throttle() {
        let ctl = controller();
        let w = Vector3::new(0.01, -0.02, 0.003);
        let cmd = ctl.command(&w, &(w + Vector3::new(5e-5, 0.0, 0.0)), 0.37);
        for l in cmd.levels {
            assert_relative_eq!(l, 0.37, epsilon = 1e-12);
        }
        assert_eq!(cmd.deflection, 0.0);
    }

    #[test]
    fn outputs_stay_in_range() {
        let ctl = controller();
        let max_defl = 5.0_f64.to_radians();
        let mags = [1e-4, 1e-3, 0.01, 0.1, 1.0, 10.0];
        let dirs = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(-1.0, 1.0, -1.0).normalize(),
            Vector3::new(0.3, 0.9, 0.2).normalize(),
        ];
        for throttle in [0.0, 0.02, 0.5, 0.97, 1.0] {
            for m in mags {
                for d in &dirs {
                    let cmd = ctl.command(&Vector3::zeros(), &(d * m), throttle);
                    for l in cmd.levels {
                        assert!((0.0..=1.0).contains(&l), "level {} for |e|={} t={}", l, m, throttle);
                    }
                    assert!(cmd.deflection.abs() <= max_defl + 1e-15);
                    assert!(cmd.deflection.is_finite());
                }
            }
        }
    }

    #[test]
    fn unsaturated_command_realizes_moment() {
        let ctl = controller();
        let error = Vector3::new(0.004, -0.003, 0.002);
        let cmd = ctl.command(&Vector3::zeros(), &error, 0.5);
        let m = realized_moment(&ctl, &cmd);
        let wanted = ctl.gain.component_mul(&error);
        assert_relative_eq!(m, wanted, epsilon = 1e-9);
    }

    #[test]
    fn net_thrust_tracks_requested_level() {
        let ctl = controller();
        let cmd = ctl.command(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 0.001), 0.6);
        // pure roll correction: verniers 2 and 3 balance the small cosine loss of vernier 1
        assert_relative_eq!(cmd.levels[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(cmd.levels[1], cmd.levels[2], epsilon = 5e-3);
        assert!(cmd.deflection < 0.0);
    }

    #[test]
    fn thruster_one_is_kept_off_the_stops() {
        let ctl = controller();
        let e = Vector3::new(0.001, 0.0, 0.0);
        assert_relative_eq!(ctl.command(&Vector3::zeros(), &e, 0.0).levels[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(ctl.command(&Vector3::zeros(), &e, 1.0).levels[0], 0.95, epsilon = 1e-12);
    }

    #[test]
    fn large_roll_demand_saturates_instead_of_nan() {
        let ctl = controller();
        let cmd = ctl.command(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 5.0), 0.0);
        assert_relative_eq!(cmd.deflection, -5.0_f64.to_radians(), epsilon = 1e-12);
        let cmd = ctl.command(&Vector3::zeros(), &Vector3::new(0.0, 0.0, -5.0), 0.0);
        assert_relative_eq!(cmd.deflection, 5.0_f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let ctl = controller();
        let desired = Vector3::new(0.01, 0.0, 0.0);
        let actual = Vector3::new(-0.002, 0.004, 0.01);
        let a = ctl.command(&desired, &actual, 0.25);
        let b = ctl.command(&desired, &actual, 0.25);
        assert_eq!(a, b);
    }
}
