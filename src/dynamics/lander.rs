use nalgebra::{Quaternion, Vector3};

use crate::dynamics::state::{Deriv, SimState};
use crate::vehicle::{LanderConfig, StackStatus, ThrusterSettings};

// ---------------------------------------------------------------------------
// Lander 6DOF equations of motion
// ---------------------------------------------------------------------------

/// Forces and moments in the body frame for the current actuator settings.
///
/// Returns (force, moment, vernier mass flow, retro mass flow).
pub fn body_loads(
    state: &SimState,
    lander: &LanderConfig,
    stack: StackStatus,
    thrusters: &ThrusterSettings,
) -> (Vector3<f64>, Vector3<f64>, f64, f64) {
    let mut force = Vector3::zeros();
    let mut moment = Vector3::zeros();

    // --- Verniers (vernier 1 deflects, 2 and 3 fire along +z) ---
    let mut vernier_flow = 0.0;
    if state.vernier_prop > 0.0 {
        let rated = lander.vernier.rated_thrust;
        let dirs = [thrusters.vernier.thrust_direction(), Vector3::z(), Vector3::z()];
        for ((r, dir), level) in lander.vernier.positions().iter().zip(dirs.iter()).zip(thrusters.vernier.levels) {
            let f = dir * (level * rated);
            force += f;
            moment += r.cross(&f);
            vernier_flow += level * rated / lander.vernier_isp;
        }
    }

    // --- Retro (on the roll axis, no moment) ---
    let mut retro_flow = 0.0;
    if stack.has_retro() && state.retro_prop > 0.0 && thrusters.retro > 0.0 {
        let f = Vector3::new(0.0, 0.0, lander.retro_thrust * thrusters.retro);
        force += f;
        moment += Vector3::new(0.0, 0.0, lander.retro_station).cross(&f);
        retro_flow = lander.retro_mass_flow() * thrusters.retro;
    }

    (force, moment, vernier_flow, retro_flow)
}

/// Full state derivatives: uniform gravity, engine thrust, rigid-body rotation.
pub fn derivatives(
    state: &SimState,
    lander: &LanderConfig,
    stack: StackStatus,
    thrusters: &ThrusterSettings,
    gravity: f64,
) -> Deriv {
    let mass = lander.mass(stack, state.retro_prop, state.vernier_prop);
    let (force_body, moment, vernier_flow, retro_flow) = body_loads(state, lander, stack, thrusters);

    // --- Translation (local frame, no atmosphere) ---
    let accel = state.quat * force_body / mass - Vector3::new(0.0, 0.0, gravity);

    // --- Euler's equation: I * domega = M - omega × (I * omega) ---
    let inertia = lander.inertia(mass);
    let i_omega = inertia.component_mul(&state.omega);
    let domega = (moment - state.omega.cross(&i_omega)).component_div(&inertia);

    // --- Quaternion kinematics: dq/dt = 0.5 * q * omega_quat ---
    let omega_quat = Quaternion::new(0.0, state.omega.x, state.omega.y, state.omega.z);
    let dquat = state.quat.quaternion() * omega_quat * 0.5;

    Deriv {
        dpos: state.vel,
        dvel: accel,
        dquat,
        domega,
        dretro_prop: -retro_flow,
        dvernier_prop: -vernier_flow,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::RateCommand;
    use crate::vehicle::presets;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn upright(lander: &LanderConfig) -> SimState {
        SimState {
            time: 0.0,
            pos: Vector3::new(0.0, 0.0, 1000.0),
            vel: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            omega: Vector3::zeros(),
            retro_prop: lander.retro_prop_mass,
            vernier_prop: lander.vernier_prop_mass,
        }
    }

    #[test]
    fn coasting_falls_at_lunar_gravity() {
        let l = presets::surveyor();
        let d = derivatives(&upright(&l), &l, StackStatus::Full, &ThrusterSettings::default(), 1.62);
        assert_relative_eq!(d.dvel, Vector3::new(0.0, 0.0, -1.62), epsilon = 1e-12);
        assert_eq!(d.dretro_prop, 0.0);
        assert_eq!(d.dvernier_prop, 0.0);
    }

    #[test]
    fn retro_burn_decelerates_and_drains() {
        let l = presets::surveyor();
        let thrusters = ThrusterSettings { retro: 1.0, ..Default::default() };
        let d = derivatives(&upright(&l), &l, StackStatus::AmrJettisoned, &thrusters, 1.62);
        assert!(d.dvel.z > 30.0);
        assert_relative_eq!(d.dretro_prop, -l.retro_mass_flow(), epsilon = 1e-12);
        assert_relative_eq!(d.domega, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn dropped_retro_cannot_fire() {
        let l = presets::surveyor();
        let thrusters = ThrusterSettings { retro: 1.0, ..Default::default() };
        let d = derivatives(&upright(&l), &l, StackStatus::RetroJettisoned, &thrusters, 1.62);
        assert_relative_eq!(d.dvel.z, -1.62, epsilon = 1e-12);
    }

    #[test]
    fn even_verniers_produce_no_moment() {
        let l = presets::surveyor();
        let thrusters = ThrusterSettings { vernier: RateCommand::uniform(0.5), retro: 0.0 };
        let (f, m, flow, _) = body_loads(&upright(&l), &l, StackStatus::RetroJettisoned, &thrusters);
        assert_relative_eq!(f.z, 1.5 * 463.0, epsilon = 1e-9);
        assert_relative_eq!(m, Vector3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(flow, 1.5 * 463.0 / 3200.0, epsilon = 1e-12);
    }

    #[test]
    fn deflected_vernier_rolls() {
        let l = presets::surveyor();
        let cmd = RateCommand { levels: [0.5, 0.5, 0.5], deflection: 0.05 };
        let thrusters = ThrusterSettings { vernier: cmd, retro: 0.0 };
        let (_, m, _, _) = body_loads(&upright(&l), &l, StackStatus::RetroJettisoned, &thrusters);
        let expected = -l.vernier.moment_arm * 0.5 * 463.0 * 0.05_f64.sin();
        assert_relative_eq!(m.z, expected, epsilon = 1e-9);
    }

    #[test]
    fn empty_vernier_tanks_give_no_thrust() {
        let l = presets::surveyor();
        let mut s = upright(&l);
        s.vernier_prop = 0.0;
        let thrusters = ThrusterSettings { vernier: RateCommand::uniform(1.0), retro: 0.0 };
        let (f, _, flow, _) = body_loads(&s, &l, StackStatus::RetroJettisoned, &thrusters);
        assert_eq!(f, Vector3::zeros());
        assert_eq!(flow, 0.0);
    }
}
