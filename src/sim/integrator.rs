use nalgebra::UnitQuaternion;

use crate::dynamics;
use crate::dynamics::state::SimState;
use crate::vehicle::{LanderConfig, StackStatus, ThrusterSettings};

// ---------------------------------------------------------------------------
// RK4 integrator with actuator settings held constant over the step
// ---------------------------------------------------------------------------

/// Single RK4 step with constant thruster settings over the step.
pub fn rk4_step(
    state: &SimState,
    lander: &LanderConfig,
    stack: StackStatus,
    thrusters: &ThrusterSettings,
    gravity: f64,
    dt: f64,
) -> SimState {
    let f = |s: &SimState| dynamics::derivatives(s, lander, stack, thrusters, gravity);
    let k1 = f(state);
    let k2 = f(&state.apply(&k1, dt * 0.5));
    let k3 = f(&state.apply(&k2, dt * 0.5));
    let k4 = f(&state.apply(&k3, dt));

    let new_quat_raw = state.quat.quaternion()
        + (k1.dquat + k2.dquat * 2.0 + k3.dquat * 2.0 + k4.dquat) * (dt / 6.0);

    SimState {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        quat: UnitQuaternion::new_normalize(new_quat_raw),
        omega: state.omega
            + (k1.domega + 2.0 * k2.domega + 2.0 * k3.domega + k4.domega) * (dt / 6.0),
        retro_prop: (state.retro_prop
            + (k1.dretro_prop + 2.0 * k2.dretro_prop + 2.0 * k3.dretro_prop + k4.dretro_prop) * (dt / 6.0))
            .max(0.0),
        vernier_prop: (state.vernier_prop
            + (k1.dvernier_prop + 2.0 * k2.dvernier_prop + 2.0 * k3.dvernier_prop + k4.dvernier_prop)
                * (dt / 6.0))
            .max(0.0),
    }
}
