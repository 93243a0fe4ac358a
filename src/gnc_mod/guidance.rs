use crate::config::{TerminalDescent, VernierGeometry};

// ---------------------------------------------------------------------------
// Terminal-descent guidance: steady-state vernier throttle
// ---------------------------------------------------------------------------

/// Target speed for the remaining descent from `altitude`.
pub fn target_speed(terminal: &TerminalDescent, altitude: f64) -> f64 {
    if altitude <= terminal.slow_gate_altitude {
        terminal.slow_speed
    } else {
        terminal.fast_speed
    }
}

/// Throttle shared by all three verniers that brings the current `speed` to
/// the target speed at touchdown.
///
/// Assumes constant gravity, constant mass over the remaining descent and a
/// vertical (−90°) flight path:
///   F = m·g − m·(v_target² − v²) / h
pub fn terminal_throttle(
    terminal: &TerminalDescent,
    vernier: &VernierGeometry,
    gravity: f64,
    altitude: f64,
    mass: f64,
    speed: f64,
) -> f64 {
    if altitude <= 0.0 {
        return 1.0;
    }
    let v_target = target_speed(terminal, altitude);
    let force = mass * gravity - mass * (v_target * v_target - speed * speed) / altitude;
    (force / vernier.total_thrust()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn throttle(terminal: &TerminalDescent, altitude: f64, mass: f64, speed: f64) -> f64 {
        terminal_throttle(terminal, &VernierGeometry::default(), 1.62, altitude, mass, speed)
    }

    #[test]
    fn below_gate_targets_slow_speed() {
        let t = TerminalDescent::default();
        assert_eq!(target_speed(&t, 400.0), 1.0);
        assert_eq!(target_speed(&t, 500.0), 1.0);
        assert_eq!(target_speed(&t, 500.1), 50.0);
    }

    #[test]
    fn fast_descent_at_400m_matches_closed_form() {
        let t = TerminalDescent::default();
        let expected = ((300.0_f64 * 1.62 - 300.0 * (1.0 - 3600.0) / 400.0) / (3.0 * 463.0)).clamp(0.0, 1.0);
        assert_relative_eq!(throttle(&t, 400.0, 300.0, 60.0), expected, epsilon = 1e-12);
        assert_eq!(expected, 1.0);
    }

    #[test]
    fn unsaturated_value_matches_closed_form() {
        let t = TerminalDescent::default();
        // 2 km, 400 kg, 70 m/s: F = 648 + 400·(4900 − 2500)/2000 = 1128 N
        let got = throttle(&t, 2_000.0, 400.0, 70.0);
        let f = 400.0 * 1.62 - 400.0 * (2500.0 - 4900.0) / 2000.0;
        assert_relative_eq!(got, f / 1389.0, epsilon = 1e-12);
        assert!(got > 0.0 && got < 1.0);
    }

    #[test]
    fn slow_enough_descent_cuts_throttle() {
        let t = TerminalDescent::default();
        // already slower than target: gravity alone is not enough to brake against
        let got = throttle(&t, 10_000.0, 350.0, 10.0);
        let f = 350.0 * 1.62 - 350.0 * (2500.0 - 100.0) / 10_000.0;
        assert_relative_eq!(got, f / 1389.0, epsilon = 1e-12);
        assert_eq!(throttle(&t, 1_000.0, 350.0, 0.0), 0.0);
    }

    #[test]
    fn gate_in_feet_changes_target_between_152_and_500() {
        let literal = TerminalDescent::default();
        let feet = TerminalDescent { slow_gate_altitude: 500.0 * 0.3048, ..TerminalDescent::default() };

        // at 300 m the literal gate already asks for 1 m/s, the converted one still for 50 m/s
        assert_eq!(target_speed(&literal, 300.0), 1.0);
        assert_eq!(target_speed(&feet, 300.0), 50.0);
        assert!(throttle(&literal, 300.0, 320.0, 30.0) > throttle(&feet, 300.0, 320.0, 30.0));

        // both agree below 152.4 m
        assert_eq!(throttle(&literal, 100.0, 320.0, 8.0), throttle(&feet, 100.0, 320.0, 8.0));
    }

    #[test]
    fn non_positive_altitude_is_full_throttle() {
        let t = TerminalDescent::default();
        assert_eq!(throttle(&t, 0.0, 300.0, 3.0), 1.0);
    }
}
