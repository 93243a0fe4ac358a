use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Body-frame geometry for pointing the roll axis against the velocity
// ---------------------------------------------------------------------------

/// Below this fraction of the speed the transverse velocity is treated as zero.
const TRANSVERSE_EPS: f64 = 1e-9;

/// Angle between the roll axis (body +z) and the anti-velocity direction.
///
/// Returns `None` when the velocity is zero and there is nothing to point at.
pub fn retrograde_angle(v: &Vector3<f64>) -> Option<f64> {
    let speed = v.norm();
    if speed == 0.0 {
        return None;
    }
    Some((-v.z / speed).clamp(-1.0, 1.0).acos())
}

/// Unit axis, perpendicular to the roll axis, about which the body rotates to
/// bring the roll axis onto the anti-velocity direction: `z × (−v)` normalized.
///
/// The axis has no roll component. Returns `None` when the velocity has no
/// transverse part, where the cross product vanishes.
pub fn retrograde_axis(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let transverse = v.x.hypot(v.y);
    if transverse <= TRANSVERSE_EPS * v.norm() {
        return None;
    }
    Some(Vector3::new(v.y / transverse, -v.x / transverse, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn aligned_descent_has_zero_angle() {
        let a = retrograde_angle(&Vector3::new(0.0, 0.0, -1700.0)).unwrap();
        assert_eq!(a, 0.0);
    }

    #[test]
    fn sideways_velocity_is_quarter_turn() {
        let a = retrograde_angle(&Vector3::new(12.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(a, FRAC_PI_2, epsilon = 1e-12);
        let backwards = retrograde_angle(&Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(backwards, PI, epsilon = 1e-12);
    }

    #[test]
    fn zero_velocity_has_no_angle() {
        assert!(retrograde_angle(&Vector3::zeros()).is_none());
    }

    #[test]
    fn axis_matches_cross_product() {
        let v = Vector3::new(3.0, -4.0, -20.0);
        let axis = retrograde_axis(&v).unwrap();
        let expected = Vector3::z().cross(&(-v)).normalize();
        assert_relative_eq!(axis, expected, epsilon = 1e-12);
        assert_eq!(axis.z, 0.0);
        assert_relative_eq!(axis.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn axis_undefined_along_roll_axis() {
        assert!(retrograde_axis(&Vector3::new(0.0, 0.0, -50.0)).is_none());
        assert!(retrograde_axis(&Vector3::new(1e-12, 0.0, 50.0)).is_none());
        assert!(retrograde_axis(&Vector3::zeros()).is_none());
    }
}
