use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Autopilot configuration (immutable once handed to the autopilot)
// ---------------------------------------------------------------------------

/// Lunar surface gravity, m/s^2.
pub const LUNAR_G: f64 = 1.62;

/// Proportional gains and deadbands of the two nested attitude loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlGains {
    pub rate_gain: Vector3<f64>,  // N·m per rad/s, per body axis
    pub angle_gain: f64,          // rad/s per rad
    pub rate_deadband: f64,       // rad/s
    pub angle_deadband: f64,      // rad
    pub max_rate: f64,            // rad/s, outer-loop saturation
}

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            rate_gain: Vector3::new(400.0, 400.0, 400.0),
            angle_gain: 0.5,
            rate_deadband: 1e-4,
            angle_deadband: 0.01,
            max_rate: 0.02,
        }
    }
}

/// Timer and altitude thresholds of the descent sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSchedule {
    pub idle_duration: f64,            // s
    pub retro_arm_altitude: f64,       // m
    pub retro_ignition_delay: f64,     // s after entering the retro phase
    pub retro_phase_duration: f64,     // s, ignition delay + burn + margin
    pub terminal_engage_altitude: f64, // m
    pub shutdown_altitude: f64,        // m
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            idle_duration: 10.0,
            retro_arm_altitude: 110_000.0,
            retro_ignition_delay: 7.0,
            // 40.5 s of retro propellant plus one second of margin
            retro_phase_duration: 48.0,
            terminal_engage_altitude: 20_000.0,
            shutdown_altitude: 4.0,
        }
    }
}

/// Geometry and rating of the three vernier engines.
///
/// Vernier 1 sits on the body +y axis and is the only one that can deflect its
/// thrust (about body y, in the x-z plane). Verniers 2 and 3 sit 120° either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VernierGeometry {
    pub rated_thrust: f64,    // N per engine
    pub moment_arm: f64,      // m, radial distance from the roll axis
    pub station: f64,         // m, position along the roll axis
    pub max_deflection: f64,  // rad
    pub thrust1_min: f64,     // throttle floor for vernier 1 while correcting
    pub thrust1_max: f64,     // throttle ceiling for vernier 1 while correcting
}

impl Default for VernierGeometry {
    fn default() -> Self {
        Self {
            rated_thrust: 463.0,
            moment_arm: 0.86 - 0.28,
            station: -0.5,
            max_deflection: 5.0_f64.to_radians(),
            thrust1_min: 0.05,
            thrust1_max: 0.95,
        }
    }
}

impl VernierGeometry {
    /// Engine mounting points in the body frame, in vernier order.
    pub fn positions(&self) -> [Vector3<f64>; 3] {
        let r = self.moment_arm;
        let s = self.station;
        let c = 3.0_f64.sqrt() / 2.0;
        [
            Vector3::new(0.0, r, s),
            Vector3::new(c * r, -0.5 * r, s),
            Vector3::new(-c * r, -0.5 * r, s),
        ]
    }

    /// Combined thrust of all three engines at full throttle.
    pub fn total_thrust(&self) -> f64 {
        3.0 * self.rated_thrust
    }
}

/// Terminal-descent law targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalDescent {
    /// Below this altitude the slow target speed applies. The descent profile
    /// describes it as 500 ft but compares the bare number against meters.
    pub slow_gate_altitude: f64,
    pub slow_speed: f64,  // m/s
    pub fast_speed: f64,  // m/s
}

impl Default for TerminalDescent {
    fn default() -> Self {
        Self {
            slow_gate_altitude: 500.0,
            slow_speed: 1.0,
            fast_speed: 50.0,
        }
    }
}

/// Complete descent profile held by one autopilot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub gains: ControlGains,
    pub schedule: PhaseSchedule,
    pub vernier: VernierGeometry,
    pub terminal: TerminalDescent,
    pub gravity: f64,  // m/s^2, assumed constant by the terminal-descent law
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self::surveyor()
    }
}

impl AutopilotConfig {
    /// The Surveyor descent profile.
    pub fn surveyor() -> Self {
        Self {
            gains: ControlGains::default(),
            schedule: PhaseSchedule::default(),
            vernier: VernierGeometry::default(),
            terminal: TerminalDescent::default(),
            gravity: LUNAR_G,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject profiles the control laws cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.gains;
        for (i, k) in g.rate_gain.iter().enumerate() {
            if !(k.is_finite() && *k > 0.0) {
                return Err(ConfigError::invalid(
                    "gains.rate_gain",
                    format!("axis {} gain must be positive, got {}", i, k),
                ));
            }
        }
        positive("gains.angle_gain", g.angle_gain)?;
        positive("gains.rate_deadband", g.rate_deadband)?;
        positive("gains.angle_deadband", g.angle_deadband)?;
        positive("gains.max_rate", g.max_rate)?;

        let s = &self.schedule;
        positive("schedule.idle_duration", s.idle_duration)?;
        positive("schedule.retro_arm_altitude", s.retro_arm_altitude)?;
        non_negative("schedule.retro_ignition_delay", s.retro_ignition_delay)?;
        positive("schedule.retro_phase_duration", s.retro_phase_duration)?;
        if s.retro_phase_duration <= s.retro_ignition_delay {
            return Err(ConfigError::invalid(
                "schedule.retro_phase_duration",
                "must be longer than the ignition delay",
            ));
        }
        positive("schedule.terminal_engage_altitude", s.terminal_engage_altitude)?;
        positive("schedule.shutdown_altitude", s.shutdown_altitude)?;

        let v = &self.vernier;
        positive("vernier.rated_thrust", v.rated_thrust)?;
        positive("vernier.moment_arm", v.moment_arm)?;
        positive("vernier.max_deflection", v.max_deflection)?;
        if v.max_deflection >= std::f64::consts::FRAC_PI_2 {
            return Err(ConfigError::invalid("vernier.max_deflection", "must be below 90°"));
        }
        // vernier 1 must keep some thrust while correcting, it is the roll actuator
        positive("vernier.thrust1_min", v.thrust1_min)?;
        if !(v.thrust1_min < v.thrust1_max && v.thrust1_max <= 1.0) {
            return Err(ConfigError::invalid(
                "vernier.thrust1_max",
                format!("need thrust1_min < thrust1_max <= 1, got {}..{}", v.thrust1_min, v.thrust1_max),
            ));
        }

        let t = &self.terminal;
        positive("terminal.slow_gate_altitude", t.slow_gate_altitude)?;
        non_negative("terminal.slow_speed", t.slow_speed)?;
        non_negative("terminal.fast_speed", t.fast_speed)?;

        positive("gravity", self.gravity)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must not be negative, got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surveyor_profile_is_valid() {
        let c = AutopilotConfig::surveyor();
        assert!(c.validate().is_ok());
        assert_eq!(c.gravity, 1.62);
        assert_eq!(c.vernier.rated_thrust, 463.0);
    }

    #[test]
    fn rejects_zero_gravity() {
        let c = AutopilotConfig { gravity: 0.0, ..AutopilotConfig::surveyor() };
        let err = c.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "gravity", .. }));
    }

    #[test]
    fn rejects_zero_vernier_thrust() {
        let mut c = AutopilotConfig::surveyor();
        c.vernier.rated_thrust = 0.0;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("vernier.rated_thrust"));
    }

    #[test]
    fn rejects_inverted_thrust1_band() {
        let mut c = AutopilotConfig::surveyor();
        c.vernier.thrust1_min = 0.9;
        c.vernier.thrust1_max = 0.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_negative_rate_gain() {
        let mut c = AutopilotConfig::surveyor();
        c.gains.rate_gain.y = -1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "terminal": { "slow_gate_altitude": 152.4 } }"#;
        let c = AutopilotConfig::from_json_str(json).unwrap();
        assert_eq!(c.terminal.slow_gate_altitude, 152.4);
        assert_eq!(c.terminal.fast_speed, 50.0);
        assert_eq!(c.schedule.idle_duration, 10.0);
    }

    #[test]
    fn json_file_round_trip() {
        let mut c = AutopilotConfig::surveyor();
        c.gains.angle_gain = 0.3;
        let path = std::env::temp_dir().join(format!("surveyor-profile-{}.json", std::process::id()));
        std::fs::write(&path, c.to_json_string().unwrap()).unwrap();
        let loaded = AutopilotConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, c);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AutopilotConfig::from_json_file("/nonexistent/profile.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.json"));
    }

    #[test]
    fn vernier_positions_are_symmetric() {
        let v = VernierGeometry::default();
        let p = v.positions();
        let sum = p[0] + p[1] + p[2];
        assert!(sum.x.abs() < 1e-12 && sum.y.abs() < 1e-12);
        for r in &p {
            assert!((r.xy().norm() - v.moment_arm).abs() < 1e-12);
        }
    }
}
