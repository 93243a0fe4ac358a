use tracing::{debug, info};

use crate::config::LUNAR_G;
use crate::error::ConfigError;
use crate::gnc::frame::retrograde_angle;
use crate::gnc::{Autopilot, AutopilotPhase, Controller};
use crate::vehicle::{presets, LanderConfig, StackStatus, VehicleAdapter};
use super::event::{default_detectors, EventDetector, EventKind, SimEvent};
use super::vessel::SimLander;

// ---------------------------------------------------------------------------
// Scenario: where the descent starts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub altitude: f64,          // m above the terrain
    pub speed: f64,             // m/s, straight down
    pub horizontal_speed: f64,  // m/s along local x
    pub attitude_offset: f64,   // rad, roll axis tilt from retrograde at release
    pub surface_elevation: f64, // m, terrain height above the reference surface
    pub gravity: f64,           // m/s^2
    pub dt: f64,                // s, control and integration step
    pub max_time: f64,          // s
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            altitude: 140_000.0,
            speed: 2_400.0,
            horizontal_speed: 0.0,
            attitude_offset: 0.05,
            surface_elevation: 0.0,
            gravity: LUNAR_G,
            dt: 0.05,
            max_time: 1_200.0,
        }
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("scenario.altitude", self.altitude),
            ("scenario.dt", self.dt),
            ("scenario.max_time", self.max_time),
            ("scenario.gravity", self.gravity),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, format!("must be positive, got {}", value)));
            }
        }
        if !self.speed.is_finite() || !self.horizontal_speed.is_finite() || !self.attitude_offset.is_finite() {
            return Err(ConfigError::invalid("scenario", "initial velocity and attitude must be finite"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-tick telemetry
// ---------------------------------------------------------------------------

/// One control tick: the vehicle as the controller saw it and the actuator
/// settings in force for the following step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryRow {
    pub time: f64,
    pub phase: Option<AutopilotPhase>,
    pub altitude: f64,        // m, radar
    pub speed: f64,           // m/s
    pub vertical_speed: f64,  // m/s, positive up
    pub angle_error: f64,     // rad, roll axis from retrograde
    pub body_rate: [f64; 3],  // rad/s, autopilot convention
    pub vernier: [f64; 3],
    pub deflection: f64,      // rad
    pub retro: f64,
    pub target_throttle: Option<f64>,
    pub mass: f64,
    pub retro_prop: f64,
    pub vernier_prop: f64,
    pub stack: StackStatus,
}

impl TelemetryRow {
    fn capture(vessel: &SimLander, controller: &dyn Controller) -> Self {
        let snapshot = vessel.state();
        let w = snapshot.angular_velocity;
        Self {
            time: vessel.state.time,
            phase: controller.phase(),
            altitude: snapshot.radar_altitude(),
            speed: snapshot.speed(),
            vertical_speed: vessel.state.vel.z,
            angle_error: retrograde_angle(&snapshot.surface_velocity).unwrap_or(0.0),
            body_rate: [w.x, w.y, w.z],
            vernier: vessel.vernier_levels(),
            deflection: vessel.thrusters.vernier.deflection,
            retro: vessel.retro_level(),
            target_throttle: controller.target_throttle(),
            mass: snapshot.mass,
            retro_prop: vessel.state.retro_prop,
            vernier_prop: vessel.state.vernier_prop,
            stack: vessel.stack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touchdown {
    pub time: f64,
    pub speed: f64,
    pub vertical_speed: f64,
    pub horizontal_speed: f64,
}

/// Everything recorded during one run.
#[derive(Debug, Clone, Default)]
pub struct FlightLog {
    pub controller: String,
    pub rows: Vec<TelemetryRow>,
    pub events: Vec<SimEvent>,
    pub touchdown: Option<Touchdown>,
}

impl FlightLog {
    /// Time at which the controller entered `phase`.
    pub fn phase_entry(&self, phase: AutopilotPhase) -> Option<&SimEvent> {
        self.events
            .iter()
            .find(|e| matches!(e.kind, EventKind::PhaseChange { to, .. } if to == phase))
    }

    /// Phases in the order they were flown, starting with the initial one.
    pub fn phase_sequence(&self) -> Vec<AutopilotPhase> {
        let mut seq: Vec<AutopilotPhase> = self.rows.first().and_then(|r| r.phase).into_iter().collect();
        seq.extend(self.events.iter().filter_map(|e| match e.kind {
            EventKind::PhaseChange { to, .. } => Some(to),
            _ => None,
        }));
        seq
    }

    pub fn final_phase(&self) -> Option<AutopilotPhase> {
        self.rows.last().and_then(|r| r.phase)
    }
}

// ---------------------------------------------------------------------------
// Closed-loop descent
// ---------------------------------------------------------------------------

/// Fly `lander` from `scenario` with any controller until ground contact or
/// `max_time`.
///
/// Each tick: the controller sees the vehicle, its command is written to the
/// actuators, the row is logged, then the dynamics advance one step.
///
/// The scenario and lander are validated first; a zero or negative `dt` would
/// never reach `max_time`.
pub fn simulate_with(
    lander: &LanderConfig,
    scenario: &Scenario,
    controller: &mut dyn Controller,
) -> Result<FlightLog, ConfigError> {
    scenario.validate()?;
    lander.validate()?;
    let dt = scenario.dt;
    let mut vessel = SimLander::new(lander.clone(), scenario);
    let mut detectors = default_detectors();

    let capacity = ((scenario.max_time / dt) as usize + 1).min(200_000);
    let mut log = FlightLog {
        controller: controller.name().to_string(),
        rows: Vec::with_capacity(capacity),
        ..FlightLog::default()
    };

    info!(controller = %log.controller, lander = %lander.name, altitude = scenario.altitude, "descent started");

    while vessel.state.time < scenario.max_time {
        let snapshot = vessel.state();
        let cmd = controller.control(&snapshot, dt);
        vessel.apply(&cmd);

        let row = TelemetryRow::capture(&vessel, &*controller);
        debug!(
            phase = ?row.phase,
            altitude = row.altitude,
            speed = row.speed,
            vernier = ?row.vernier,
            retro = row.retro,
            "tick"
        );
        record(&mut log, &mut detectors, row);

        vessel.advance(dt);

        if vessel.radar_altitude() <= 0.0 {
            let vel = vessel.state.vel;
            let speed = vessel.touch_down();
            let touchdown = Touchdown {
                time: vessel.state.time,
                speed,
                vertical_speed: vel.z,
                horizontal_speed: vel.x.hypot(vel.y),
            };
            let row = TelemetryRow::capture(&vessel, &*controller);
            record(&mut log, &mut detectors, row);
            log.events.push(SimEvent { time: touchdown.time, altitude: 0.0, kind: EventKind::Touchdown { speed } });
            info!(time = touchdown.time, speed, "touchdown");
            log.touchdown = Some(touchdown);
            break;
        }
    }

    Ok(log)
}

fn record(log: &mut FlightLog, detectors: &mut [Box<dyn EventDetector>], row: TelemetryRow) {
    if let Some(prev) = log.rows.last() {
        for det in detectors.iter_mut() {
            if let Some(kind) = det.check(prev, &row) {
                info!(time = row.time, altitude = row.altitude, "{}", kind);
                log.events.push(SimEvent { time: row.time, altitude: row.altitude, kind });
            }
        }
    }
    log.rows.push(row);
}

/// Fly the Surveyor preset with the default autopilot (convenience wrapper).
pub fn simulate(scenario: &Scenario) -> Result<FlightLog, ConfigError> {
    let mut autopilot = Autopilot::default();
    simulate_with(&presets::surveyor(), scenario, &mut autopilot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
