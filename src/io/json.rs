use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::gnc::AutopilotPhase;
use crate::sim::{EventKind, FlightLog};
use crate::vehicle::{LanderConfig, StackStatus};

/// When and where the controller entered a phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseEntry {
    pub phase: String,
    pub time_s: f64,
    pub altitude_m: f64,
}

/// Summary statistics computed from a flight log.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub lander: String,
    pub controller: String,
    pub landed: bool,
    pub touchdown_time_s: Option<f64>,
    pub touchdown_speed_ms: Option<f64>,
    pub touchdown_vertical_speed_ms: Option<f64>,
    pub touchdown_horizontal_speed_ms: Option<f64>,
    pub flight_time_s: f64,
    /// Lowest radar altitude before shutdown, or over the whole flight when
    /// the controller has no phases.
    pub min_controlled_altitude_m: f64,
    pub phases: Vec<PhaseEntry>,
    pub retro_ignition_time_s: Option<f64>,
    pub retro_burnout_time_s: Option<f64>,
    pub retro_prop_used_kg: f64,
    pub vernier_prop_used_kg: f64,
    pub vernier_prop_left_kg: f64,
    pub max_angle_error_after_ignition_deg: f64,
    /// Stack configuration on the last logged row.
    pub final_stack: Option<StackStatus>,
    pub events: usize,
}

impl FlightSummary {
    /// Compute summary from a flight log. An empty log gives zeros.
    pub fn from_log(log: &FlightLog, lander: &LanderConfig) -> Self {
        let first = log.rows.first();
        let last = log.rows.last();

        let mut phases: Vec<PhaseEntry> = first
            .and_then(|r| r.phase.map(|p| entry(p, r.time, r.altitude)))
            .into_iter()
            .collect();
        phases.extend(log.events.iter().filter_map(|e| match e.kind {
            EventKind::PhaseChange { to, .. } => Some(entry(to, e.time, e.altitude)),
            _ => None,
        }));

        let event_time = |kind: &EventKind| log.events.iter().find(|e| &e.kind == kind).map(|e| e.time);
        let ignition = event_time(&EventKind::RetroIgnition);
        let burnout = event_time(&EventKind::RetroBurnout);

        let controlled = |phase: Option<AutopilotPhase>| phase != Some(AutopilotPhase::Shutdown);
        let min_controlled_altitude = log
            .rows
            .iter()
            .filter(|r| controlled(r.phase))
            .map(|r| r.altitude)
            .fold(f64::INFINITY, f64::min);

        let max_angle_error = match ignition {
            Some(t0) => log
                .rows
                .iter()
                .filter(|r| r.time >= t0 && controlled(r.phase))
                .map(|r| r.angle_error)
                .fold(0.0_f64, f64::max),
            None => 0.0,
        };

        let (retro_used, vernier_used, vernier_left) = match (first, last) {
            (Some(a), Some(b)) => {
                // the retro propellant is zeroed with the case, so count from the load
                let retro_left = if b.stack.has_retro() { b.retro_prop } else { 0.0 };
                (a.retro_prop - retro_left, a.vernier_prop - b.vernier_prop, b.vernier_prop)
            }
            _ => (0.0, 0.0, lander.vernier_prop_mass),
        };

        FlightSummary {
            lander: lander.name.clone(),
            controller: log.controller.clone(),
            landed: log.touchdown.is_some(),
            touchdown_time_s: log.touchdown.map(|t| t.time),
            touchdown_speed_ms: log.touchdown.map(|t| t.speed),
            touchdown_vertical_speed_ms: log.touchdown.map(|t| t.vertical_speed),
            touchdown_horizontal_speed_ms: log.touchdown.map(|t| t.horizontal_speed),
            flight_time_s: last.map(|r| r.time).unwrap_or(0.0),
            min_controlled_altitude_m: if min_controlled_altitude.is_finite() { min_controlled_altitude } else { 0.0 },
            phases,
            retro_ignition_time_s: ignition,
            retro_burnout_time_s: burnout,
            retro_prop_used_kg: retro_used,
            vernier_prop_used_kg: vernier_used,
            vernier_prop_left_kg: vernier_left,
            max_angle_error_after_ignition_deg: max_angle_error.to_degrees(),
            final_stack: last.map(|r| r.stack),
            events: log.events.len(),
        }
    }
}

fn entry(phase: AutopilotPhase, time_s: f64, altitude_m: f64) -> PhaseEntry {
    PhaseEntry { phase: phase.label().to_string(), time_s, altitude_m }
}

/// Write flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_summary(&mut file, summary)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimEvent, TelemetryRow, Touchdown};
    use crate::vehicle::presets;

    fn short_log() -> FlightLog {
        let row = |time: f64, phase, altitude, retro_prop, vernier_prop, stack, angle_error| TelemetryRow {
            time,
            phase: Some(phase),
            altitude,
            retro_prop,
            vernier_prop,
            stack,
            angle_error,
            ..TelemetryRow::default()
        };
        FlightLog {
            controller: "SurveyorAutopilot".into(),
            rows: vec![
                row(0.0, AutopilotPhase::Idle, 1000.0, 560.64, 70.98, StackStatus::Full, 0.05),
                row(10.0, AutopilotPhase::RetroDescent, 800.0, 300.0, 70.0, StackStatus::AmrJettisoned, 0.02),
                row(20.0, AutopilotPhase::FinalDescent, 3.9, 0.0, 50.0, StackStatus::RetroJettisoned, 0.01),
                row(21.0, AutopilotPhase::Shutdown, 0.0, 0.0, 50.0, StackStatus::RetroJettisoned, 0.3),
            ],
            events: vec![
                SimEvent {
                    time: 10.0,
                    altitude: 800.0,
                    kind: EventKind::PhaseChange { from: AutopilotPhase::Idle, to: AutopilotPhase::RetroDescent },
                },
                SimEvent { time: 10.0, altitude: 800.0, kind: EventKind::RetroIgnition },
                SimEvent { time: 21.0, altitude: 0.0, kind: EventKind::Touchdown { speed: 3.5 } },
            ],
            touchdown: Some(Touchdown { time: 21.0, speed: 3.5, vertical_speed: -3.5, horizontal_speed: 0.0 }),
        }
    }

    #[test]
    fn summary_collects_phases_and_propellant() {
        let s = FlightSummary::from_log(&short_log(), &presets::surveyor());
        assert!(s.landed);
        assert_eq!(s.touchdown_speed_ms, Some(3.5));
        assert_eq!(s.phases.len(), 2);
        assert_eq!(s.phases[0].phase, "Idle");
        assert_eq!(s.phases[1].phase, "Initial descent");
        assert!((s.retro_prop_used_kg - 560.64).abs() < 1e-9);
        assert!((s.vernier_prop_used_kg - 20.98).abs() < 1e-9);
        assert!((s.min_controlled_altitude_m - 3.9).abs() < 1e-9);
        // the 0.3 rad row is after shutdown and does not count
        assert!((s.max_angle_error_after_ignition_deg - 0.02_f64.to_degrees()).abs() < 1e-9);
        assert_eq!(s.retro_burnout_time_s, None);
        assert_eq!(s.final_stack, Some(StackStatus::RetroJettisoned));
    }

    #[test]
    fn json_output_is_valid() {
        let summary = FlightSummary::from_log(&short_log(), &presets::surveyor());
        let mut buf = Vec::new();
        write_summary(&mut buf, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["lander"], "Surveyor");
        assert_eq!(value["touchdown_speed_ms"], 3.5);
        assert_eq!(value["phases"][1]["phase"], "Initial descent");
        assert_eq!(value["final_stack"], "RetroJettisoned");
    }

    #[test]
    fn empty_log_summarises_to_zeros() {
        let s = FlightSummary::from_log(&FlightLog::default(), &presets::surveyor());
        assert!(!s.landed);
        assert_eq!(s.flight_time_s, 0.0);
        assert!(s.phases.is_empty());
        assert_eq!(s.vernier_prop_left_kg, 70.98);
        assert_eq!(s.final_stack, None);
    }
}
