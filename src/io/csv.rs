use std::io::{self, Write};
use std::path::Path;

use crate::sim::TelemetryRow;

/// Write telemetry rows to CSV format.
///
/// Columns: time, phase, altitude, speed, vertical_speed, angle_error_deg,
///          rate_x, rate_y, rate_z, vernier_1, vernier_2, vernier_3,
///          deflection_deg, retro, target_throttle, mass, vernier_prop, stack
///
/// Rows flown without a sequencing controller leave `phase` empty, and ticks
/// where the attitude controller did not run leave `target_throttle` empty.
pub fn write_telemetry<W: Write>(writer: &mut W, rows: &[TelemetryRow]) -> io::Result<()> {
    writeln!(
        writer,
        "time,phase,altitude,speed,vertical_speed,angle_error_deg,\
         rate_x,rate_y,rate_z,vernier_1,vernier_2,vernier_3,\
         deflection_deg,retro,target_throttle,mass,vernier_prop,stack"
    )?;

    for r in rows {
        let phase = r.phase.map(|p| p.label()).unwrap_or("");
        let throttle = r.target_throttle.map(|t| format!("{:.4}", t)).unwrap_or_default();
        writeln!(
            writer,
            "{:.3},{},{:.2},{:.3},{:.3},{:.4},\
             {:.6},{:.6},{:.6},{:.4},{:.4},{:.4},\
             {:.3},{:.1},{},{:.3},{:.3},{:?}",
            r.time,
            phase,
            r.altitude,
            r.speed,
            r.vertical_speed,
            r.angle_error.to_degrees(),
            r.body_rate[0], r.body_rate[1], r.body_rate[2],
            r.vernier[0], r.vernier[1], r.vernier[2],
            r.deflection.to_degrees(),
            r.retro,
            throttle,
            r.mass,
            r.vernier_prop,
            r.stack,
        )?;
    }

    Ok(())
}

/// Write telemetry to a CSV file at the given path.
pub fn write_telemetry_file(path: impl AsRef<Path>, rows: &[TelemetryRow]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_telemetry(&mut file, rows)?;
    file.flush()
}
