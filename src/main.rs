use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use surveyor_descent::config::AutopilotConfig;
use surveyor_descent::gnc::Autopilot;
use surveyor_descent::io::{self, FlightSummary};
use surveyor_descent::sim::{self, EventKind, FlightLog, Scenario};
use surveyor_descent::vehicle::{presets, LanderConfig};

#[derive(Parser)]
#[command(name = "surveyor-descent")]
#[command(about = "Closed-loop lunar descent with the Surveyor autopilot")]
#[command(version)]
struct Cli {
    /// Initial height above the terrain, m
    #[arg(long, default_value_t = 140_000.0)]
    altitude: f64,

    /// Initial descent speed, m/s
    #[arg(long, default_value_t = 2_400.0)]
    speed: f64,

    /// Initial roll axis tilt from retrograde, rad
    #[arg(long, default_value_t = 0.05)]
    attitude_offset: f64,

    /// Control and integration step, s
    #[arg(long, default_value_t = 0.05)]
    dt: f64,

    /// Stop the run after this long, s
    #[arg(long, default_value_t = 1_200.0)]
    max_time: f64,

    /// Descent profile JSON (missing fields take the Surveyor defaults)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Write per-tick telemetry here
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the flight summary here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print the default descent profile as JSON and exit
    #[arg(long)]
    dump_profile: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.dump_profile {
        println!("{}", AutopilotConfig::default().to_json_string()?);
        return Ok(());
    }

    let config = match &cli.profile {
        Some(path) => AutopilotConfig::from_json_file(path)
            .with_context(|| format!("loading descent profile {}", path.display()))?,
        None => AutopilotConfig::default(),
    };
    let mut autopilot = Autopilot::new(config).context("descent profile rejected")?;

    let scenario = Scenario {
        altitude: cli.altitude,
        speed: cli.speed,
        attitude_offset: cli.attitude_offset,
        dt: cli.dt,
        max_time: cli.max_time,
        ..Scenario::default()
    };

    // the lander flies the same vernier geometry the autopilot assumes
    let mut lander = presets::surveyor();
    lander.vernier = autopilot.config().vernier.clone();

    let log = sim::simulate_with(&lander, &scenario, &mut autopilot).context("invalid scenario")?;
    let summary = FlightSummary::from_log(&log, &lander);

    if let Some(path) = &cli.csv {
        io::write_telemetry_file(path, &log.rows)
            .with_context(|| format!("writing telemetry to {}", path.display()))?;
    }
    if let Some(path) = &cli.json {
        io::write_summary_file(path, &summary)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }

    print_report(&lander, &scenario, &log, &summary);
    Ok(())
}

fn print_report(lander: &LanderConfig, scenario: &Scenario, log: &FlightLog, summary: &FlightSummary) {
    println!();
    println!("====================================================================");
    println!("  LUNAR DESCENT SIMULATION: {} / {}", lander.name, log.controller);
    println!("====================================================================");
    println!();
    println!("  Vehicle");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Total mass:    {:>8.2} kg    Retro prop:   {:>8.2} kg",
        lander.total_mass(),
        lander.retro_prop_mass
    );
    println!(
        "  Retro thrust:  {:>8.0} N     Retro dv:     {:>8.0} m/s",
        lander.retro_thrust,
        lander.retro_delta_v()
    );
    println!(
        "  Verniers:      {:>8.0} N x3  Vernier prop: {:>8.2} kg",
        lander.vernier.rated_thrust, lander.vernier_prop_mass
    );
    println!(
        "  Start:         {:>8.1} km    {:>6.0} m/s down, {:.3} rad off retrograde",
        scenario.altitude / 1000.0,
        scenario.speed,
        scenario.attitude_offset
    );
    println!();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for e in &log.events {
        let tag = match e.kind {
            EventKind::PhaseChange { .. } => "PHASE",
            EventKind::RetroIgnition | EventKind::RetroBurnout => "RETRO",
            EventKind::Jettison(_) => "STAGE",
            EventKind::Touchdown { .. } => "LANDED",
        };
        println!("  {:<7} t={:>7.2}s   alt={:>10.1}m   {}", tag, e.time, e.altitude, e.kind);
    }
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    match log.touchdown {
        Some(td) => {
            println!("  Touchdown:     {:>8.2} s     speed {:.2} m/s", td.time, td.speed);
            println!(
                "                               vertical {:.2} m/s, horizontal {:.2} m/s",
                td.vertical_speed, td.horizontal_speed
            );
        }
        None => println!("  No touchdown within {:.0} s", scenario.max_time),
    }
    println!(
        "  Vernier prop:  {:>8.2} kg used, {:.2} kg left",
        summary.vernier_prop_used_kg, summary.vernier_prop_left_kg
    );
    println!(
        "  Pointing:      {:>8.3} deg max error after retro ignition",
        summary.max_angle_error_after_ignition_deg
    );
    if let Some(stack) = summary.final_stack {
        println!("  Final stack:   {:?}", stack);
    }
    println!();

    println!("  Telemetry (sampled)");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>10}  {:>8}  {:>6}  {:>6}  {:>6}  {:>5}  {}",
        "t (s)", "alt (m)", "v (m/s)", "V1", "V2", "V3", "retro", "phase"
    );
    let every = (20.0 / scenario.dt).round().max(1.0) as usize;
    let n = log.rows.len();
    for (i, r) in log.rows.iter().enumerate() {
        if i % every != 0 && i + 1 != n {
            continue;
        }
        println!(
            "  {:>7.2}  {:>10.1}  {:>8.2}  {:>6.3}  {:>6.3}  {:>6.3}  {:>5.1}  {}",
            r.time,
            r.altitude,
            r.speed,
            r.vernier[0],
            r.vernier[1],
            r.vernier[2],
            r.retro,
            r.phase.map(|p| p.label()).unwrap_or("-"),
        );
    }

    println!();
    println!("  Simulation: {} ticks, dt={} s", log.rows.len(), scenario.dt);
    println!("====================================================================");
    println!();
}
