use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use surveyor_descent::sim::{self, FlightLog, Scenario, TelemetryRow};

fn main() -> eframe::Result {
    let scenario = Scenario::default();
    let log = match sim::simulate(&scenario) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("invalid scenario: {err}");
            std::process::exit(2);
        }
    };

    let app = DescentViz { log };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Surveyor Descent", options, Box::new(|_| Ok(Box::new(app))))
}

struct DescentViz {
    log: FlightLog,
}

/// One labelled plot against flight time.
fn time_plot(ui: &mut egui::Ui, title: &str, size: [f32; 2], lines: Vec<(String, PlotPoints<'static>)>) {
    ui.vertical(|ui| {
        ui.label(title);
        Plot::new(title)
            .width(size[0])
            .height(size[1])
            .x_axis_label("Time (s)")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (name, points) in lines {
                    plot_ui.line(Line::new(name, points));
                }
            });
    });
}

fn series(rows: &[&TelemetryRow], f: impl Fn(&TelemetryRow) -> f64) -> PlotPoints<'static> {
    rows.iter().map(|r| [r.time, f(r)]).collect()
}

impl eframe::App for DescentViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let step = (self.log.rows.len() / 2000).max(1);
        let sampled: Vec<&TelemetryRow> = self.log.rows.iter().step_by(step).collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Controller: {}", self.log.controller));
            let touchdown = match self.log.touchdown {
                Some(td) => format!("Touchdown {:.2} m/s at {:.0} s", td.speed, td.time),
                None => "No touchdown".to_string(),
            };
            ui.label(format!(
                "{}  |  Events: {}  |  Final phase: {}",
                touchdown,
                self.log.events.len(),
                self.log.final_phase().map(|p| p.label()).unwrap_or("-"),
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let size = [available.x / 2.0 - 8.0, available.y / 2.0 - 8.0];

            ui.horizontal(|ui| {
                let altitude = series(&sampled, |r| r.altitude / 1000.0);
                time_plot(ui, "Radar altitude (km)", size, vec![("Altitude".into(), altitude)]);
                let speed = series(&sampled, |r| r.speed);
                time_plot(ui, "Speed (m/s)", size, vec![("Speed".into(), speed)]);
            });

            ui.horizontal(|ui| {
                let levels = (0..3)
                    .map(|i| (format!("Vernier {}", i + 1), series(&sampled, |r| r.vernier[i])))
                    .collect();
                time_plot(ui, "Vernier throttle", size, levels);
                let deflection = series(&sampled, |r| r.deflection.to_degrees());
                time_plot(ui, "Vernier 1 deflection (deg)", size, vec![("Deflection".into(), deflection)]);
            });
        });
    }
}
