use std::fs::File;
use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use smart_parking::api::session::CommandSession;
use smart_parking::build_parking_system;
use smart_parking::cli::args::{Cli, Mode};
use smart_parking::cli::console::Console;
use smart_parking::domain::clock::SystemClock;
use smart_parking::domain::clock_mock::MockClock;
use smart_parking::domain::simulation::TrafficSimulation;
use smart_parking::logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    let config_path = cli.config.as_deref();

    match cli.get_mode() {
        Mode::Console => {
            let mut system = build_parking_system(config_path, Box::new(SystemClock))?;
            Console::new(io::stdin().lock(), io::stdout()).run(&mut system)?;
        }
        Mode::Serve => {
            let system = build_parking_system(config_path, Box::new(SystemClock))?;
            log::info!("Serving command protocol on stdin/stdout.");
            CommandSession::new(system).serve(io::stdin().lock(), io::stdout().lock())?;
        }
        Mode::Simulate { requests, seed, history_csv } => {
            let clock = MockClock::new(Utc::now().timestamp());
            let mut system = build_parking_system(config_path, Box::new(clock.clone()))?;

            let report = TrafficSimulation::new(*seed, *requests).run(&mut system, &clock);

            let summary = serde_json::json!({ "report": report, "zones": system.zone_status() });
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if let Some(path) = history_csv {
                let file = File::create(path).with_context(|| format!("Failed to create history file '{}'", path))?;
                system.write_history_csv(file)?;
                log::info!("Request history written to '{}'.", path);
            }
        }
    }

    Ok(())
}
