use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "smart-parking", version, about = "Zone-based parking allocation with rollback")]
pub struct Cli {
    /// Facility configuration (JSON). The built-in 15 x 3 x 20 city is used when absent.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Overrides RUST_LOG (off, error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,

    #[command(subcommand)]
    pub command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Interactive operator menu (default).
    Console,

    /// Line protocol on stdin/stdout, one JSON response per command.
    Serve,

    /// Random traffic on a simulated clock.
    Simulate {
        #[arg(short, long, default_value_t = 200)]
        requests: usize,

        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Writes the request history of the run as CSV.
        #[arg(long)]
        history_csv: Option<String>,
    },
}

impl Cli {
    pub fn get_mode(&self) -> &Mode {
        self.command.as_ref().unwrap_or(&Mode::Console)
    }
}
