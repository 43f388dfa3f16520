//! CLI for floorwatch: OEE and production KPIs from factory-floor telemetry.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "floorwatch")]
#[command(about = "floorwatch: OEE and production KPIs from factory-floor telemetry")]
#[command(version = floorwatch_core::VERSION)]
struct Cli {
    /// Settings file (TOML). A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "floorwatch.toml")]
    config: PathBuf,

    /// Store directory holding machines.json and samples.jsonl (overrides [store].data_dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP KPI server
    Serve {
        /// Bind address (overrides [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides [server].port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// OEE, availability, performance and quality of one device over a window
    Oee {
        /// Device id the telemetry is keyed by
        device_id: String,

        /// Window start (RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD")
        start: String,

        /// Window end, inclusive
        end: String,

        /// Print the KPI record as JSON
        #[arg(long)]
        json: bool,

        /// Show every intermediate figure (buckets, weights, diameters)
        #[arg(long)]
        detail: bool,
    },

    /// Live status of one device
    Status {
        device_id: String,

        /// Evaluate as of this instant instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Machines of a company with live status, produced length and reel count
    Machines {
        company_id: String,

        /// Window start
        start: String,

        /// Window end, inclusive
        end: String,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Metadata of one machine
    Machine {
        /// Machine uid in the catalog
        machine_uid: String,
    },

    /// Append samples (JSON lines) to the store, optionally replacing the machine catalog
    Ingest {
        /// JSON-lines file of samples, or "-" for stdin
        samples: Option<String>,

        /// JSON array of machines to write as the catalog
        #[arg(long)]
        machines: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = commands::load_settings(&cli.config, cli.data_dir.as_deref());

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::run(settings, host.as_deref(), port)
        }
        Commands::Oee {
            device_id,
            start,
            end,
            json,
            detail,
        } => commands::oee::run(&settings, &device_id, &start, &end, json, detail),
        Commands::Status { device_id, at } => {
            commands::status::run(&settings, &device_id, at.as_deref())
        }
        Commands::Machines {
            company_id,
            start,
            end,
            json,
        } => commands::machines::run(&settings, &company_id, &start, &end, json),
        Commands::Machine { machine_uid } => commands::machine::run(&settings, &machine_uid),
        Commands::Ingest { samples, machines } => {
            commands::ingest::run(&settings, samples.as_deref(), machines.as_deref())
        }
    }
}
