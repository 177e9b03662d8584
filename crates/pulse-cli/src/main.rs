use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Personal data sync jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward Garmin step buckets to Google Fit
    Steps {
        #[command(subcommand)]
        cmd: StepsCmd,
    },

    /// Copy Garmin activity names onto matching Strava activities
    Names {
        #[command(subcommand)]
        cmd: NamesCmd,
    },

    /// Business-cycle index change detection
    Index {
        #[command(subcommand)]
        cmd: IndexCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum StepsCmd {
    /// Walk days from the stored watermark and forward new buckets.
    Sync {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Start from this instant instead of the stored watermark
        /// (RFC 3339, or naive `YYYY-MM-DDTHH:MM:SS` read as UTC)
        ///
        /// The override is persisted only once the sync loop starts. If the run
        /// fails earlier (credentials, stream lookup), the stored watermark is
        /// left untouched and the override must be passed again.
        #[arg(long)]
        watermark: Option<String>,
    },
}

#[derive(Subcommand)]
enum NamesCmd {
    /// Rename target activities whose names differ from the source.
    Sync {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Plan and log renames without issuing them
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum IndexCmd {
    /// Compare the latest CSV row with the stored snapshot; notify on change.
    Check {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Downloaded index CSV
        #[arg(long)]
        csv: String,

        /// Append a markdown summary of the latest values to this file
        #[arg(long = "summary-out")]
        summary_out: Option<String>,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when absent;
    // scheduled runs inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Steps { cmd } => match cmd {
            StepsCmd::Sync {
                config_paths,
                watermark,
            } => commands::steps::steps_sync(config_paths, watermark),
        },

        Commands::Names { cmd } => match cmd {
            NamesCmd::Sync {
                config_paths,
                dry_run,
            } => commands::names::names_sync(config_paths, dry_run),
        },

        Commands::Index { cmd } => match cmd {
            IndexCmd::Check {
                config_paths,
                csv,
                summary_out,
            } => commands::index::index_check(config_paths, csv, summary_out),
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = pulse_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries only the `key=value` result lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
