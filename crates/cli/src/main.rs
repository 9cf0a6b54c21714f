//! Insticator adapter CLI.
//!
//! Drives the bid and analytics adapters offline from JSON fixtures:
//! - Building the OpenRTB request for an auction
//! - Interpreting a bidder response against that request
//! - Collecting user syncs and applying the win hook
//! - Validating configuration files
//! - Replaying analytics events against the collector

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use insticator_common::bidding::SyncOptions;

mod analytics;
mod bidder;
mod config;
mod error;
mod fixtures;
mod transport;

use error::CliError;

#[derive(Parser)]
#[command(name = "insticator")]
#[command(about = "Insticator bid and analytics adapter harness")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file (defaults to the embedded settings)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bid requests for an auction fixture
    Request {
        /// Bidder request JSON (auction context plus ad slots)
        #[arg(long, short)]
        auction: PathBuf,

        /// Page environment JSON; updated with the stored user id
        #[arg(long, short)]
        environment: Option<PathBuf>,
    },

    /// Interpret a bidder response
    Interpret {
        /// Request JSON as printed by `request`
        #[arg(long)]
        request: PathBuf,

        /// Response body JSON
        #[arg(long)]
        response: PathBuf,

        /// Which request to use when the file holds several
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Collect user syncs from bidder responses
    Syncs {
        /// Response body JSON files
        #[arg(required = true)]
        responses: Vec<PathBuf>,

        /// Allow iframe syncs
        #[arg(long)]
        iframe: bool,

        /// Allow pixel syncs
        #[arg(long)]
        pixel: bool,
    },

    /// Apply the win hook to a winning bid
    Won {
        /// Winning bid JSON
        #[arg(long, short)]
        bid: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Analytics tools
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config against settings validation
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AnalyticsAction {
    /// Replay recorded auction events to the collector
    Replay {
        /// JSON array of `{eventType, args}` events
        #[arg(long)]
        events: PathBuf,

        /// Page environment JSON
        #[arg(long, short)]
        environment: Option<PathBuf>,

        /// Dry run - print the requests instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();

    if let Err(e) = result {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let verbose = cli.verbose;
    let config_file = cli.config;
    let settings = || config::load_settings(config_file.as_deref(), verbose);

    match cli.command {
        Commands::Request {
            auction,
            environment,
        } => bidder::run_request(&settings()?, &auction, environment),
        Commands::Interpret {
            request,
            response,
            index,
        } => bidder::run_interpret(&settings()?, &request, &response, index),
        Commands::Syncs {
            responses,
            iframe,
            pixel,
        } => bidder::run_syncs(
            &settings()?,
            &responses,
            SyncOptions {
                iframe_enabled: iframe,
                pixel_enabled: pixel,
            },
        ),
        Commands::Won { bid } => bidder::run_won(&settings()?, &bid),
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(file, verbose),
        },
        Commands::Analytics { action } => match action {
            AnalyticsAction::Replay {
                events,
                environment,
                dry_run,
            } => analytics::replay(&settings()?, &events, environment, dry_run),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analytics_replay() {
        let cli = Cli::try_parse_from([
            "insticator",
            "analytics",
            "replay",
            "--events",
            "events.json",
            "--dry-run",
        ])
        .expect("should parse replay command");

        assert!(matches!(
            cli.command,
            Commands::Analytics {
                action: AnalyticsAction::Replay { dry_run: true, .. }
            }
        ));
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "insticator",
            "request",
            "--auction",
            "auction.json",
            "--config",
            "insticator.toml",
        ])
        .expect("should parse request command");

        assert_eq!(cli.config, Some(PathBuf::from("insticator.toml")));
    }
}
