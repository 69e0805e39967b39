// src/main.rs
use std::path::PathBuf;
use std::process::exit;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};

use pagewatch::config::DispatchMode;
use pagewatch::{App, Config, Shutdown};

#[derive(Parser)]
#[command(name = "pagewatch")]
#[command(about = "Watches web pages and emails what changed")]
struct Args {
    #[command(subcommand)]
    command: Option<Cli>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cli {
    /// Watch the configured pages until interrupted
    Run {
        #[arg(long, help = "Log notifications instead of mailing them")]
        dry_run: bool,

        #[arg(long, help = "Poll in lock-step and send one notification per cycle")]
        batched: bool,
    },

    /// Fetch every page once and show what the selector extracts
    Check {
        #[arg(long, help = "Print the results as JSON")]
        json: bool,
    },

    /// Write a sample configuration file
    Init {
        #[arg(short, long, help = "Force overwrite existing configuration")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let command = match args.command {
        Some(command) => command,
        None => {
            println!("No command specified. Use --help for available commands.");
            return Ok(());
        }
    };

    if let Cli::Init { force } = command {
        match Config::init(args.config.as_deref(), force) {
            Ok(path) => println!("Configuration initialized at {}", path.display()),
            Err(e) => {
                error!("Failed to initialize configuration: {}", e);
                exit(1);
            }
        }
        return Ok(());
    }

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            exit(1);
        }
    };

    match command {
        Cli::Run { dry_run, batched } => {
            if batched {
                config.dispatch = DispatchMode::Batched;
            }
            let app = App::new(config);
            let shutdown = Shutdown::new();

            {
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        shutdown.trigger("interrupted");
                    }
                });
            }

            match app.run(dry_run, shutdown).await {
                Ok(summary) => info!(
                    "Stopped: {} changes, {} notifications sent",
                    summary.changes, summary.notifications_sent
                ),
                Err(e) => {
                    error!("{}", e);
                    exit(1);
                }
            }
        }
        Cli::Check { json } => {
            let app = App::new(config);
            let reports = match app.check().await {
                Ok(reports) => reports,
                Err(e) => {
                    error!("Check failed: {}", e);
                    exit(1);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    match (&report.bytes, &report.error) {
                        (Some(bytes), _) => println!("OK    {} ({}) {} bytes", report.address, report.selector, bytes),
                        (None, Some(error)) => println!("FAIL  {} ({}) {}", report.address, report.selector, error),
                        (None, None) => println!("?     {} ({})", report.address, report.selector),
                    }
                }
            }

            if reports.iter().any(|r| r.error.is_some()) {
                exit(1);
            }
        }
        Cli::Init { .. } => unreachable!("handled before loading the configuration"),
    }

    Ok(())
}
