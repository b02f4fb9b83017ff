//! dashboard-api: backend for the interactive analytics dashboard
//!
//! Serves chart data, exports and backups over HTTP, and exposes the same
//! operations from the command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dashboard_api::backup::BackupOptions;
use dashboard_api::config::Config;

mod commands;

#[derive(Parser)]
#[command(name = "dashboard-api")]
#[command(about = "Interactive dashboard backend: API server, exports and backups", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the database and backups (overrides DASHBOARD_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Interface to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Export a dataset to a file
    Export {
        /// Output format: excel, csv, json or pdf
        #[arg(long, short, default_value = "excel")]
        format: String,

        /// Dataset: sales, analytics, performance, users or daily-stats
        #[arg(long, short = 't', default_value = "sales")]
        data_type: String,

        /// Period: week, month or year
        #[arg(long, short, default_value = "week")]
        period: String,

        /// Series to summarize (defaults to the first series)
        #[arg(long, short)]
        metric: Option<String>,

        /// Leave out summary statistics
        #[arg(long)]
        no_summary: bool,

        /// Output file or directory (defaults to the generated filename)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Create, list or inspect backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show the effective dashboard settings
    Settings,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Create a backup archive
    Create {
        /// Backup type recorded with the archive
        #[arg(long = "type", default_value = "manual")]
        backup_type: String,

        /// Include every dashboard dataset
        #[arg(long)]
        include_data: bool,
    },

    /// List recorded backups and exports
    List,

    /// Show the manifest of a backup archive
    Show {
        /// Backup archive (.tar.gz)
        backup_file: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            commands::serve::execute(config)?;
        }

        Commands::Export {
            format,
            data_type,
            period,
            metric,
            no_summary,
            output,
        } => {
            let options = commands::export::ExportOptions {
                format,
                data_type,
                period,
                metric,
                include_summary: !no_summary,
                output,
            };
            commands::export::execute(&config, &options)?;
        }

        Commands::Backup { action } => match action {
            BackupAction::Create {
                backup_type,
                include_data,
            } => {
                let options = BackupOptions::from_request(&dashboard_api::backup::BackupRequest {
                    backup_type: Some(backup_type),
                    include_data: Some(include_data),
                })?;
                commands::backup::create(&config, &options)?;
            }
            BackupAction::List => {
                println!("{}", commands::backup::list(&config)?);
            }
            BackupAction::Show { backup_file } => {
                println!("{}", commands::backup::show(&backup_file)?);
            }
        },

        Commands::Settings => {
            println!("{}", "Dashboard settings".bold());
            println!();
            println!("{}", commands::settings::execute(&config)?);
        }
    }

    Ok(())
}
