use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tablelens::config::{self, AppSettings, ConnectionSettings};
use tablelens::dashboard::Dashboard;
use tablelens::fetcher::{RestSource, TableFetcher};
use tablelens::{render, shell};

#[derive(Parser)]
#[command(
    name = "tablelens",
    version,
    about = "Descriptive statistics and duplicate detection for remote tables"
)]
pub struct Cli {
    /// Path to a JSON settings file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "TABLELENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (`RUST_LOG` still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse one table and print the report
    Analyze {
        /// Table to analyse. Defaults to the configured default table.
        table: Option<String>,

        /// Also look for rows duplicated on these columns (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        subset: Vec<String>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive session (the default)
    Shell,
    /// Print the effective settings
    Settings {
        /// Write them to the settings file
        #[arg(long)]
        save: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = config::load_settings(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Analyze {
            table,
            subset,
            json,
        } => {
            let dashboard = connect(settings)?;
            let table = table.unwrap_or_else(|| dashboard.settings().default_table.clone());
            handle_analyze(&dashboard, &table, &subset, json)
        }
        Commands::Shell => {
            let dashboard = connect(settings)?;
            let stdin = std::io::stdin();
            shell::run(&dashboard, stdin.lock(), std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Settings { save } => handle_settings(&settings, cli.config, save),
    }
}

fn connect(settings: AppSettings) -> Result<Dashboard> {
    let connection = ConnectionSettings::from_env()?;
    let source = RestSource::connect(
        &connection,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    tracing::info!("Connected to {}", connection.url);
    Ok(Dashboard::new(TableFetcher::new(source), settings))
}

fn handle_analyze(dashboard: &Dashboard, table: &str, subset: &[String], json: bool) -> Result<()> {
    let subset: Vec<String> = subset
        .iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect();
    let view = dashboard.view(table, Some(&subset))?;

    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &view).context("Failed to write JSON report")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render::view_to_text(&view))?;
    }
    Ok(())
}

fn handle_settings(settings: &AppSettings, path: Option<PathBuf>, save: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, settings)?;
    writeln!(out)?;

    if save {
        let path = path
            .or_else(config::default_settings_path)
            .context("No settings path given and no config directory found")?;
        config::save_settings(settings, &path)?;
        writeln!(out, "Saved settings to {}", path.display())?;
    }
    Ok(())
}
