pub mod report;
pub mod rules;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report::{process_report_command, ReportCommand};
use rules::process_rules_command;
use tracing::level_filters::LevelFilter;

use crate::{
    config::{Settings, ValidatedSettings, SETTINGS_FILE_NAME},
    utils::{dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "DayLog", version, long_about = None)]
#[command(about = "Turns a day of collected activity into a categorized report", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Build the report of a single day")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Validate the settings and print the effective category rules")]
    Rules {
        #[arg(
            long,
            help = "Settings file. By default uses settings.json in the application directory"
        )]
        config: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Report { command } => process_report_command(command, &app_dir).await,
        Commands::Rules { config } => process_rules_command(config, &app_dir),
    }
}

/// Loads and validates settings. An explicit path has to exist, the default one is created on
/// first use.
pub fn load_settings(config: Option<PathBuf>, app_dir: &Path) -> Result<ValidatedSettings> {
    let settings = match config {
        Some(path) => Settings::load(&path),
        None => Settings::load_or_create(&app_dir.join(SETTINGS_FILE_NAME)),
    }
    .context("Failed to load settings")?;
    settings.validate().context("Invalid settings")
}
