pub mod cli;
pub mod core;

use crate::cli::OutputFormat;
use crate::cli::calculate::CalculateRequest;
use crate::core::AssumptionOverrides;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::debug;

pub enum AppCommand {
    /// Evaluate a scenario and display the dashboard
    Calculate(CalculateRequest),
    /// Display the resolved assumption set
    Assumptions {
        admin_key: Option<String>,
        overrides: AssumptionOverrides,
        format: OutputFormat,
    },
}

pub fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    let gate = config.admin_gate();

    match command {
        AppCommand::Calculate(request) => cli::calculate::run(&request, &config, &gate),
        AppCommand::Assumptions {
            admin_key,
            overrides,
            format,
        } => cli::assumptions::run(admin_key.as_deref(), &overrides, &config, &gate, format),
    }
}
