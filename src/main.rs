use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use event_roi::cli::OutputFormat;
use event_roi::cli::calculate::CalculateRequest;
use event_roi::core::AssumptionOverrides;
use event_roi::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Admin key and assumption overrides, honoured only once the key matches.
#[derive(Args)]
struct AdminArgs {
    /// Admin key unlocking the override flags
    #[arg(long)]
    admin_key: Option<String>,

    /// Fraction of leads worked without the program
    #[arg(long, value_parser = parse_rate)]
    baseline_followup_rate: Option<f64>,

    /// Fraction of worked leads that close without the program
    #[arg(long, value_parser = parse_rate)]
    baseline_close_rate: Option<f64>,

    /// Fraction of leads never captured or assigned
    #[arg(long, value_parser = parse_rate)]
    lost_unassigned_rate: Option<f64>,

    /// Fraction of leads captured but never worked
    #[arg(long, value_parser = parse_rate)]
    dormant_rate: Option<f64>,

    /// Fraction of leads worked with the program
    #[arg(long, value_parser = parse_rate)]
    program_followup_rate: Option<f64>,

    /// Fraction of worked leads that close with the program
    #[arg(long, value_parser = parse_rate)]
    program_close_rate: Option<f64>,

    /// Cost of running the program
    #[arg(long, value_parser = parse_amount)]
    program_cost: Option<f64>,

    /// Target response time in hours
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=72))]
    response_hours: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl AdminArgs {
    fn overrides(&self) -> AssumptionOverrides {
        AssumptionOverrides {
            baseline_followup_rate: self.baseline_followup_rate,
            baseline_close_rate: self.baseline_close_rate,
            lost_unassigned_rate: self.lost_unassigned_rate,
            dormant_rate: self.dormant_rate,
            treatment_followup_rate: self.program_followup_rate,
            treatment_close_rate: self.program_close_rate,
            program_cost: self.program_cost,
            target_response_hours: self.response_hours,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Calculate event ROI and display the dashboard
    Calc {
        /// Leads collected at the event
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        leads: Option<u64>,

        /// Total event spend
        #[arg(long, value_parser = parse_amount)]
        event_spend: Option<f64>,

        /// Average deal value
        #[arg(long, value_parser = parse_deal_value)]
        deal_value: Option<f64>,

        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Display the assumptions an evaluation would use
    Assumptions {
        #[command(flatten)]
        admin: AdminArgs,
    },
}

impl From<Commands> for event_roi::AppCommand {
    fn from(cmd: Commands) -> event_roi::AppCommand {
        match cmd {
            Commands::Calc {
                leads,
                event_spend,
                deal_value,
                admin,
            } => event_roi::AppCommand::Calculate(CalculateRequest {
                leads,
                event_spend,
                deal_value,
                overrides: admin.overrides(),
                admin_key: admin.admin_key,
                format: admin.format,
            }),
            Commands::Assumptions { admin } => event_roi::AppCommand::Assumptions {
                overrides: admin.overrides(),
                admin_key: admin.admin_key,
                format: admin.format,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !value.is_finite() {
        return Err(format!("`{s}` is not a finite number"));
    }
    Ok(value)
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("rate must be between 0 and 1, got {value}"));
    }
    Ok(value)
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value < 0.0 {
        return Err(format!("amount must not be negative, got {value}"));
    }
    Ok(value)
}

fn parse_deal_value(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value < 1.0 {
        return Err(format!("deal value must be at least 1, got {value}"));
    }
    Ok(value)
}

/// Writes the example config to `--config-path` when given, else the default location.
fn run_setup(config_path: Option<&str>) -> Result<()> {
    match config_path {
        Some(path) => event_roi::cli::setup::setup_at_path(path),
        None => event_roi::cli::setup::setup(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => run_setup(cli.config_path.as_deref()),
        Some(cmd) => event_roi::run_command(cmd.into(), cli.config_path.as_deref()),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
