use super::{OutputFormat, ui};
use crate::core::config::AppConfig;
use crate::core::{AdminGate, AssumptionOverrides, AssumptionSet, resolve_assumptions};
use anyhow::{Context, Result};
use comfy_table::Cell;
use serde::Serialize;

#[derive(Serialize)]
struct JsonAssumptions<'a> {
    admin_unlocked: bool,
    assumptions: &'a AssumptionSet,
}

fn display_as_table(assumptions: &AssumptionSet, admin_unlocked: bool, symbol: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Assumption"), ui::header_cell("Value")]);

    let rate = |v: f64| ui::value_cell(ui::format_percent(v * 100.0));
    let rows = vec![
        ("Baseline follow-up rate", rate(assumptions.baseline_followup_rate)),
        ("Baseline close rate", rate(assumptions.baseline_close_rate)),
        ("Lost/unassigned leads", rate(assumptions.lost_unassigned_rate)),
        ("Dormant leads (captured, not worked)", rate(assumptions.dormant_rate)),
        ("Program follow-up rate", rate(assumptions.treatment_followup_rate)),
        ("Program close rate", rate(assumptions.treatment_close_rate)),
        (
            "Program cost",
            ui::value_cell(ui::format_currency(assumptions.program_cost, symbol)),
        ),
        (
            "Target response time",
            ui::value_cell(format!("{} hrs", assumptions.target_response_hours)),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), value]);
    }

    let mode = if admin_unlocked {
        ui::style_text("Admin mode unlocked", ui::StyleType::Highlight)
    } else {
        ui::style_text("Default assumptions (admin mode locked)", ui::StyleType::Subtle)
    };
    format!("{mode}\n{table}")
}

/// Prints the assumption set an evaluation with the same key would use.
pub fn run(
    admin_key: Option<&str>,
    overrides: &AssumptionOverrides,
    config: &AppConfig,
    gate: &AdminGate,
    format: OutputFormat,
) -> Result<()> {
    let admin_unlocked = gate.unlocks(admin_key);
    let overrides = overrides.merge(config.overrides);
    if admin_unlocked {
        overrides
            .validate()
            .context("Invalid assumption overrides")?;
    }
    let assumptions = resolve_assumptions(admin_unlocked, &overrides);

    let output = match format {
        OutputFormat::Table => {
            display_as_table(&assumptions, admin_unlocked, &config.currency_symbol)
        }
        OutputFormat::Json => serde_json::to_string_pretty(&JsonAssumptions {
            admin_unlocked,
            assumptions: &assumptions,
        })
        .context("Failed to serialize assumptions")?,
    };
    println!("{output}");
    Ok(())
}
