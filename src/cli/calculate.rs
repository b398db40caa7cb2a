use super::{OutputFormat, ui};
use crate::core::config::AppConfig;
use crate::core::{
    AdminGate, AssumptionOverrides, AssumptionSet, Funnel, RoiReport, ScenarioInputs, evaluate,
    resolve_assumptions,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use serde::Serialize;
use tracing::{debug, info};

/// Operator request for one evaluation. Unset inputs fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct CalculateRequest {
    pub leads: Option<u64>,
    pub event_spend: Option<f64>,
    pub deal_value: Option<f64>,
    pub admin_key: Option<String>,
    pub overrides: AssumptionOverrides,
    pub format: OutputFormat,
}

/// Inputs and assumptions resolved for a request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedScenario {
    pub inputs: ScenarioInputs,
    pub assumptions: AssumptionSet,
    pub admin_unlocked: bool,
}

/// Merges the request with the config and runs the admin gate.
/// CLI overrides take precedence over overrides from the config file.
/// Overrides are only checked, and only applied, once the gate is unlocked.
pub fn resolve(
    request: &CalculateRequest,
    config: &AppConfig,
    gate: &AdminGate,
) -> Result<ResolvedScenario> {
    let inputs = ScenarioInputs {
        leads: request.leads.unwrap_or(config.inputs.leads),
        event_spend: request.event_spend.unwrap_or(config.inputs.event_spend),
        deal_value: request.deal_value.unwrap_or(config.inputs.deal_value),
    };
    inputs.validate().context("Invalid scenario inputs")?;

    let admin_unlocked = gate.unlocks(request.admin_key.as_deref());
    let overrides = request.overrides.merge(config.overrides);
    if admin_unlocked {
        overrides.validate().context("Invalid assumption overrides")?;
    }
    let assumptions = resolve_assumptions(admin_unlocked, &overrides);
    debug!(?inputs, ?assumptions, admin_unlocked, "Resolved scenario");

    Ok(ResolvedScenario {
        inputs,
        assumptions,
        admin_unlocked,
    })
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    program_name: &'a str,
    admin_unlocked: bool,
    #[serde(flatten)]
    report: &'a RoiReport,
}

fn funnel_table(funnel: &Funnel) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Stage"),
        ui::header_cell("Leads"),
        ui::header_cell("% of Previous"),
    ]);
    for stage in &funnel.stages {
        table.add_row(vec![
            Cell::new(stage.label),
            ui::value_cell(ui::format_count(stage.value)),
            ui::format_optional_cell(stage.percent_of_previous, ui::format_percent),
        ]);
    }
    format!(
        "{}\n{}",
        ui::style_text(&funnel.title, ui::StyleType::Section),
        table
    )
}

impl RoiReport {
    /// Renders the KPI strip, both funnels, value highlights and the summary.
    pub fn display_as_dashboard(&self, program_name: &str, currency_symbol: &str) -> String {
        let m = &self.metrics;
        let money = |v: f64| ui::format_currency(v, currency_symbol);

        let mut kpis = ui::new_styled_table();
        kpis.set_header(vec![
            ui::header_cell("Cost per Lead"),
            ui::header_cell("Baseline Revenue"),
            ui::header_cell(&format!("With {program_name}")),
            ui::header_cell("Incremental Gain"),
        ]);
        kpis.add_row(vec![
            ui::value_cell(money(m.cost_per_lead)),
            ui::value_cell(money(m.revenue_baseline)),
            ui::value_cell(money(m.revenue_treatment)),
            ui::gain_cell(money(m.incremental_gain), m.incremental_gain),
        ]);
        kpis.add_row(vec![
            Cell::new(ui::style_text("Event spend / Leads", ui::StyleType::Subtle)),
            Cell::new(ui::style_text(
                &format!("{} deals at baseline rates", m.closed_deals_baseline),
                ui::StyleType::Subtle,
            )),
            Cell::new(ui::style_text(
                &format!("{} deals at improved rates", m.closed_deals_treatment),
                ui::StyleType::Subtle,
            )),
            Cell::new(ui::style_text(
                "Recovered by value-intelligent follow-ups",
                ui::StyleType::Subtle,
            )),
        ]);

        let mut highlights = ui::new_styled_table();
        highlights.set_header(vec![
            ui::header_cell("Hidden Leads Recovered"),
            ui::header_cell("Response Time Target"),
            ui::header_cell("ROI Multiple (after cost)"),
        ]);
        highlights.add_row(vec![
            ui::value_cell(ui::format_count(m.unassigned_leads)),
            ui::value_cell(format!("{} hrs", self.assumptions.target_response_hours)),
            ui::format_optional_cell(m.roi_multiple, |v| ui::format_multiple(Some(v))),
        ]);
        highlights.add_row(vec![
            Cell::new(ui::style_text(
                &format!("Worth {} in 48 hours", money(m.recovered_lead_value)),
                ui::StyleType::Subtle,
            )),
            Cell::new(ui::style_text(
                "Faster follow-ups protect conversion",
                ui::StyleType::Subtle,
            )),
            Cell::new(ui::style_text(
                "Incremental gain minus cost / cost",
                ui::StyleType::Subtle,
            )),
        ]);

        let mut summary = ui::new_styled_table();
        summary.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        let amount = |v: f64| ui::value_cell(ui::format_amount(v));
        let count = |v: i64| ui::value_cell(ui::format_count(v));
        let rows = vec![
            ("Leads".to_string(), count(self.inputs.leads as i64)),
            (
                format!("Event Spend ({currency_symbol})"),
                amount(self.inputs.event_spend),
            ),
            (
                format!("Avg Deal Value ({currency_symbol})"),
                amount(self.inputs.deal_value),
            ),
            (
                "Worked Leads (Baseline)".to_string(),
                count(m.worked_leads_baseline),
            ),
            (
                "Closed Deals (Baseline)".to_string(),
                count(m.closed_deals_baseline),
            ),
            ("Revenue (Baseline)".to_string(), amount(m.revenue_baseline)),
            (
                format!("Worked Leads ({program_name})"),
                count(m.worked_leads_treatment),
            ),
            (
                format!("Closed Deals ({program_name})"),
                count(m.closed_deals_treatment),
            ),
            (
                format!("Revenue ({program_name})"),
                amount(m.revenue_treatment),
            ),
            ("Incremental Gain".to_string(), amount(m.incremental_gain)),
            (
                "Hidden Leads Recovered".to_string(),
                count(m.unassigned_leads),
            ),
            (
                format!("Recovered Lead Value ({currency_symbol})"),
                amount(m.recovered_lead_value),
            ),
        ];
        for (label, value) in rows {
            summary.add_row(vec![Cell::new(label), value]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text(
                &format!("{program_name} • Event ROI Calculator"),
                ui::StyleType::Title
            )
        );
        output.push_str(&kpis.to_string());
        output.push_str("\n\n");
        output.push_str(&funnel_table(&self.baseline));
        output.push_str("\n\n");
        output.push_str(&funnel_table(&self.treatment));
        output.push_str(&format!(
            "\n\n{}\n",
            ui::style_text("Value Highlights", ui::StyleType::Section)
        ));
        output.push_str(&highlights.to_string());
        output.push_str(&format!(
            "\n\n{}\n",
            ui::style_text("Summary", ui::StyleType::Section)
        ));
        output.push_str(&summary.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                "Assumptions are illustrative. Adjust them in admin mode to match your market and vertical playbooks.",
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

/// Renders the report in the requested format.
pub fn render(
    report: &RoiReport,
    admin_unlocked: bool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut output =
                report.display_as_dashboard(&config.program_name, &config.currency_symbol);
            if admin_unlocked {
                output.push_str(&format!(
                    "\n{}",
                    ui::style_text(
                        "Admin mode unlocked: custom assumptions applied",
                        ui::StyleType::Highlight
                    )
                ));
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let json = JsonReport {
                generated_at: Utc::now(),
                program_name: &config.program_name,
                admin_unlocked,
                report,
            };
            serde_json::to_string_pretty(&json).context("Failed to serialize report")
        }
    }
}

pub fn run(request: &CalculateRequest, config: &AppConfig, gate: &AdminGate) -> Result<()> {
    info!("Calculating event ROI...");
    let resolved = resolve(request, config, gate)?;
    let report = evaluate(&resolved.inputs, &resolved.assumptions, &config.program_name);
    println!(
        "{}",
        render(&report, resolved.admin_unlocked, config, request.format)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> AppConfig {
        AppConfig {
            admin_key: Some(key.to_string()),
            ..AppConfig::default()
        }
    }

    fn zero_cost_request(admin_key: Option<&str>) -> CalculateRequest {
        CalculateRequest {
            admin_key: admin_key.map(str::to_string),
            overrides: AssumptionOverrides {
                program_cost: Some(0.0),
                ..AssumptionOverrides::default()
            },
            ..CalculateRequest::default()
        }
    }

    #[test]
    fn test_resolve_uses_config_inputs_when_flags_missing() -> Result<()> {
        let config = AppConfig {
            inputs: ScenarioInputs {
                leads: 80,
                event_spend: 8_000.0,
                deal_value: 500.0,
            },
            ..config_with_key("k")
        };
        let request = CalculateRequest {
            leads: Some(100),
            ..CalculateRequest::default()
        };
        let resolved = resolve(&request, &config, &AdminGate::new("k"))?;
        assert_eq!(resolved.inputs.leads, 100);
        assert_eq!(resolved.inputs.event_spend, 8_000.0);
        assert_eq!(resolved.inputs.deal_value, 500.0);
        assert!(!resolved.admin_unlocked);
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_zero_leads() {
        let request = CalculateRequest {
            leads: Some(0),
            ..CalculateRequest::default()
        };
        let err = resolve(&request, &config_with_key("k"), &AdminGate::new("k")).unwrap_err();
        assert!(format!("{err:#}").contains("Leads collected"));
    }

    #[test]
    fn test_flag_replaces_out_of_range_config_input() -> Result<()> {
        let config = AppConfig {
            inputs: ScenarioInputs {
                leads: 0,
                ..ScenarioInputs::default()
            },
            ..config_with_key("k")
        };
        let request = CalculateRequest {
            leads: Some(40),
            ..CalculateRequest::default()
        };
        let resolved = resolve(&request, &config, &AdminGate::new("k"))?;
        assert_eq!(resolved.inputs.leads, 40);

        let err = resolve(&CalculateRequest::default(), &config, &AdminGate::new("k")).unwrap_err();
        assert!(format!("{err:#}").contains("Leads collected"));
        Ok(())
    }

    #[test]
    fn test_overrides_need_the_right_key() -> Result<()> {
        let config = config_with_key("open-sesame");
        let gate = config.admin_gate_with(None);

        let locked = resolve(&zero_cost_request(Some("wrong")), &config, &gate)?;
        assert!(!locked.admin_unlocked);
        assert_eq!(locked.assumptions, AssumptionSet::default());

        let unlocked = resolve(&zero_cost_request(Some(" open-sesame ")), &config, &gate)?;
        assert!(unlocked.admin_unlocked);
        assert_eq!(unlocked.assumptions.program_cost, 0.0);
        Ok(())
    }

    #[test]
    fn test_locked_gate_ignores_out_of_range_overrides() -> Result<()> {
        let config = AppConfig {
            overrides: AssumptionOverrides {
                dormant_rate: Some(3.0),
                ..AssumptionOverrides::default()
            },
            ..config_with_key("k")
        };
        let request = CalculateRequest {
            admin_key: Some("wrong".to_string()),
            overrides: AssumptionOverrides {
                treatment_close_rate: Some(2.0),
                ..AssumptionOverrides::default()
            },
            ..CalculateRequest::default()
        };
        let gate = config.admin_gate_with(None);

        let locked = resolve(&request, &config, &gate)?;
        assert!(!locked.admin_unlocked);
        assert_eq!(locked.assumptions, AssumptionSet::default());

        let unlocked = CalculateRequest {
            admin_key: Some("k".to_string()),
            ..request
        };
        let err = resolve(&unlocked, &config, &gate).unwrap_err();
        assert!(format!("{err:#}").contains("must be between 0 and 1"));
        Ok(())
    }

    #[test]
    fn test_cli_overrides_win_over_config_overrides() -> Result<()> {
        let config = AppConfig {
            overrides: AssumptionOverrides {
                program_cost: Some(1_000.0),
                dormant_rate: Some(0.1),
                ..AssumptionOverrides::default()
            },
            ..config_with_key("k")
        };
        let resolved = resolve(
            &zero_cost_request(Some("k")),
            &config,
            &config.admin_gate_with(None),
        )?;
        assert_eq!(resolved.assumptions.program_cost, 0.0);
        assert_eq!(resolved.assumptions.dormant_rate, 0.1);
        Ok(())
    }

    #[test]
    fn test_dashboard_contains_kpis_and_summary() {
        let report = evaluate(
            &ScenarioInputs::default(),
            &AssumptionSet::default(),
            "Scino360",
        );
        let output = report.display_as_dashboard("Scino360", "₣");

        assert!(output.contains("₣12,000"));
        assert!(output.contains("₣36,000,000"));
        assert!(output.contains("₣396,000,000"));
        assert!(output.contains("₣360,000,000"));
        assert!(output.contains("22 deals at improved rates"));
        assert!(output.contains("Without Scino360"));
        assert!(output.contains("With Scino360"));
        assert!(output.contains("Worked/Followed Up"));
        assert!(output.contains("30.0%"));
        assert!(output.contains("35.00×"));
        assert!(output.contains("24 hrs"));
        assert!(output.contains("Worth ₣720,000 in 48 hours"));
        assert!(output.contains("Recovered Lead Value (₣)"));
    }

    #[test]
    fn test_dashboard_shows_placeholder_for_free_program() {
        let assumptions = AssumptionSet {
            program_cost: 0.0,
            ..AssumptionSet::default()
        };
        let report = evaluate(&ScenarioInputs::default(), &assumptions, "Scino360");
        let output = report.display_as_dashboard("Scino360", "₣");
        assert!(output.contains(ui::UNDEFINED));
        assert!(!output.contains('×'));
    }

    #[test]
    fn test_render_json_marks_admin_and_null_multiple() -> Result<()> {
        let config = config_with_key("k");
        let resolved = resolve(
            &zero_cost_request(Some("k")),
            &config,
            &config.admin_gate_with(None),
        )?;
        let report = evaluate(&resolved.inputs, &resolved.assumptions, &config.program_name);

        let json = render(&report, resolved.admin_unlocked, &config, OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["admin_unlocked"], true);
        assert_eq!(value["program_name"], "Scino360");
        assert!(value["metrics"]["roi_multiple"].is_null());
        assert_eq!(value["metrics"]["unassigned_leads"], 60);
        assert!(value["generated_at"].is_string());
        Ok(())
    }
}
