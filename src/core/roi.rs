//! Provides the ROI engine: a pure mapping from resolved inputs to the
//! baseline versus program comparison.
use crate::core::assumptions::AssumptionSet;
use crate::core::scenario::ScenarioInputs;
use serde::Serialize;
use tracing::debug;

pub const STAGE_LEADS: &str = "Leads Collected";
pub const STAGE_WORKED: &str = "Worked/Followed Up";
pub const STAGE_CLOSED: &str = "Closed Deals";

/// Snapshot of every figure derived from one evaluation.
///
/// Counts are signed so that out-of-range rates surface as-is instead of
/// being clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub cost_per_lead: f64,
    pub worked_leads_baseline: i64,
    pub closed_deals_baseline: i64,
    pub revenue_baseline: f64,
    pub worked_leads_treatment: i64,
    pub closed_deals_treatment: i64,
    pub revenue_treatment: f64,
    pub incremental_gain: f64,
    /// `None` when the program costs nothing; there is no finite multiple.
    pub roi_multiple: Option<f64>,
    pub unassigned_leads: i64,
    pub recovered_lead_value: f64,
}

/// One stage of a funnel chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub label: &'static str,
    pub value: i64,
    /// Share of the preceding stage, as a percentage.
    pub percent_of_previous: Option<f64>,
}

/// Ordered collected -> worked -> closed sequence for one process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funnel {
    pub title: String,
    pub stages: [FunnelStage; 3],
}

impl Funnel {
    /// Builds the three stages. Monotonicity is expected but not enforced.
    pub fn new(title: impl Into<String>, leads: u64, worked: i64, closed: i64) -> Self {
        let leads = leads as i64;
        Funnel {
            title: title.into(),
            stages: [
                FunnelStage {
                    label: STAGE_LEADS,
                    value: leads,
                    percent_of_previous: None,
                },
                FunnelStage {
                    label: STAGE_WORKED,
                    value: worked,
                    percent_of_previous: percent_of(worked, leads),
                },
                FunnelStage {
                    label: STAGE_CLOSED,
                    value: closed,
                    percent_of_previous: percent_of(closed, worked),
                },
            ],
        }
    }
}

/// Everything presentation needs from one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiReport {
    pub inputs: ScenarioInputs,
    pub assumptions: AssumptionSet,
    pub metrics: DerivedMetrics,
    pub baseline: Funnel,
    pub treatment: Funnel,
}

/// Rounds an expected count to the nearest integer, ties to even.
pub fn round_count(expected: f64) -> i64 {
    expected.round_ties_even() as i64
}

fn percent_of(value: i64, previous: i64) -> Option<f64> {
    if previous == 0 {
        None
    } else {
        Some(value as f64 * 100.0 / previous as f64)
    }
}

/// Computes the derived metrics. `leads` must be at least 1; nothing else is
/// checked.
pub fn compute_metrics(inputs: &ScenarioInputs, assumptions: &AssumptionSet) -> DerivedMetrics {
    let leads = inputs.leads as f64;
    let cost_per_lead = inputs.event_spend / leads;

    let worked_leads_baseline = round_count(leads * assumptions.baseline_followup_rate);
    let closed_deals_baseline =
        round_count(worked_leads_baseline as f64 * assumptions.baseline_close_rate);
    let revenue_baseline = closed_deals_baseline as f64 * inputs.deal_value;

    let worked_leads_treatment = round_count(leads * assumptions.treatment_followup_rate);
    let closed_deals_treatment =
        round_count(worked_leads_treatment as f64 * assumptions.treatment_close_rate);
    let revenue_treatment = closed_deals_treatment as f64 * inputs.deal_value;

    let incremental_gain = revenue_treatment - revenue_baseline;
    let roi_multiple = if assumptions.program_cost > 0.0 {
        Some((incremental_gain - assumptions.program_cost) / assumptions.program_cost)
    } else {
        None
    };

    let unassigned_leads = round_count(leads * assumptions.lost_unassigned_rate);
    let recovered_lead_value = unassigned_leads as f64 * cost_per_lead;

    DerivedMetrics {
        cost_per_lead,
        worked_leads_baseline,
        closed_deals_baseline,
        revenue_baseline,
        worked_leads_treatment,
        closed_deals_treatment,
        revenue_treatment,
        incremental_gain,
        roi_multiple,
        unassigned_leads,
        recovered_lead_value,
    }
}

/// Runs one full evaluation, naming the treatment funnel after `program_name`.
pub fn evaluate(
    inputs: &ScenarioInputs,
    assumptions: &AssumptionSet,
    program_name: &str,
) -> RoiReport {
    let metrics = compute_metrics(inputs, assumptions);
    debug!(?metrics, "Evaluated ROI scenario");

    let baseline = Funnel::new(
        format!("Without {program_name}"),
        inputs.leads,
        metrics.worked_leads_baseline,
        metrics.closed_deals_baseline,
    );
    let treatment = Funnel::new(
        format!("With {program_name}"),
        inputs.leads,
        metrics.worked_leads_treatment,
        metrics.closed_deals_treatment,
    );

    RoiReport {
        inputs: *inputs,
        assumptions: *assumptions,
        metrics,
        baseline,
        treatment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_inputs() -> ScenarioInputs {
        ScenarioInputs {
            leads: 150,
            event_spend: 1_800_000.0,
            deal_value: 18_000_000.0,
        }
    }

    #[test]
    fn test_default_scenario() {
        let m = compute_metrics(&default_inputs(), &AssumptionSet::default());

        assert_eq!(m.cost_per_lead, 12_000.0);
        assert_eq!(m.worked_leads_baseline, 45);
        assert_eq!(m.closed_deals_baseline, 2);
        assert_eq!(m.revenue_baseline, 36_000_000.0);
        assert_eq!(m.worked_leads_treatment, 150);
        // 22.5 rounds to the even neighbour
        assert_eq!(m.closed_deals_treatment, 22);
        assert_eq!(m.revenue_treatment, 396_000_000.0);
        assert_eq!(m.incremental_gain, 360_000_000.0);
        assert_eq!(m.roi_multiple, Some(35.0));
        assert_eq!(m.unassigned_leads, 60);
        assert_eq!(m.recovered_lead_value, 720_000.0);
    }

    #[test]
    fn test_round_count_ties_to_even() {
        assert_eq!(round_count(22.5), 22);
        assert_eq!(round_count(23.5), 24);
        assert_eq!(round_count(2.25), 2);
        assert_eq!(round_count(0.5), 0);
        assert_eq!(round_count(1.5), 2);
        assert_eq!(round_count(-2.5), -2);
        assert_eq!(round_count(7.51), 8);
    }

    #[test]
    fn test_zero_program_cost_has_no_multiple() {
        let assumptions = AssumptionSet {
            program_cost: 0.0,
            ..AssumptionSet::default()
        };
        let m = compute_metrics(&default_inputs(), &assumptions);
        assert_eq!(m.roi_multiple, None);
        assert_eq!(m.incremental_gain, 360_000_000.0);
    }

    #[test]
    fn test_cost_per_lead_is_plain_division() {
        for (leads, spend) in [(1u64, 0.0), (3, 1000.0), (7, 123_456.78), (150, 1_800_000.0)] {
            let inputs = ScenarioInputs {
                leads,
                event_spend: spend,
                deal_value: 1.0,
            };
            let m = compute_metrics(&inputs, &AssumptionSet::default());
            assert_eq!(m.cost_per_lead, spend / leads as f64);
        }
    }

    #[test]
    fn test_funnel_is_monotone_for_unit_rates() {
        let rates = [0.0, 0.05, 0.15, 0.3, 0.5, 0.75, 0.99, 1.0];
        for leads in [1u64, 2, 9, 150, 1001] {
            for followup in rates {
                for close in rates {
                    let assumptions = AssumptionSet {
                        baseline_followup_rate: followup,
                        baseline_close_rate: close,
                        ..AssumptionSet::default()
                    };
                    let inputs = ScenarioInputs {
                        leads,
                        ..default_inputs()
                    };
                    let m = compute_metrics(&inputs, &assumptions);
                    assert!(m.closed_deals_baseline <= m.worked_leads_baseline);
                    assert!(m.worked_leads_baseline <= leads as i64);
                    assert!(m.closed_deals_baseline >= 0);
                }
            }
        }
    }

    #[test]
    fn test_incremental_gain_is_revenue_difference() {
        let assumptions = AssumptionSet {
            treatment_close_rate: 0.005,
            ..AssumptionSet::default()
        };
        let m = compute_metrics(&default_inputs(), &assumptions);
        // round(0.75) closes a single deal against two at baseline
        assert_eq!(m.closed_deals_treatment, 1);
        assert_eq!(m.incremental_gain, m.revenue_treatment - m.revenue_baseline);
        assert_eq!(m.incremental_gain, -18_000_000.0);
    }

    #[test]
    fn test_out_of_range_rates_propagate() {
        let assumptions = AssumptionSet {
            treatment_followup_rate: 1.2,
            baseline_followup_rate: -0.1,
            ..AssumptionSet::default()
        };
        let m = compute_metrics(&default_inputs(), &assumptions);
        assert_eq!(m.worked_leads_treatment, 180);
        assert_eq!(m.worked_leads_baseline, -15);
    }

    #[test]
    fn test_evaluate_builds_both_funnels() {
        let report = evaluate(&default_inputs(), &AssumptionSet::default(), "Scino360");

        assert_eq!(report.baseline.title, "Without Scino360");
        assert_eq!(report.treatment.title, "With Scino360");

        let labels: Vec<_> = report.baseline.stages.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![STAGE_LEADS, STAGE_WORKED, STAGE_CLOSED]);

        let values: Vec<_> = report.baseline.stages.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![150, 45, 2]);
        let values: Vec<_> = report.treatment.stages.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![150, 150, 22]);

        assert_eq!(report.baseline.stages[0].percent_of_previous, None);
        assert_eq!(report.baseline.stages[1].percent_of_previous, Some(30.0));
        assert_eq!(report.treatment.stages[1].percent_of_previous, Some(100.0));
    }

    #[test]
    fn test_funnel_percent_skips_empty_previous_stage() {
        let funnel = Funnel::new("Empty", 10, 0, 0);
        assert_eq!(funnel.stages[1].percent_of_previous, Some(0.0));
        assert_eq!(funnel.stages[2].percent_of_previous, None);
    }

    #[test]
    fn test_report_serializes_undefined_multiple_as_null() {
        let assumptions = AssumptionSet {
            program_cost: 0.0,
            ..AssumptionSet::default()
        };
        let report = evaluate(&default_inputs(), &assumptions, "Scino360");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["metrics"]["roi_multiple"].is_null());
        assert_eq!(json["metrics"]["closed_deals_treatment"], 22);
        assert_eq!(json["baseline"]["stages"][2]["label"], STAGE_CLOSED);
    }
}
