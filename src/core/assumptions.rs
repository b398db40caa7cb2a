//! Resolves the conversion and cost assumptions used by an evaluation.
//!
//! Defaults apply to everyone. Overrides only take effect once the admin
//! gate has been unlocked with the configured secret.
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Secret used when neither the environment nor the config file supplies one.
pub const DEFAULT_ADMIN_KEY: &str = "scino360";

/// Fully populated assumption set for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AssumptionSet {
    /// Fraction of leads worked without the program.
    pub baseline_followup_rate: f64,
    /// Fraction of worked leads that close without the program.
    pub baseline_close_rate: f64,
    /// Fraction of leads never captured or assigned.
    pub lost_unassigned_rate: f64,
    /// Fraction of leads captured but never worked.
    pub dormant_rate: f64,
    /// Fraction of leads worked with the program.
    pub treatment_followup_rate: f64,
    /// Fraction of worked leads that close with the program.
    pub treatment_close_rate: f64,
    /// Cost of running the program.
    pub program_cost: f64,
    /// Informational only, no formula reads it.
    pub target_response_hours: u32,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        AssumptionSet {
            baseline_followup_rate: 0.30,
            baseline_close_rate: 0.05,
            lost_unassigned_rate: 0.40,
            dormant_rate: 0.30,
            treatment_followup_rate: 1.00,
            treatment_close_rate: 0.15,
            program_cost: 10_000_000.0,
            target_response_hours: 24,
        }
    }
}

/// Optional per-field replacements for [`AssumptionSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssumptionOverrides {
    pub baseline_followup_rate: Option<f64>,
    pub baseline_close_rate: Option<f64>,
    pub lost_unassigned_rate: Option<f64>,
    pub dormant_rate: Option<f64>,
    pub treatment_followup_rate: Option<f64>,
    pub treatment_close_rate: Option<f64>,
    pub program_cost: Option<f64>,
    pub target_response_hours: Option<u32>,
}

impl AssumptionOverrides {
    /// Layers `self` over `fallback`; any field set on `self` wins.
    pub fn merge(self, fallback: AssumptionOverrides) -> AssumptionOverrides {
        AssumptionOverrides {
            baseline_followup_rate: self
                .baseline_followup_rate
                .or(fallback.baseline_followup_rate),
            baseline_close_rate: self.baseline_close_rate.or(fallback.baseline_close_rate),
            lost_unassigned_rate: self
                .lost_unassigned_rate
                .or(fallback.lost_unassigned_rate),
            dormant_rate: self.dormant_rate.or(fallback.dormant_rate),
            treatment_followup_rate: self
                .treatment_followup_rate
                .or(fallback.treatment_followup_rate),
            treatment_close_rate: self
                .treatment_close_rate
                .or(fallback.treatment_close_rate),
            program_cost: self.program_cost.or(fallback.program_cost),
            target_response_hours: self
                .target_response_hours
                .or(fallback.target_response_hours),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == AssumptionOverrides::default()
    }

    /// Applies the same bounds the admin sliders enforce. Used for override
    /// sources that are not widgets, such as the config file.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("baseline_followup_rate", self.baseline_followup_rate),
            ("baseline_close_rate", self.baseline_close_rate),
            ("lost_unassigned_rate", self.lost_unassigned_rate),
            ("dormant_rate", self.dormant_rate),
            ("treatment_followup_rate", self.treatment_followup_rate),
            ("treatment_close_rate", self.treatment_close_rate),
        ];
        for (name, rate) in rates {
            if let Some(rate) = rate {
                if !(0.0..=1.0).contains(&rate) {
                    bail!("{name} must be between 0 and 1, got {rate}");
                }
            }
        }
        if let Some(cost) = self.program_cost {
            if !cost.is_finite() || cost < 0.0 {
                bail!("program_cost must be a non-negative amount, got {cost}");
            }
        }
        if let Some(hours) = self.target_response_hours {
            if !(1..=72).contains(&hours) {
                bail!("target_response_hours must be between 1 and 72, got {hours}");
            }
        }
        Ok(())
    }
}

/// Shared-secret comparison deciding whether overrides are honoured.
#[derive(Debug, Clone)]
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        AdminGate {
            secret: secret.into(),
        }
    }

    /// Returns `true` when the supplied key, trimmed, equals the secret.
    /// An absent key is compared as the empty string.
    pub fn unlocks(&self, supplied: Option<&str>) -> bool {
        let unlocked = supplied.unwrap_or_default().trim() == self.secret;
        debug!(unlocked, "Admin gate evaluated");
        unlocked
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        AdminGate::new(DEFAULT_ADMIN_KEY)
    }
}

/// Produces the assumption set for one evaluation. Overrides are ignored
/// entirely unless `admin_unlocked` is set.
pub fn resolve_assumptions(
    admin_unlocked: bool,
    overrides: &AssumptionOverrides,
) -> AssumptionSet {
    let defaults = AssumptionSet::default();
    if !admin_unlocked {
        if !overrides.is_empty() {
            debug!("Admin mode locked, ignoring supplied overrides");
        }
        return defaults;
    }

    AssumptionSet {
        baseline_followup_rate: overrides
            .baseline_followup_rate
            .unwrap_or(defaults.baseline_followup_rate),
        baseline_close_rate: overrides
            .baseline_close_rate
            .unwrap_or(defaults.baseline_close_rate),
        lost_unassigned_rate: overrides
            .lost_unassigned_rate
            .unwrap_or(defaults.lost_unassigned_rate),
        dormant_rate: overrides.dormant_rate.unwrap_or(defaults.dormant_rate),
        treatment_followup_rate: overrides
            .treatment_followup_rate
            .unwrap_or(defaults.treatment_followup_rate),
        treatment_close_rate: overrides
            .treatment_close_rate
            .unwrap_or(defaults.treatment_close_rate),
        program_cost: overrides.program_cost.unwrap_or(defaults.program_cost),
        target_response_hours: overrides
            .target_response_hours
            .unwrap_or(defaults.target_response_hours),
    }
}
