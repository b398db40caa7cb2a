//! Operator supplied inputs for a single evaluation.
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Raw event figures entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioInputs {
    /// Leads collected at the event.
    pub leads: u64,
    /// Total event spend in currency units.
    pub event_spend: f64,
    /// Average revenue of a closed deal.
    pub deal_value: f64,
}

impl Default for ScenarioInputs {
    fn default() -> Self {
        ScenarioInputs {
            leads: 150,
            event_spend: 1_800_000.0,
            deal_value: 18_000_000.0,
        }
    }
}

impl ScenarioInputs {
    /// Checks the bounds the input widgets enforce. The ROI engine itself
    /// never calls this and will happily compute on anything.
    pub fn validate(&self) -> Result<()> {
        if self.leads < 1 {
            bail!("Leads collected must be at least 1");
        }
        if !self.event_spend.is_finite() || self.event_spend < 0.0 {
            bail!(
                "Event spend must be a non-negative amount, got {}",
                self.event_spend
            );
        }
        if !self.deal_value.is_finite() || self.deal_value < 1.0 {
            bail!(
                "Average deal value must be at least 1, got {}",
                self.deal_value
            );
        }
        Ok(())
    }
}
