use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trusted constants for the path simulator. These are configuration, not user
/// input, and are not validated by `simulate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub path_count: usize,
    pub horizon_steps: usize,
    pub volatility_per_step: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            path_count: 200,
            horizon_steps: 18,
            volatility_per_step: 0.08,
        }
    }
}

impl SimulationConfig {
    pub fn input(&self, start_value: f64) -> SimulationInput {
        SimulationInput {
            start_value,
            horizon_steps: self.horizon_steps,
            drift_per_step: 0.0,
            volatility_per_step: self.volatility_per_step,
            path_count: self.path_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationInput {
    pub start_value: f64,
    pub horizon_steps: usize,
    pub drift_per_step: f64,
    pub volatility_per_step: f64,
    pub path_count: usize,
}

/// Step-wise percentiles across all simulated paths.
///
/// Each field is computed independently at its step, so the `p50` series is the
/// median at every step, not the trajectory of any single simulated path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileBand {
    pub step: usize,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioName {
    Bear,
    Base,
    Bull,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAnchor {
    pub target6: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioAnchors {
    pub bear: Option<ScenarioAnchor>,
    pub base: Option<ScenarioAnchor>,
    pub bull: Option<ScenarioAnchor>,
}

impl ScenarioAnchors {
    pub fn iter(&self) -> impl Iterator<Item = (ScenarioName, ScenarioAnchor)> + '_ {
        [
            (ScenarioName::Bear, self.bear),
            (ScenarioName::Base, self.base),
            (ScenarioName::Bull, self.bull),
        ]
        .into_iter()
        .filter_map(|(name, anchor)| anchor.map(|a| (name, a)))
    }

    pub fn from_outlooks(outlooks: &[ScenarioOutlook]) -> Self {
        let mut anchors = Self::default();
        for outlook in outlooks {
            let anchor = Some(ScenarioAnchor {
                target6: outlook.projected_target6,
            });
            match outlook.scenario {
                ScenarioName::Bear => anchors.bear = anchor,
                ScenarioName::Base => anchors.base = anchor,
                ScenarioName::Bull => anchors.bull = anchor,
            }
        }
        anchors
    }
}

/// Where an anchor target lands on the simulated horizon, for chart annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorMarker {
    pub scenario: ScenarioName,
    pub step: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunwayBaseline {
    pub months_runway: f64,
    pub weekly_burn: f64,
    pub weekly_revenue: f64,
}

impl RunwayBaseline {
    pub fn from_outlook(outlook: &ScenarioOutlook) -> Self {
        Self {
            months_runway: outlook.months_runway,
            weekly_burn: outlook.weekly_burn,
            weekly_revenue: outlook.weekly_revenue,
        }
    }
}

/// Lever positions in percent. The public fields accept any value; the setters
/// clamp to the UI ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverState {
    pub burn_cut_pct: f64,
    pub revenue_growth_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedRunway {
    pub adjusted_months: f64,
    pub burn_saved_weekly: f64,
    pub revenue_gained_weekly: f64,
    pub burn_delta_months: f64,
    pub revenue_delta_months: f64,
    pub zero_cash_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub mrr: f64,
    pub burn_rate: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundraisingReadiness {
    Ready,
    #[serde(rename = "6_MONTHS")]
    SixMonths,
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutlook {
    pub scenario: ScenarioName,
    pub months_runway: f64,
    pub weekly_burn: f64,
    pub weekly_revenue: f64,
    pub weekly_growth: f64,
    pub projected_target6: f64,
    pub projected_mrr_26: f64,
    pub readiness: FundraisingReadiness,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurvivalLabel {
    Safe,
    LowRisk,
    ModerateRisk,
    HighRisk,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalReport {
    pub score: u32,
    pub label: SurvivalLabel,
    pub probability_ruin_90d: f64,
    pub probability_ruin_180d: f64,
    pub probability_ruin_365d: f64,
    pub expected_zero_cash_day: u32,
    pub fundraising_deadline: Option<NaiveDate>,
}
