mod levers;
mod scenarios;
mod simulator;
mod stats;
mod survival;
mod types;

pub use levers::{
    BURN_CUT_MAX_PCT, DAYS_PER_MONTH, DENOMINATOR_FLOOR, REVENUE_GROWTH_MAX_PCT, adjusted_months,
    burn_delta_months, burn_saved_weekly, recompute, recompute_on, revenue_delta_months,
    revenue_gained_weekly, zero_cash_date,
};
pub use scenarios::stress_test;
pub use simulator::{
    ANCHOR_PERIOD, DRIFT_MAX, DRIFT_MIN, anchor_markers, derive_drift, project_bands, simulate,
    simulate_with_rng,
};
pub use stats::{NormalSampler, percentile, percentile_sorted};
pub use survival::{DEFAULT_SURVIVAL_SIMULATIONS, survival_analysis, survival_analysis_on};
pub use types::{
    AdjustedRunway, AnchorMarker, FundraisingReadiness, KpiSnapshot, LeverState, PercentileBand,
    RunwayBaseline, ScenarioAnchor, ScenarioAnchors, ScenarioName, ScenarioOutlook,
    SimulationConfig, SimulationInput, SurvivalLabel, SurvivalReport,
};
