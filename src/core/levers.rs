use chrono::{Local, NaiveDate, TimeDelta};

use super::types::{AdjustedRunway, LeverState, RunwayBaseline};

/// Lower bound on the burn denominator `1 - burn_cut`.
pub const DENOMINATOR_FLOOR: f64 = 0.1;
/// Average month length used across the dashboard for date projection.
pub const DAYS_PER_MONTH: f64 = 30.44;
pub const BURN_CUT_MAX_PCT: f64 = 60.0;
pub const REVENUE_GROWTH_MAX_PCT: f64 = 100.0;

impl LeverState {
    pub fn new(burn_cut_pct: f64, revenue_growth_pct: f64) -> Self {
        let mut state = Self::default();
        state.set_burn_cut(burn_cut_pct);
        state.set_revenue_growth(revenue_growth_pct);
        state
    }

    pub fn set_burn_cut(&mut self, pct: f64) {
        self.burn_cut_pct = clamp_pct(pct, BURN_CUT_MAX_PCT);
    }

    pub fn set_revenue_growth(&mut self, pct: f64) {
        self.revenue_growth_pct = clamp_pct(pct, REVENUE_GROWTH_MAX_PCT);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_resting(&self) -> bool {
        self.burn_cut_pct == 0.0 && self.revenue_growth_pct == 0.0
    }
}

fn clamp_pct(pct: f64, max: f64) -> f64 {
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, max) }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn burn_denominator(burn_cut_pct: f64) -> f64 {
    let denominator = 1.0 - burn_cut_pct / 100.0;
    if denominator.is_nan() {
        return 1.0;
    }
    denominator.max(DENOMINATOR_FLOOR)
}

/// Joint runway under both levers: `months * (1 + growth) / max(1 - cut, floor)`.
pub fn adjusted_months(baseline: &RunwayBaseline, levers: &LeverState) -> f64 {
    let growth = 1.0 + finite_or_zero(levers.revenue_growth_pct) / 100.0;
    finite_or_zero(baseline.months_runway * growth / burn_denominator(levers.burn_cut_pct))
}

/// Runway gained from the burn lever alone.
pub fn burn_delta_months(baseline: &RunwayBaseline, levers: &LeverState) -> f64 {
    finite_or_zero(baseline.months_runway * (1.0 / burn_denominator(levers.burn_cut_pct) - 1.0))
}

/// Runway gained from the revenue lever alone.
pub fn revenue_delta_months(baseline: &RunwayBaseline, levers: &LeverState) -> f64 {
    finite_or_zero(baseline.months_runway * levers.revenue_growth_pct / 100.0)
}

pub fn burn_saved_weekly(baseline: &RunwayBaseline, levers: &LeverState) -> f64 {
    finite_or_zero(baseline.weekly_burn * levers.burn_cut_pct / 100.0)
}

pub fn revenue_gained_weekly(baseline: &RunwayBaseline, levers: &LeverState) -> f64 {
    finite_or_zero(baseline.weekly_revenue * levers.revenue_growth_pct / 100.0)
}

/// `today + round(months * 30.44)` days, saturating at the calendar bounds.
pub fn zero_cash_date(today: NaiveDate, months: f64) -> NaiveDate {
    let days = (finite_or_zero(months) * DAYS_PER_MONTH).round();
    let saturated = if days > 0.0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    };
    // `as` saturates for out-of-range floats.
    TimeDelta::try_days(days as i64)
        .and_then(|delta| today.checked_add_signed(delta))
        .unwrap_or(saturated)
}

pub fn recompute(baseline: &RunwayBaseline, levers: &LeverState) -> AdjustedRunway {
    recompute_on(baseline, levers, Local::now().date_naive())
}

pub fn recompute_on(
    baseline: &RunwayBaseline,
    levers: &LeverState,
    today: NaiveDate,
) -> AdjustedRunway {
    let months = adjusted_months(baseline, levers);
    AdjustedRunway {
        adjusted_months: months,
        burn_saved_weekly: burn_saved_weekly(baseline, levers),
        revenue_gained_weekly: revenue_gained_weekly(baseline, levers),
        burn_delta_months: burn_delta_months(baseline, levers),
        revenue_delta_months: revenue_delta_months(baseline, levers),
        zero_cash_date: zero_cash_date(today, months),
    }
}
