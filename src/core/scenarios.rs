use super::simulator::ANCHOR_PERIOD;
use super::types::{FundraisingReadiness, KpiSnapshot, ScenarioName, ScenarioOutlook};

const WEEKS_PER_MONTH: f64 = 4.33;
const PROFITABLE_RUNWAY_MONTHS: f64 = 99.0;
const GROWTH_FLOOR: f64 = -0.15;
const DEFAULT_WEEKLY_GROWTH: f64 = 0.01;
const SEED_MONTHS_OF_MRR: f64 = 18.0;
const READINESS_HORIZON_WEEKS: i32 = 26;

struct ScenarioShock {
    scenario: ScenarioName,
    mrr_mult: f64,
    burn_mult: f64,
    growth_mult: f64,
}

const SHOCKS: [ScenarioShock; 3] = [
    ScenarioShock {
        scenario: ScenarioName::Bear,
        mrr_mult: 0.80,
        burn_mult: 1.15,
        growth_mult: 0.30,
    },
    ScenarioShock {
        scenario: ScenarioName::Base,
        mrr_mult: 1.00,
        burn_mult: 1.00,
        growth_mult: 1.00,
    },
    ScenarioShock {
        scenario: ScenarioName::Bull,
        mrr_mult: 1.20,
        burn_mult: 0.85,
        growth_mult: 2.50,
    },
];

/// Bear/base/bull stress test over a weekly KPI series, oldest first.
///
/// Bear: revenue down 20%, burn up 15%, growth at 30% of trend.
/// Base: current trajectory.
/// Bull: revenue up 20%, burn down 15%, growth at 2.5x trend.
pub fn stress_test(snapshots: &[KpiSnapshot]) -> Vec<ScenarioOutlook> {
    let Some(latest) = snapshots.last() else {
        return Vec::new();
    };

    let last_mrr = finite(latest.mrr).max(1.0);
    let last_burn = finite(latest.burn_rate).max(0.0);
    let weekly_growth = trailing_weekly_growth(snapshots, last_mrr);
    let cash = estimated_cash(snapshots, last_mrr);

    SHOCKS
        .iter()
        .map(|shock| {
            let mrr = last_mrr * shock.mrr_mult;
            let burn = last_burn * shock.burn_mult;
            let growth = weekly_growth * shock.growth_mult;
            let projected_mrr_26 = project(mrr, growth, READINESS_HORIZON_WEEKS);
            ScenarioOutlook {
                scenario: shock.scenario,
                months_runway: months_runway(cash, burn),
                weekly_burn: burn,
                weekly_revenue: mrr,
                weekly_growth: growth,
                projected_target6: project(mrr, growth, ANCHOR_PERIOD as i32),
                projected_mrr_26,
                readiness: readiness(projected_mrr_26, burn, growth),
            }
        })
        .collect()
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn relative_delta(current: f64, previous: f64) -> f64 {
    if previous.abs() < 1e-9 {
        return 0.0;
    }
    (current - previous) / previous.abs()
}

fn trailing_weekly_growth(snapshots: &[KpiSnapshot], last_mrr: f64) -> f64 {
    let n = snapshots.len();
    let growth = if n >= 4 {
        let prev = finite(snapshots[n - 4].mrr).max(0.001);
        relative_delta(last_mrr, prev) / 4.0
    } else if n >= 2 {
        let prev = finite(snapshots[n - 2].mrr).max(0.001);
        relative_delta(last_mrr, prev)
    } else {
        DEFAULT_WEEKLY_GROWTH
    };
    growth.max(GROWTH_FLOOR)
}

/// Cash on hand, assuming the company was seeded with 18 months of current
/// revenue (or twice the total burned so far, whichever is larger).
pub(crate) fn estimated_cash(snapshots: &[KpiSnapshot], last_mrr: f64) -> f64 {
    let total_burned: f64 = snapshots.iter().map(|s| finite(s.burn_rate)).sum();
    let initial = (last_mrr * SEED_MONTHS_OF_MRR).max(total_burned * 2.0);
    (initial - total_burned).max(last_mrr * 2.0)
}

fn months_runway(cash: f64, weekly_burn: f64) -> f64 {
    if weekly_burn <= 0.0 {
        return PROFITABLE_RUNWAY_MONTHS;
    }
    (cash / weekly_burn / WEEKS_PER_MONTH * 10.0).round() / 10.0
}

fn project(mrr: f64, weekly_growth: f64, periods: i32) -> f64 {
    mrr * (1.0 + weekly_growth).powi(periods)
}

fn readiness(projected_mrr: f64, weekly_burn: f64, weekly_growth: f64) -> FundraisingReadiness {
    let net_new_arr = (projected_mrr * weekly_growth * 52.0).max(1.0);
    let burn_multiple = weekly_burn * 52.0 / net_new_arr;
    if projected_mrr >= 100_000.0 && burn_multiple <= 2.0 {
        FundraisingReadiness::Ready
    } else if projected_mrr >= 50_000.0 || weekly_growth >= 0.03 {
        FundraisingReadiness::SixMonths
    } else {
        FundraisingReadiness::NotReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RunwayBaseline, ScenarioAnchors};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn flat_series(weeks: usize, mrr: f64, burn: f64) -> Vec<KpiSnapshot> {
        (0..weeks)
            .map(|_| KpiSnapshot {
                mrr,
                burn_rate: burn,
            })
            .collect()
    }

    #[test]
    fn empty_series_has_no_scenarios() {
        assert!(stress_test(&[]).is_empty());
    }

    #[test]
    fn scenarios_are_ordered_bear_base_bull() {
        let outlooks = stress_test(&flat_series(6, 10_000.0, 4_000.0));
        let names: Vec<_> = outlooks.iter().map(|o| o.scenario).collect();
        assert_eq!(
            names,
            vec![ScenarioName::Bear, ScenarioName::Base, ScenarioName::Bull]
        );
    }

    #[test]
    fn oracle_flat_series_runway_and_targets() {
        // Six weeks at 10k MRR and 4k burn: total burned 24k, seed 180k,
        // cash 156k, zero growth.
        let outlooks = stress_test(&flat_series(6, 10_000.0, 4_000.0));
        let base = outlooks[1];
        assert_approx_tol(base.months_runway, 9.0, 1e-9);
        assert_approx_tol(base.weekly_growth, 0.0, 1e-12);
        assert_approx_tol(base.projected_target6, 10_000.0, 1e-9);
        assert_eq!(base.readiness, FundraisingReadiness::NotReady);

        let bear = outlooks[0];
        assert_approx_tol(bear.weekly_burn, 4_600.0, 1e-9);
        assert_approx_tol(bear.months_runway, 7.8, 1e-9);
        assert_approx_tol(bear.projected_target6, 8_000.0, 1e-9);

        let bull = outlooks[2];
        assert_approx_tol(bull.months_runway, 10.6, 1e-9);
        assert_approx_tol(bull.projected_target6, 12_000.0, 1e-9);
    }

    #[test]
    fn zero_burn_reports_profitable_runway() {
        let outlooks = stress_test(&flat_series(3, 10_000.0, 0.0));
        assert!(outlooks.iter().all(|o| o.months_runway == 99.0));
    }

    #[test]
    fn growth_uses_four_week_lookback_and_floor() {
        let mut series = flat_series(4, 10_000.0, 1_000.0);
        series[3].mrr = 14_000.0;
        let base = stress_test(&series)[1];
        assert_approx_tol(base.weekly_growth, 0.1, 1e-12);

        let mut crash = flat_series(2, 10_000.0, 1_000.0);
        crash[1].mrr = 1_000.0;
        let base = stress_test(&crash)[1];
        assert_approx_tol(base.weekly_growth, GROWTH_FLOOR, 1e-12);

        let single = stress_test(&flat_series(1, 10_000.0, 1_000.0))[1];
        assert_approx_tol(single.weekly_growth, DEFAULT_WEEKLY_GROWTH, 1e-12);
    }

    #[test]
    fn fast_growth_qualifies_for_six_month_readiness() {
        let mut series = flat_series(4, 10_000.0, 1_000.0);
        series[3].mrr = 12_000.0;
        let base = stress_test(&series)[1];
        assert_eq!(base.readiness, FundraisingReadiness::SixMonths);
    }

    #[test]
    fn large_efficient_company_is_ready() {
        let mut series = flat_series(3, 100_000.0, 1_000.0);
        series[2].mrr = 105_000.0;
        let base = stress_test(&series)[1];
        assert!(base.projected_mrr_26 >= 100_000.0);
        assert_eq!(base.readiness, FundraisingReadiness::Ready);
    }

    #[test]
    fn outlooks_feed_anchors_and_baseline() {
        let outlooks = stress_test(&flat_series(6, 10_000.0, 4_000.0));
        let anchors = ScenarioAnchors::from_outlooks(&outlooks);
        assert_approx_tol(anchors.base.expect("base anchor").target6, 10_000.0, 1e-9);
        assert!(anchors.bear.is_some() && anchors.bull.is_some());

        let baseline = RunwayBaseline::from_outlook(&outlooks[1]);
        assert_approx_tol(baseline.months_runway, 9.0, 1e-9);
        assert_approx_tol(baseline.weekly_burn, 4_000.0, 1e-9);
        assert_approx_tol(baseline.weekly_revenue, 10_000.0, 1e-9);
    }
}
