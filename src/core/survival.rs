use chrono::{Local, NaiveDate, TimeDelta};
use rand::RngCore;
use tracing::debug;

use super::scenarios::estimated_cash;
use super::stats::{NormalSampler, mean, percentile, std_dev};
use super::types::{KpiSnapshot, SurvivalLabel, SurvivalReport};

pub const DEFAULT_SURVIVAL_SIMULATIONS: u32 = 1_000;
const MIN_SNAPSHOTS: usize = 3;
const MAX_WEEKS: u32 = 54;
const FUNDRAISE_LEAD_DAYS: i64 = 180;

pub fn survival_analysis<R: RngCore + ?Sized>(
    snapshots: &[KpiSnapshot],
    simulations: u32,
    rng: &mut R,
) -> Option<SurvivalReport> {
    survival_analysis_on(snapshots, simulations, rng, Local::now().date_naive())
}

/// Monte Carlo cash-out timing from weekly net burn.
///
/// Needs at least three snapshots and one simulation; otherwise there is no
/// distribution to report.
pub fn survival_analysis_on<R: RngCore + ?Sized>(
    snapshots: &[KpiSnapshot],
    simulations: u32,
    rng: &mut R,
    today: NaiveDate,
) -> Option<SurvivalReport> {
    if snapshots.len() < MIN_SNAPSHOTS || simulations == 0 {
        return None;
    }

    let net_weekly: Vec<f64> = snapshots
        .iter()
        .map(|s| if s.burn_rate.is_finite() { -s.burn_rate } else { 0.0 })
        .collect();
    let mu = mean(&net_weekly);
    let sigma = std_dev(&net_weekly).max(1.0);

    let last_mrr = snapshots
        .last()
        .map(|s| s.mrr)
        .filter(|mrr| mrr.is_finite() && *mrr > 0.0)
        .unwrap_or(1.0);
    let current_cash = estimated_cash(snapshots, last_mrr);

    let mut sampler = NormalSampler::new(rng);
    let mut zero_cash_days = Vec::with_capacity(simulations as usize);
    for _ in 0..simulations {
        let mut cash = current_cash;
        let mut exhausted_at = None;
        for week in 1..=MAX_WEEKS {
            cash += sampler.normal(mu, sigma);
            if cash <= 0.0 && exhausted_at.is_none() {
                exhausted_at = Some(week * 7);
            }
        }
        zero_cash_days.push(exhausted_at.unwrap_or(MAX_WEEKS * 7 + 1));
    }

    let total = simulations as f64;
    let ruin_within = |days: u32| zero_cash_days.iter().filter(|d| **d <= days).count() as f64 / total;
    let p90 = ruin_within(90);
    let p180 = ruin_within(180);
    let p365 = ruin_within(365);

    let mut days: Vec<f64> = zero_cash_days.iter().map(|d| *d as f64).collect();
    let median_day = percentile(&mut days, 50.0) as i64;

    let score = ((1.0 - p365) * 100.0).clamp(0.0, 100.0) as u32;
    let deadline_days = median_day - FUNDRAISE_LEAD_DAYS;
    let fundraising_deadline = if deadline_days > 0 {
        TimeDelta::try_days(deadline_days).and_then(|d| today.checked_add_signed(d))
    } else {
        None
    };

    debug!(simulations, current_cash, mu, sigma, score, "survival analysis finished");

    Some(SurvivalReport {
        score,
        label: label_for(score),
        probability_ruin_90d: round4(p90),
        probability_ruin_180d: round4(p180),
        probability_ruin_365d: round4(p365),
        expected_zero_cash_day: (median_day as u32).min(MAX_WEEKS * 7),
        fundraising_deadline,
    })
}

fn label_for(score: u32) -> SurvivalLabel {
    match score {
        80.. => SurvivalLabel::Safe,
        65..=79 => SurvivalLabel::LowRisk,
        45..=64 => SurvivalLabel::ModerateRisk,
        25..=44 => SurvivalLabel::HighRisk,
        _ => SurvivalLabel::Critical,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
