use rand::RngCore;
use tracing::debug;

use super::stats::{BAND_PERCENTILES, NormalSampler, percentile_sorted};
use super::types::{AnchorMarker, PercentileBand, ScenarioAnchors, SimulationInput};

/// Steps between the start value and an anchor's target.
pub const ANCHOR_PERIOD: usize = 6;
pub const DRIFT_MIN: f64 = -0.10;
pub const DRIFT_MAX: f64 = 0.30;

/// Solves `start * (1 + d)^6 = target` for `d`, clamped to `DRIFT_MIN..=DRIFT_MAX`.
pub fn derive_drift(start_value: f64, anchor_target6: f64) -> f64 {
    if !(start_value > 0.0 && start_value.is_finite()) {
        return DRIFT_MIN;
    }
    if !(anchor_target6 > 0.0 && anchor_target6.is_finite()) {
        return DRIFT_MIN;
    }

    let ratio = anchor_target6 / start_value;
    let drift = ratio.powf(1.0 / ANCHOR_PERIOD as f64) - 1.0;
    if drift.is_finite() {
        drift.clamp(DRIFT_MIN, DRIFT_MAX)
    } else {
        DRIFT_MAX
    }
}

/// Runs the Monte Carlo projection with the thread-local ambient RNG.
///
/// The drift is taken from the `base` anchor. Without it, or with a start value
/// that is not positive, there is nothing to project and the result is empty.
pub fn simulate(input: &SimulationInput, anchors: Option<&ScenarioAnchors>) -> Vec<PercentileBand> {
    let mut rng = rand::thread_rng();
    simulate_with_rng(input, anchors, &mut rng)
}

pub fn simulate_with_rng<R: RngCore + ?Sized>(
    input: &SimulationInput,
    anchors: Option<&ScenarioAnchors>,
    rng: &mut R,
) -> Vec<PercentileBand> {
    if !(input.start_value > 0.0 && input.start_value.is_finite()) {
        debug!(start_value = input.start_value, "skipping simulation: start value not positive");
        return Vec::new();
    }
    let Some(base) = anchors.and_then(|a| a.base) else {
        debug!("skipping simulation: no base anchor");
        return Vec::new();
    };

    let drift_per_step = derive_drift(input.start_value, base.target6);
    let anchored = SimulationInput {
        drift_per_step,
        ..*input
    };
    let bands = project_bands(&anchored, rng);
    debug!(
        paths = input.path_count,
        steps = input.horizon_steps,
        drift_per_step,
        bands = bands.len(),
        "simulation finished"
    );
    bands
}

/// Projects bands using `input.drift_per_step` (clamped) directly, without an
/// anchor.
pub fn project_bands<R: RngCore + ?Sized>(
    input: &SimulationInput,
    rng: &mut R,
) -> Vec<PercentileBand> {
    if !(input.start_value > 0.0 && input.start_value.is_finite()) {
        return Vec::new();
    }

    let drift = if input.drift_per_step.is_nan() {
        0.0
    } else {
        input.drift_per_step.clamp(DRIFT_MIN, DRIFT_MAX)
    };
    let paths = generate_paths(input, drift, rng);
    reduce_to_bands(&paths, input.horizon_steps)
}

fn generate_paths<R: RngCore + ?Sized>(
    input: &SimulationInput,
    drift: f64,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut sampler = NormalSampler::new(rng);
    let mut paths = Vec::with_capacity(input.path_count);

    for _ in 0..input.path_count {
        let mut path = Vec::with_capacity(input.horizon_steps + 1);
        let mut value = input.start_value;
        path.push(value);
        for _ in 0..input.horizon_steps {
            let noise = input.volatility_per_step * sampler.standard_normal();
            // Floor before the value compounds into the next step.
            value = (value * (1.0 + drift + noise)).max(0.0);
            path.push(value);
        }
        paths.push(path);
    }

    paths
}

fn reduce_to_bands(paths: &[Vec<f64>], horizon_steps: usize) -> Vec<PercentileBand> {
    let mut column = Vec::with_capacity(paths.len());
    (0..=horizon_steps)
        .map(|step| {
            column.clear();
            column.extend(paths.iter().map(|path| path[step]));
            column.sort_by(|a, b| a.total_cmp(b));
            let [p10, p25, p50, p75, p90] = BAND_PERCENTILES.map(|p| percentile_sorted(&column, p));
            PercentileBand {
                step,
                p10,
                p25,
                p50,
                p75,
                p90,
            }
        })
        .collect()
}

/// Anchor targets that fall inside the horizon, placed at `ANCHOR_PERIOD`.
pub fn anchor_markers(anchors: &ScenarioAnchors, horizon_steps: usize) -> Vec<AnchorMarker> {
    if horizon_steps < ANCHOR_PERIOD {
        return Vec::new();
    }
    anchors
        .iter()
        .filter(|(_, anchor)| anchor.target6.is_finite())
        .map(|(scenario, anchor)| AnchorMarker {
            scenario,
            step: ANCHOR_PERIOD,
            value: anchor.target6,
        })
        .collect()
}
