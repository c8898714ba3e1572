use std::f64::consts::PI;

use rand::RngCore;

pub const BAND_PERCENTILES: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];

/// Nearest-rank percentile of an already sorted slice.
///
/// `index = floor(p / 100 * n)`, clamped to the last element. Returns 0.0 for an
/// empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).floor();
    let index = if rank.is_finite() && rank > 0.0 {
        (rank as usize).min(n - 1)
    } else {
        0
    };
    sorted[index]
}

pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(values, p)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Box-Muller standard normal draws over any uniform source. Each transform
/// yields two independent variates; the second is cached for the next call.
pub struct NormalSampler<'a, R: RngCore + ?Sized> {
    rng: &'a mut R,
    cached_normal: Option<f64>,
}

impl<'a, R: RngCore + ?Sized> NormalSampler<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self {
            rng,
            cached_normal: None,
        }
    }

    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.rng.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        let z0 = r * theta.cos();
        let z1 = r * theta.sin();
        self.cached_normal = Some(z1);
        z0
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, proptest};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn percentile_uses_nearest_rank_without_interpolation() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_approx(percentile(&mut values, 25.0), 2.0, EPS);
        assert_approx(percentile(&mut values, 50.0), 3.0, EPS);
        assert_approx(percentile(&mut values, 10.0), 1.0, EPS);
    }

    #[test]
    fn percentile_clamps_to_last_element() {
        let sorted = [1.0, 2.0, 3.0];
        assert_approx(percentile_sorted(&sorted, 100.0), 3.0, EPS);
        assert_approx(percentile_sorted(&sorted, 90.0), 3.0, EPS);
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_approx(percentile_sorted(&[], 50.0), 0.0, EPS);
    }

    #[test]
    fn std_dev_matches_population_formula() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(mean(&values), 5.0, EPS);
        assert_approx(std_dev(&values), 2.0, EPS);
        assert_approx(std_dev(&[3.0]), 0.0, EPS);
    }

    #[test]
    fn seeded_sampler_is_reproducible() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let mut sa = NormalSampler::new(&mut a);
        let mut sb = NormalSampler::new(&mut b);
        for _ in 0..32 {
            assert_eq!(sa.standard_normal().to_bits(), sb.standard_normal().to_bits());
        }
    }

    #[test]
    fn sampler_moments_are_close_to_standard_normal() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut sampler = NormalSampler::new(&mut rng);
        let draws: Vec<f64> = (0..20_000).map(|_| sampler.standard_normal()).collect();
        assert_approx(mean(&draws), 0.0, 0.05);
        assert_approx(std_dev(&draws), 1.0, 0.05);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_band_percentiles_are_ordered(
            seed in any::<u64>(),
            count in 1usize..64
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sampler = NormalSampler::new(&mut rng);
            let mut values: Vec<f64> = (0..count).map(|_| sampler.normal(10.0, 3.0)).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            let picked: Vec<f64> = BAND_PERCENTILES
                .iter()
                .map(|p| percentile_sorted(&values, *p))
                .collect();
            for pair in picked.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn prop_standard_normal_is_finite(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sampler = NormalSampler::new(&mut rng);
            for _ in 0..16 {
                prop_assert!(sampler.standard_normal().is_finite());
            }
        }
    }
}
