//! Synthetic 4D dataset generation.
//!
//! Each voxel gets its own polynomial coefficients; the series is the
//! polynomial evaluated at time indices 0..nt-1 plus Gaussian noise.
//! Generation is fully seeded, so the same configuration always produces
//! the same dataset — useful both for the demo CLI and for tests that
//! verify coefficient recovery.

use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::DemoConfig;
use crate::error::RunError;

#[derive(Debug, Clone)]
pub struct SampleDataset {
    /// 4D data array `(nx, ny, nz, nt)`, column-major.
    pub data: ArrayD<f64>,
    /// 3D all-true inclusion mask `(nx, ny, nz)`.
    pub mask: ArrayD<bool>,
    /// True coefficients per voxel, in column-major voxel order.
    pub coeffs: Vec<Vec<f64>>,
}

/// Generate a dataset from per-voxel random polynomial coefficients.
pub fn generate_dataset(config: &DemoConfig) -> Result<SampleDataset, RunError> {
    let (nx, ny, nz, nt) = (config.nx, config.ny, config.nz, config.nt);
    if nx * ny * nz == 0 {
        return Err(RunError::validation("grid extent must be non-empty"));
    }
    if nt <= config.degree {
        return Err(RunError::validation(format!(
            "series length {nt} cannot determine a degree-{} polynomial",
            config.degree
        )));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(RunError::validation("noise standard deviation must be finite and >= 0"));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| RunError::validation(format!("noise distribution error: {e}")))?;

    let mut data = ArrayD::<f64>::zeros(IxDyn(&[nx, ny, nz, nt]).f());
    let mut coeffs = Vec::with_capacity(nx * ny * nz);

    // Column-major voxel order: first index fastest.
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let c: Vec<f64> = (0..=config.degree)
                    .map(|order| {
                        // Higher orders get smaller magnitudes so the series
                        // stays well-scaled at large t.
                        let scale = 1.0 / (order as f64 + 1.0).powi(2);
                        rng.gen_range(-1.0..=1.0) * scale + if order == 0 { 5.0 } else { 0.0 }
                    })
                    .collect();

                for t in 0..nt {
                    let tf = t as f64;
                    let y: f64 = c
                        .iter()
                        .enumerate()
                        .map(|(order, &cj)| cj * tf.powi(order as i32))
                        .sum();
                    data[[i, j, k, t]] = y + noise.sample(&mut rng);
                }
                coeffs.push(c);
            }
        }
    }

    // Generation order above is column-major already, but `coeffs` must be
    // addressed the same way the engine addresses voxels.
    debug_assert_eq!(coeffs.len(), nx * ny * nz);

    let mask = ArrayD::from_elem(IxDyn(&[nx, ny, nz]), true);

    Ok(SampleDataset { data, mask, coeffs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DemoConfig {
        DemoConfig {
            nx: 2,
            ny: 3,
            nz: 1,
            nt: 8,
            model: "poly".to_string(),
            degree: 2,
            seed: 42,
            noise_sd: 0.0,
            save_mean: true,
            save_std: false,
            save_zstat: false,
            save_model_fit: false,
            save_residuals: false,
            export: None,
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_dataset(&config()).unwrap();
        let b = generate_dataset(&config()).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.coeffs, b.coeffs);

        let mut other = config();
        other.seed = 43;
        let c = generate_dataset(&other).unwrap();
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn noise_free_series_match_their_coefficients() {
        let sample = generate_dataset(&config()).unwrap();
        // Voxel (1, 2, 0) has column-major linear index 1 + 2*2.
        let c = &sample.coeffs[5];
        for t in 0..8 {
            let tf = t as f64;
            let want = c[0] + c[1] * tf + c[2] * tf * tf;
            assert!((sample.data[[1, 2, 0, t]] - want).abs() < 1e-12);
        }
    }

    #[test]
    fn underdetermined_series_are_rejected() {
        let mut cfg = config();
        cfg.nt = 2;
        assert!(generate_dataset(&cfg).is_err());
    }
}
