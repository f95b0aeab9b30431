//! In-crate engine: voxel-wise linear model fitting.
//!
//! `GlmEngine` implements the [`Engine`](crate::engine::Engine) seam for
//! models that are linear in their parameters. Per included voxel it solves
//! an ordinary least-squares problem against the model's design matrix and
//! produces the standard output set: per-parameter mean/stdev/zstat,
//! `modelfit`, `residuals`, `freeEnergy`, noise statistics, and `finalMVN`.
//!
//! Data layout contract:
//! - buffers cross the seam as full-grid column-major arrays
//!   (`nx*ny*nz*points` values, first index fastest, time slowest);
//! - internally only included voxels are stored (voxel-major, one series
//!   per voxel);
//! - reads reinflate the full grid with zeros outside the mask.

use std::collections::BTreeMap;

use nalgebra::DVector;
use rayon::prelude::*;

use crate::engine::model::Model;
use crate::engine::{registry, Engine, EngineError, RunLog, RunOptions};
use crate::math::DesignSolver;

/// The voxel grid extent and inclusion mask.
#[derive(Debug, Clone)]
struct Extent {
    nx: usize,
    ny: usize,
    nz: usize,
    /// Column-major linear indices of included voxels.
    included: Vec<usize>,
}

impl Extent {
    fn grid_len(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}

/// One named voxel-data item: a series per included voxel.
#[derive(Debug, Clone)]
struct VoxelSeries {
    points: usize,
    /// Voxel-major: voxel `m`'s series occupies `[m*points, (m+1)*points)`.
    masked: Vec<f32>,
}

#[derive(Default)]
pub struct GlmEngine {
    options: RunOptions,
    extent: Option<Extent>,
    data: BTreeMap<String, VoxelSeries>,
}

impl GlmEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn extent(&self) -> Result<&Extent, EngineError> {
        self.extent.as_ref().ok_or_else(|| {
            EngineError::DataShape("extent must be established before voxel data".to_string())
        })
    }

    fn store(&mut self, name: &str, points: usize, masked: Vec<f32>) {
        self.data
            .insert(name.to_string(), VoxelSeries { points, masked });
    }
}

/// Per-voxel fit products, kept in solve order so output assembly is a
/// straight copy.
struct VoxelFit {
    means: Vec<f64>,
    stdevs: Vec<f64>,
    zstats: Vec<f64>,
    fit: Vec<f64>,
    residuals: Vec<f64>,
    noise_mean: f64,
    noise_stdev: f64,
    free_energy: f64,
    mvn: Vec<f64>,
}

impl Engine for GlmEngine {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.options.set(name, value);
        Ok(())
    }

    fn get_option(&self, name: &str) -> Option<String> {
        self.options.get(name).map(str::to_string)
    }

    fn get_option_bool(&self, name: &str) -> bool {
        self.options.get_bool(name)
    }

    fn options(&self) -> &RunOptions {
        &self.options
    }

    fn set_extent(
        &mut self,
        nx: usize,
        ny: usize,
        nz: usize,
        mask: &[i32],
    ) -> Result<(), EngineError> {
        let len = nx * ny * nz;
        if len == 0 {
            return Err(EngineError::DataShape(format!(
                "degenerate extent {nx}x{ny}x{nz}"
            )));
        }
        if mask.len() != len {
            return Err(EngineError::DataShape(format!(
                "mask has {} flags but extent {nx}x{ny}x{nz} requires {len}",
                mask.len()
            )));
        }
        let included = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &flag)| (flag != 0).then_some(i))
            .collect();
        self.extent = Some(Extent { nx, ny, nz, included });
        Ok(())
    }

    fn set_voxel_data(
        &mut self,
        name: &str,
        points_per_voxel: usize,
        data: &[f32],
    ) -> Result<(), EngineError> {
        let extent = self.extent()?;
        let grid_len = extent.grid_len();
        if points_per_voxel == 0 || data.len() != grid_len * points_per_voxel {
            return Err(EngineError::DataShape(format!(
                "voxel data `{name}` has {} values, expected {} ({} voxels x {} points)",
                data.len(),
                grid_len * points_per_voxel,
                grid_len,
                points_per_voxel
            )));
        }

        // Full-grid column-major in; keep only included voxels.
        let mut masked = Vec::with_capacity(extent.included.len() * points_per_voxel);
        for &v in &extent.included {
            for t in 0..points_per_voxel {
                masked.push(data[v + t * grid_len]);
            }
        }
        self.store(name, points_per_voxel, masked);
        Ok(())
    }

    fn voxel_data_len(&self, name: &str) -> Result<usize, EngineError> {
        self.data
            .get(name)
            .map(|s| s.points)
            .ok_or_else(|| EngineError::DataNotFound(name.to_string()))
    }

    fn get_voxel_data(&self, name: &str, out: &mut [f32]) -> Result<(), EngineError> {
        let extent = self.extent()?;
        let series = self
            .data
            .get(name)
            .ok_or_else(|| EngineError::DataNotFound(name.to_string()))?;
        let grid_len = extent.grid_len();
        if out.len() != grid_len * series.points {
            return Err(EngineError::DataShape(format!(
                "output buffer for `{name}` has {} values, expected {}",
                out.len(),
                grid_len * series.points
            )));
        }

        out.fill(0.0);
        for (m, &v) in extent.included.iter().enumerate() {
            for t in 0..series.points {
                out[v + t * grid_len] = series.masked[m * series.points + t];
            }
        }
        Ok(())
    }

    fn run(&mut self, log: &mut RunLog) -> Result<(), EngineError> {
        let model_name = self.options.get_string("model")?;
        let mut model = registry::instantiate(&model_name)?;
        log.line(format!("Model: {model_name}"));
        model.initialize(&self.options, log)?;

        let params = model.parameters();
        let p = params.len();
        if p == 0 {
            return Err(EngineError::Numeric(format!(
                "model `{model_name}` declares no parameters"
            )));
        }

        let data = self
            .data
            .get("data")
            .ok_or_else(|| EngineError::DataNotFound("data".to_string()))?;
        let n = data.points;

        let x = model.design(n)?;
        if x.nrows() != n || x.ncols() != p {
            return Err(EngineError::Numeric(format!(
                "model `{model_name}` produced a {}x{} design for {n} points and {p} parameters",
                x.nrows(),
                x.ncols()
            )));
        }
        let solver = DesignSolver::new(&x)
            .ok_or_else(|| EngineError::Numeric("design matrix is too ill-conditioned".to_string()))?;

        let extent = self.extent()?;
        let n_voxels = extent.included.len();
        log.line(format!(
            "Fitting {n_voxels} of {} voxels ({n} points, {p} parameters)",
            extent.grid_len()
        ));

        let dof = if n > p { n - p } else { 1 };
        let masked = &data.masked;

        let fits: Vec<VoxelFit> = (0..n_voxels)
            .into_par_iter()
            .map(|m| {
                let y = DVector::from_iterator(
                    n,
                    masked[m * n..(m + 1) * n].iter().map(|&v| f64::from(v)),
                );
                let beta = solver.solve(&y);

                let fit = &x * &beta;
                let residuals = &y - &fit;
                let sse: f64 = residuals.iter().map(|r| r * r).sum();
                let s2 = sse / dof as f64;
                let s = s2.sqrt();

                let cov = solver.covariance_factor();
                let stdevs: Vec<f64> = (0..p)
                    .map(|j| (s2 * cov[(j, j)]).max(0.0).sqrt())
                    .collect();
                let zstats: Vec<f64> = (0..p)
                    .map(|j| if stdevs[j] > 0.0 { beta[j] / stdevs[j] } else { 0.0 })
                    .collect();

                let n_f = n as f64;
                let free_energy =
                    -0.5 * (n_f * (sse / n_f).max(1e-12).ln() + (p as f64) * n_f.ln());

                let mut mvn = Vec::with_capacity(p + p * (p + 1) / 2);
                mvn.extend(beta.iter().copied());
                for i in 0..p {
                    for j in i..p {
                        mvn.push(s2 * cov[(i, j)]);
                    }
                }

                VoxelFit {
                    means: beta.iter().copied().collect(),
                    stdevs,
                    zstats,
                    fit: fit.iter().copied().collect(),
                    residuals: residuals.iter().copied().collect(),
                    noise_mean: s,
                    noise_stdev: s / (2.0 * dof as f64).sqrt(),
                    free_energy,
                    mvn,
                }
            })
            .collect();

        // Per-parameter scalar outputs.
        for (j, param) in params.iter().enumerate() {
            self.store(
                &format!("mean_{}", param.name),
                1,
                fits.iter().map(|f| f.means[j] as f32).collect(),
            );
            self.store(
                &format!("stdev_{}", param.name),
                1,
                fits.iter().map(|f| f.stdevs[j] as f32).collect(),
            );
            self.store(
                &format!("zstat_{}", param.name),
                1,
                fits.iter().map(|f| f.zstats[j] as f32).collect(),
            );
        }

        // Series outputs.
        self.store(
            "modelfit",
            n,
            fits.iter()
                .flat_map(|f| f.fit.iter().map(|&v| v as f32))
                .collect(),
        );
        self.store(
            "residuals",
            n,
            fits.iter()
                .flat_map(|f| f.residuals.iter().map(|&v| v as f32))
                .collect(),
        );

        // Scalar diagnostics.
        self.store(
            "freeEnergy",
            1,
            fits.iter().map(|f| f.free_energy as f32).collect(),
        );
        self.store(
            "noise_means",
            1,
            fits.iter().map(|f| f.noise_mean as f32).collect(),
        );
        self.store(
            "noise_stdevs",
            1,
            fits.iter().map(|f| f.noise_stdev as f32).collect(),
        );

        let mvn_len = p + p * (p + 1) / 2;
        self.store(
            "finalMVN",
            mvn_len,
            fits.iter()
                .flat_map(|f| f.mvn.iter().map(|&v| v as f32))
                .collect(),
        );

        // Model-specific extra outputs, where the model can produce them.
        for name in model.extra_outputs() {
            let mut series: Vec<f32> = Vec::new();
            let mut points = 1;
            let mut available = true;
            for f in &fits {
                let beta = DVector::from_vec(f.means.clone());
                match model.extra_series(&name, &beta) {
                    Some(values) => {
                        points = values.len().max(1);
                        series.extend(values.iter().map(|&v| v as f32));
                    }
                    None => {
                        available = false;
                        break;
                    }
                }
            }
            if available {
                self.store(&name, points, series);
            } else {
                log.warn(format!("model `{model_name}` declares output `{name}` but did not produce it"));
            }
        }

        log.line("Fit complete".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_extent(nx: usize, ny: usize, nz: usize, mask: &[i32]) -> GlmEngine {
        let mut engine = GlmEngine::new();
        engine.set_extent(nx, ny, nz, mask).unwrap();
        engine
    }

    #[test]
    fn voxel_data_round_trips_with_zeros_outside_mask() {
        // 2x1x1 grid, second voxel excluded.
        let mut engine = engine_with_extent(2, 1, 1, &[1, 0]);
        engine.set_voxel_data("data", 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let mut out = vec![f32::NAN; 4];
        engine.get_voxel_data("data", &mut out).unwrap();
        // Column-major: (voxel0 t0, voxel1 t0, voxel0 t1, voxel1 t1).
        assert_eq!(out, vec![1.0, 0.0, 3.0, 0.0]);
        assert_eq!(engine.voxel_data_len("data").unwrap(), 2);
    }

    #[test]
    fn voxel_data_requires_an_extent_first() {
        let mut engine = GlmEngine::new();
        let err = engine.set_voxel_data("data", 1, &[1.0]).unwrap_err();
        assert!(matches!(err, EngineError::DataShape(_)));
    }

    #[test]
    fn run_recovers_exact_polynomial_coefficients() {
        registry::init_defaults();

        // One voxel, series y(t) = 2 + 3t (degree 1, noise-free).
        let mut engine = engine_with_extent(1, 1, 1, &[1]);
        let series: Vec<f32> = (0..5).map(|t| 2.0 + 3.0 * t as f32).collect();
        engine.set_voxel_data("data", 5, &series).unwrap();
        engine.set_option("model", "poly").unwrap();
        engine.set_option("degree", "1").unwrap();

        let mut log = RunLog::start();
        engine.run(&mut log).unwrap();

        let mut c0 = vec![0.0f32; 1];
        let mut c1 = vec![0.0f32; 1];
        engine.get_voxel_data("mean_c0", &mut c0).unwrap();
        engine.get_voxel_data("mean_c1", &mut c1).unwrap();
        assert!((c0[0] - 2.0).abs() < 1e-4);
        assert!((c1[0] - 3.0).abs() < 1e-4);

        // Noise-free fit reproduces the data.
        assert_eq!(engine.voxel_data_len("modelfit").unwrap(), 5);
        let mut fit = vec![0.0f32; 5];
        engine.get_voxel_data("modelfit", &mut fit).unwrap();
        for (got, want) in fit.iter().zip(series.iter()) {
            assert!((got - want).abs() < 1e-3);
        }

        // Zero residual variance means zero parameter stdev.
        let mut sd = vec![0.0f32; 1];
        engine.get_voxel_data("stdev_c0", &mut sd).unwrap();
        assert!(sd[0].abs() < 1e-3);

        assert!(log.text().contains("Model: poly"));
    }

    #[test]
    fn all_excluded_mask_still_runs_and_reads_back_zeros() {
        registry::init_defaults();

        let mut engine = engine_with_extent(2, 2, 1, &[0, 0, 0, 0]);
        engine.set_voxel_data("data", 3, &vec![0.0; 12]).unwrap();
        engine.set_option("model", "poly").unwrap();
        engine.set_option("degree", "1").unwrap();

        let mut log = RunLog::start();
        engine.run(&mut log).unwrap();

        let mut out = vec![f32::NAN; 4];
        engine.get_voxel_data("mean_c0", &mut out).unwrap();
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn run_is_deterministic() {
        registry::init_defaults();

        let series: Vec<f32> = (0..6).map(|t| 1.0 + 0.5 * t as f32 + 0.01 * (t * t) as f32).collect();
        let run_once = || {
            let mut engine = engine_with_extent(1, 1, 1, &[1]);
            engine.set_voxel_data("data", 6, &series).unwrap();
            engine.set_option("model", "poly").unwrap();
            let mut log = RunLog::start();
            engine.run(&mut log).unwrap();
            let mut out = vec![0.0f32; 3];
            // finalMVN: 3 means + 6 covariance entries for p=3.
            assert_eq!(engine.voxel_data_len("finalMVN").unwrap(), 9);
            engine.get_voxel_data("mean_c1", &mut out[..1]).unwrap();
            engine.get_voxel_data("mean_c0", &mut out[1..2]).unwrap();
            engine.get_voxel_data("mean_c2", &mut out[2..]).unwrap();
            out
        };

        assert_eq!(run_once(), run_once());
    }

    #[test]
    fn missing_main_data_is_an_engine_error() {
        registry::init_defaults();

        let mut engine = engine_with_extent(1, 1, 1, &[1]);
        engine.set_option("model", "poly").unwrap();
        let mut log = RunLog::start();
        let err = engine.run(&mut log).unwrap_err();
        assert!(matches!(err, EngineError::DataNotFound(_)));
    }
}
