//! The run orchestrator.
//!
//! One call marshals the three host inputs into the engine, runs the fit,
//! and assembles the result record:
//!
//! validate -> defaults -> extent/mask -> main data -> model libraries ->
//! classify record -> enumerate outputs -> run -> assemble
//!
//! All operations execute in strict program order; the only long call is
//! the engine's `run`, which is blocking and non-cancelable from here.
//! Nothing is retried: the first failure aborts the run, and engine-raised
//! failures cross into the error taxonomy at this layer's single
//! translation point.

use ndarray::ArrayD;

use crate::domain::{FitOutput, RunRecord, Value};
use crate::engine::{registry, Engine, GlmEngine, RunLog};
use crate::error::RunError;
use crate::marshal;
use crate::result;

/// The name under which the mandatory main data array is bound.
const MAIN_DATA_KEY: &str = "data";

/// Execute one fitting run with the in-crate engine.
///
/// Takes exactly three inputs: a 4D real data array, a 3D boolean mask
/// whose dimensions match the first three of the data, and a record of
/// options. Produces the named output arrays plus the run log, or fails
/// with a categorized [`RunError`].
pub fn run_fit(
    data: &ArrayD<f64>,
    mask: &ArrayD<bool>,
    record: &RunRecord,
) -> Result<FitOutput, RunError> {
    let mut engine = GlmEngine::new();
    run_fit_with_engine(&mut engine, data, mask, record)
}

/// Execute one fitting run against a caller-supplied engine.
pub fn run_fit_with_engine(
    engine: &mut dyn Engine,
    data: &ArrayD<f64>,
    mask: &ArrayD<bool>,
    record: &RunRecord,
) -> Result<FitOutput, RunError> {
    // 1) Check the three inputs before anything touches the engine.
    let dims = marshal::validate_input(data, mask)?;

    // 2) Process-wide defaults; idempotent on every invocation.
    registry::init_defaults();

    // 3) Establish the extent and inclusion mask. Every subsequent array is
    //    dimension-checked against it.
    marshal::bind_extent(engine, &dims, mask)?;

    // 4) Bind the main data.
    marshal::bind_voxel_f64(engine, MAIN_DATA_KEY, data.view(), &dims)?;

    // 5) Load model plug-in libraries. Failures warn and never abort: the
    //    model may still resolve through libraries already loaded.
    if let Some(value) = record.get(marshal::classify::LOADMODELS_FIELD) {
        let Value::Str(list) = value else {
            return Err(RunError::validation(format!(
                "`{}` field must be textual",
                marshal::classify::LOADMODELS_FIELD
            )));
        };
        crate::engine::library::load_model_libraries(list);
    }

    // 6) Resolve the model's option schema, then classify and apply every
    //    record field.
    let model_options = marshal::resolve_model_options(record)?;
    marshal::apply_record(engine, record, &dims, &model_options)?;

    // 7) Decide which outputs to request; depends on the final
    //    configuration.
    let outputs = result::enumerate_outputs(engine)?;

    // 8) Run the fit, capturing the log.
    let mut log = RunLog::start();
    engine.run(&mut log)?;
    let log = log.finish();

    // 9) Reshape every output back into a dimensioned host array.
    result::assemble_results(engine, &outputs, &dims, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::{IxDyn, ShapeBuilder};

    fn poly_series_data(coeffs: &[[f64; 2]; 4], nt: usize) -> ArrayD<f64> {
        // 2x2x1 grid in column-major voxel order.
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 1, nt]).f());
        for j in 0..2 {
            for i in 0..2 {
                let c = coeffs[i + 2 * j];
                for t in 0..nt {
                    data[[i, j, 0, t]] = c[0] + c[1] * t as f64;
                }
            }
        }
        data
    }

    fn all_true_mask() -> ArrayD<bool> {
        ArrayD::from_elem(IxDyn(&[2, 2, 1]), true)
    }

    #[test]
    fn end_to_end_poly_run_returns_fitted_coefficients() {
        let coeffs = [[1.0, 0.5], [2.0, -0.25], [3.0, 1.5], [-4.0, 2.0]];
        let data = poly_series_data(&coeffs, 5);
        let mask = all_true_mask();

        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("degree", 1.0);
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();

        assert_eq!(output.field_names(), vec!["mean_c0", "mean_c1", "log"]);

        let c0 = output.get("mean_c0").unwrap();
        let c1 = output.get("mean_c1").unwrap();
        assert_eq!(c0.shape(), &[2, 2, 1]);
        for j in 0..2 {
            for i in 0..2 {
                let want = coeffs[i + 2 * j];
                assert!((f64::from(c0[[i, j, 0]]) - want[0]).abs() < 1e-3);
                assert!((f64::from(c1[[i, j, 0]]) - want[1]).abs() < 1e-3);
            }
        }
        assert!(output.log.contains("Fit complete"));
    }

    #[test]
    fn default_degree_poly_matches_end_to_end_scenario() {
        // Main data (2,2,1,5), all-true mask, {model: poly, save-mean}:
        // exactly mean_c0..mean_c2 plus the log, each (2,2,1).
        let data = poly_series_data(&[[1.0, 1.0]; 4], 5);
        let mask = all_true_mask();

        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();
        assert_eq!(
            output.field_names(),
            vec!["mean_c0", "mean_c1", "mean_c2", "log"]
        );
        for item in &output.items {
            assert_eq!(item.array.shape(), &[2, 2, 1]);
        }
    }

    #[test]
    fn identical_inputs_produce_identical_arrays() {
        let data = poly_series_data(&[[1.0, 0.5], [2.0, 1.0], [0.5, 0.1], [3.0, 0.0]], 6);
        let mask = all_true_mask();
        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("degree", 1.0);
        record.set("save_mean", true);
        record.set("save_model_fit", true);

        let a = run_fit(&data, &mask, &record).unwrap();
        let b = run_fit(&data, &mask, &record).unwrap();
        for (x, y) in a.items.iter().zip(b.items.iter()) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.array, y.array);
        }
    }

    #[test]
    fn included_values_round_trip_through_the_engine() {
        // Degree-0 fit of a constant series returns the per-voxel value.
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 1, 3]).f());
        for j in 0..2 {
            for i in 0..2 {
                for t in 0..3 {
                    data[[i, j, 0, t]] = 10.0 * (i + 2 * j) as f64 + 1.25;
                }
            }
        }
        // Exclude one voxel to check masked positions stay zero.
        let mut mask = all_true_mask();
        mask[[1, 1, 0]] = false;

        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("degree", 0.0);
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();
        let c0 = output.get("mean_c0").unwrap();
        assert!((f64::from(c0[[0, 0, 0]]) - 1.25).abs() < 1e-4);
        assert!((f64::from(c0[[1, 0, 0]]) - 11.25).abs() < 1e-4);
        assert!((f64::from(c0[[0, 1, 0]]) - 21.25).abs() < 1e-4);
        assert_eq!(c0[[1, 1, 0]], 0.0);
    }

    #[test]
    fn all_excluded_mask_yields_shaped_zero_outputs() {
        let data = poly_series_data(&[[1.0, 1.0]; 4], 5);
        let mask = ArrayD::from_elem(IxDyn(&[2, 2, 1]), false);
        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();
        let c0 = output.get("mean_c0").unwrap();
        assert_eq!(c0.shape(), &[2, 2, 1]);
        assert!(c0.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn mismatched_option_array_fails_before_the_engine_runs() {
        let data = poly_series_data(&[[1.0, 1.0]; 4], 5);
        let mask = all_true_mask();
        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set(
            "suppdata",
            ArrayD::<f64>::zeros(IxDyn(&[3, 2, 1, 5])),
        );

        let err = run_fit(&data, &mask, &record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn no_switches_forces_the_model_fit_output() {
        let data = poly_series_data(&[[2.0, 0.5]; 4], 5);
        let mask = all_true_mask();
        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("degree", 1.0);

        let output = run_fit(&data, &mask, &record).unwrap();
        assert_eq!(output.field_names(), vec!["modelfit", "log"]);
        assert_eq!(output.get("modelfit").unwrap().shape(), &[2, 2, 1, 5]);
    }

    #[test]
    fn design_model_runs_from_a_spooled_basis_matrix() {
        // Basis columns: constant and ramp; equivalent to degree-1 poly.
        let mut basis = ArrayD::<f64>::zeros(IxDyn(&[5, 2]));
        for t in 0..5 {
            basis[[t, 0]] = 1.0;
            basis[[t, 1]] = t as f64;
        }

        let coeffs = [[1.0, 2.0], [0.0, -1.0], [4.0, 0.5], [2.5, 2.5]];
        let data = poly_series_data(&coeffs, 5);
        let mask = all_true_mask();

        let mut record = RunRecord::new();
        record.set("model", "design");
        record.set("basis", basis);
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();
        assert_eq!(
            output.field_names(),
            vec!["mean_beta1", "mean_beta2", "log"]
        );
        let b1 = output.get("mean_beta1").unwrap();
        let b2 = output.get("mean_beta2").unwrap();
        for j in 0..2 {
            for i in 0..2 {
                let want = coeffs[i + 2 * j];
                assert!((f64::from(b1[[i, j, 0]]) - want[0]).abs() < 1e-3);
                assert!((f64::from(b2[[i, j, 0]]) - want[1]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn unknown_model_aborts_with_an_engine_error() {
        let data = poly_series_data(&[[1.0, 1.0]; 4], 5);
        let mask = all_true_mask();
        let mut record = RunRecord::new();
        record.set("model", "no-such-model");

        let err = run_fit(&data, &mask, &record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }

    #[test]
    fn bad_loadmodels_paths_warn_but_do_not_abort() {
        let data = poly_series_data(&[[1.0, 1.0]; 4], 5);
        let mask = all_true_mask();
        let mut record = RunRecord::new();
        record.set("loadmodels", "/nonexistent/libextra.so");
        record.set("model", "poly");
        record.set("save_mean", true);

        let output = run_fit(&data, &mask, &record).unwrap();
        assert!(output.get("mean_c0").is_some());
    }
}
