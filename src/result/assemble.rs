//! Reshaping engine output buffers into dimensioned host arrays.
//!
//! For every requested output, in order: query its per-voxel series length,
//! allocate a 3D array (length 1) or a 4D array (series length as the 4th
//! dimension) in column-major element order, and copy the engine's flat
//! buffer in unmodified. The run's log text is attached last under the
//! fixed field name `log`.
//!
//! No partial results: the first failed query fails the whole assembly and
//! nothing is returned.

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::domain::{FitOutput, OutputItem};
use crate::engine::Engine;
use crate::error::{ErrorKind, RunError};

/// Pull every named output from the engine and build the result record.
pub fn assemble_results(
    engine: &dyn Engine,
    outputs: &[String],
    dims: &[usize; 4],
    log: String,
) -> Result<FitOutput, RunError> {
    let mut items = Vec::with_capacity(outputs.len());

    for name in outputs {
        let points = engine.voxel_data_len(name)?;

        let shape: Vec<usize> = if points > 1 {
            vec![dims[0], dims[1], dims[2], points]
        } else {
            vec![dims[0], dims[1], dims[2]]
        };

        let mut buf = vec![0.0f32; shape.iter().product()];
        engine.get_voxel_data(name, &mut buf)?;

        let array = ArrayD::from_shape_vec(IxDyn(&shape).f(), buf)
            .map_err(|e| RunError::new(ErrorKind::Unknown, format!("output `{name}`: {e}")))?;

        items.push(OutputItem {
            name: name.clone(),
            array,
        });
    }

    Ok(FitOutput { items, log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::init_defaults;
    use crate::engine::{GlmEngine, RunLog};

    const DIMS: [usize; 4] = [2, 2, 1, 5];

    fn run_engine() -> GlmEngine {
        init_defaults();
        let mut engine = GlmEngine::new();
        engine.set_extent(2, 2, 1, &[1, 1, 1, 1]).unwrap();
        let data: Vec<f32> = (0..20).map(|i| i as f32).collect();
        engine.set_voxel_data("data", 5, &data).unwrap();
        engine.set_option("model", "poly").unwrap();
        engine.set_option("degree", "1").unwrap();
        let mut log = RunLog::start();
        engine.run(&mut log).unwrap();
        engine
    }

    #[test]
    fn scalar_outputs_are_3d_and_series_outputs_are_4d() {
        let engine = run_engine();
        let outputs = vec!["mean_c0".to_string(), "modelfit".to_string()];
        let result =
            assemble_results(&engine, &outputs, &DIMS, "log text".to_string()).unwrap();

        assert_eq!(result.get("mean_c0").unwrap().shape(), &[2, 2, 1]);
        assert_eq!(result.get("modelfit").unwrap().shape(), &[2, 2, 1, 5]);
        assert_eq!(result.log, "log text");
        assert_eq!(
            result.field_names(),
            vec!["mean_c0", "modelfit", "log"]
        );
    }

    #[test]
    fn element_order_is_preserved_exactly() {
        let engine = run_engine();
        let outputs = vec!["modelfit".to_string()];
        let result = assemble_results(&engine, &outputs, &DIMS, String::new()).unwrap();

        // The fit of a noise-free ramp reproduces it; grid voxel (i,j,0)
        // holds the series value at column-major position.
        let fit = result.get("modelfit").unwrap();
        let mut flat = vec![0.0f32; 20];
        engine.get_voxel_data("modelfit", &mut flat).unwrap();
        for t in 0..5 {
            for j in 0..2 {
                for i in 0..2 {
                    let linear = i + 2 * j + 4 * t;
                    assert_eq!(fit[[i, j, 0, t]], flat[linear]);
                }
            }
        }
    }

    #[test]
    fn one_missing_output_fails_the_whole_assembly() {
        let engine = run_engine();
        let outputs = vec!["mean_c0".to_string(), "no_such_output".to_string()];
        let err = assemble_results(&engine, &outputs, &DIMS, String::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }
}
