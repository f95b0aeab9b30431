//! Derivation of the ordered output-name list.
//!
//! The expected outputs depend on the model's parameters (known only after
//! the model is initialized with the final configuration) and on the
//! boolean save-switches. The order is significant only in that it fixes
//! the result record's field order deterministically: per-parameter names
//! first (mean/stdev/zstat per parameter, parameters in declared order),
//! then model extras, then the fixed extra outputs.

use crate::engine::{registry, Engine, EngineError, RunLog};
use crate::error::RunError;

/// Fixed extra outputs, in declared order: (switch, output name).
const FIXED_OUTPUTS: &[(&str, &str)] = &[
    ("save-model-fit", "modelfit"),
    ("save-residuals", "residuals"),
    ("save-free-energy", "freeEnergy"),
    ("save-noise-mean", "noise_means"),
    ("save-noise-std", "noise_stdevs"),
    ("save-mvn", "finalMVN"),
];

/// Derive the outputs to request from the configured engine.
///
/// The engine must always produce at least one output: if no switch selects
/// anything, `save-model-fit` is forced on and `modelfit` requested.
pub fn enumerate_outputs(engine: &mut dyn Engine) -> Result<Vec<String>, RunError> {
    let model_name = engine
        .get_option("model")
        .ok_or_else(|| EngineError::MissingOption("model".to_string()))?;
    let mut model = registry::instantiate(&model_name)?;

    // Models may log during initialization; those diagnostics belong to the
    // run proper, not to output enumeration, so this log is discarded.
    let mut scratch_log = RunLog::start();
    model
        .initialize(engine.options(), &mut scratch_log)
        .map_err(RunError::from)?;

    let mut outputs = Vec::new();

    for param in model.parameters() {
        if engine.get_option_bool("save-mean") {
            outputs.push(format!("mean_{}", param.name));
        }
        if engine.get_option_bool("save-std") {
            outputs.push(format!("stdev_{}", param.name));
        }
        if engine.get_option_bool("save-zstat") {
            outputs.push(format!("zstat_{}", param.name));
        }
    }

    if engine.get_option_bool("save-model-extras") {
        outputs.extend(model.extra_outputs());
    }

    for &(switch, name) in FIXED_OUTPUTS {
        if engine.get_option_bool(switch) {
            outputs.push(name.to_string());
        }
    }

    if outputs.is_empty() {
        engine.set_option("save-model-fit", "true")?;
        outputs.push("modelfit".to_string());
    }

    Ok(outputs)
}
