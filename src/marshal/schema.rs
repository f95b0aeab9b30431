//! Option-schema resolution for the run's model.
//!
//! The record is scanned for a field literally named `model` before any
//! other processing, because the model's declared options drive both name
//! canonicalization and matrix-option detection. Without a `model` field
//! the descriptor set is empty and classification falls back to shape
//! heuristics alone.

use crate::domain::{RunRecord, Value};
use crate::engine::{registry, OptionSpec};
use crate::error::RunError;

/// The record field naming the model to fit.
pub const MODEL_FIELD: &str = "model";

/// Resolve the option descriptors of the record's model.
///
/// An unrecognized model name propagates as an engine error; it is not
/// swallowed, since nothing downstream could classify correctly against
/// the wrong schema.
pub fn resolve_model_options(record: &RunRecord) -> Result<Vec<OptionSpec>, RunError> {
    let Some(value) = record.get(MODEL_FIELD) else {
        return Ok(Vec::new());
    };
    let Value::Str(name) = value else {
        return Err(RunError::validation(format!(
            "`{MODEL_FIELD}` field must be textual"
        )));
    };

    let model = registry::instantiate(name)?;
    Ok(model.options())
}
