//! Shared domain types.
//!
//! The host environment supplies dynamically typed records: there is no
//! static schema for the options a model understands, so field values arrive
//! as a tagged variant and are disambiguated at run time against the model's
//! declared option descriptors. These types are intentionally lightweight so
//! they can be built by any host shell without pulling in the engine.

use std::path::PathBuf;

use ndarray::{ArrayD, ArrayViewD};

/// A dynamically typed host value: text, a scalar, or an n-d numeric array.
///
/// A numeric array with exactly one element is treated as a scalar by the
/// classifier, so hosts that represent scalars as 1x1 arrays behave the same
/// as hosts that pass `Scalar` directly.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Scalar(f64),
    Array(NumArray),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

/// Boolean convenience for save-switches: hosts conventionally pass the
/// strings "true"/"false".
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Str(if v { "true" } else { "false" }.to_string())
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Array(NumArray::F64(a))
    }
}

/// An n-d numeric array with its host element type preserved.
///
/// Only double-precision arrays participate in voxel binding and matrix
/// spooling; the other element types exist so the classifier can reject them
/// with a precise error instead of silently coercing.
#[derive(Debug, Clone)]
pub enum NumArray {
    F64(ArrayD<f64>),
    F32(ArrayD<f32>),
    I64(ArrayD<i64>),
}

impl NumArray {
    pub fn ndim(&self) -> usize {
        match self {
            NumArray::F64(a) => a.ndim(),
            NumArray::F32(a) => a.ndim(),
            NumArray::I64(a) => a.ndim(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            NumArray::F64(a) => a.shape(),
            NumArray::F32(a) => a.shape(),
            NumArray::I64(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NumArray::F64(a) => a.len(),
            NumArray::F32(a) => a.len(),
            NumArray::I64(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable element type, for error messages.
    pub fn elem_name(&self) -> &'static str {
        match self {
            NumArray::F64(_) => "double",
            NumArray::F32(_) => "single",
            NumArray::I64(_) => "integer",
        }
    }

    pub fn as_f64(&self) -> Option<ArrayViewD<'_, f64>> {
        match self {
            NumArray::F64(a) => Some(a.view()),
            _ => None,
        }
    }

    /// The value of a single-element floating array, widened to f64.
    ///
    /// Integer arrays return `None` even when single-element: integer scalar
    /// options are rejected rather than coerced.
    pub fn scalar_value(&self) -> Option<f64> {
        if self.len() != 1 {
            return None;
        }
        match self {
            NumArray::F64(a) => a.iter().next().copied(),
            NumArray::F32(a) => a.iter().next().map(|&v| f64::from(v)),
            NumArray::I64(_) => None,
        }
    }
}

/// The host record for one run: an ordered list of named fields.
///
/// Field order is preserved because classification applies fields to the
/// engine in record order, and a later failure leaves earlier fields already
/// applied (the whole run aborts, so partial population is acceptable).
#[derive(Debug, Clone, Default)]
pub struct RunRecord {
    fields: Vec<(String, Value)>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any existing field with the same name in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One named output reshaped back into a dimensioned host array.
///
/// Outputs with a per-voxel series length of 1 are 3D; longer series carry
/// the series length as a 4th dimension. Element order is column-major.
#[derive(Debug, Clone)]
pub struct OutputItem {
    pub name: String,
    pub array: ArrayD<f32>,
}

/// The host-facing result of one run: named arrays in output order, plus the
/// engine's textual log.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub items: Vec<OutputItem>,
    pub log: String,
}

impl FitOutput {
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| &item.array)
    }

    /// Output names in derivation order, with the fixed `log` field last.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.iter().map(|i| i.name.as_str()).collect();
        names.push("log");
        names
    }
}

/// Configuration for the synthetic demo run driven by the CLI.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Grid extent.
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Series length (points per voxel).
    pub nt: usize,

    /// Model to fit.
    pub model: String,
    /// Polynomial degree used both to generate and to fit.
    pub degree: usize,

    /// Random seed for data generation.
    pub seed: u64,
    /// Gaussian noise standard deviation added to the generated series.
    pub noise_sd: f64,

    /// Save switches forwarded to the run record.
    pub save_mean: bool,
    pub save_std: bool,
    pub save_zstat: bool,
    pub save_model_fit: bool,
    pub save_residuals: bool,

    /// Export the run's outputs to a JSON file.
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;
    use ndarray::IxDyn;

    #[test]
    fn record_preserves_insertion_order_and_replaces_in_place() {
        let mut record = RunRecord::new();
        record.set("model", "poly");
        record.set("degree", 2.0);
        record.set("model", "design");

        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["model", "degree"]);
        assert_eq!(record.get("model").and_then(Value::as_str), Some("design"));
    }

    #[test]
    fn single_element_arrays_read_as_scalars() {
        let one = NumArray::F64(ArrayD::from_elem(IxDyn(&[1, 1]), 3.5));
        assert_eq!(one.scalar_value(), Some(3.5));

        let single = NumArray::F32(ArrayD::from_elem(IxDyn(&[1]), 2.0f32));
        assert_eq!(single.scalar_value(), Some(2.0));

        let int = NumArray::I64(ArrayD::from_elem(IxDyn(&[1]), 7i64));
        assert_eq!(int.scalar_value(), None);

        let many = NumArray::F64(ArrayD::zeros(IxDyn(&[2, 2])));
        assert_eq!(many.scalar_value(), None);
    }
}
