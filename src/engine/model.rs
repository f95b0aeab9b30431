//! Model introspection and the built-in models.
//!
//! A model abstracts over a capability set discovered only at run time: it
//! declares the options it understands (`options`), consumes the run
//! configuration (`initialize`), and only then can say which parameters it
//! fits (`parameters`) — the parameter set may depend on configuration, as
//! with `poly`'s `degree`.
//!
//! The fitting engine evaluates models through a single primitive: the
//! design matrix relating the per-voxel series to the parameters
//! (`design`). Both built-in models are linear in their parameters, so one
//! least-squares core serves them all.

use nalgebra::{DMatrix, DVector};

use crate::engine::{EngineError, RunLog, RunOptions};
use crate::io::matrix::read_ascii_matrix;

/// The kinds of option value a model can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Free-form text.
    String,
    /// A scalar numeric value.
    Number,
    /// A matrix, passed to the engine as the path of an ASCII matrix file.
    Matrix,
    /// A reference to an image/voxel dataset.
    Image,
    /// Anything else.
    Other,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Number => "number",
            OptionKind::Matrix => "matrix",
            OptionKind::Image => "image",
            OptionKind::Other => "other",
        }
    }
}

/// One option descriptor declared by a model.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub kind: OptionKind,
    pub description: String,
}

impl OptionSpec {
    pub fn new(name: &str, kind: OptionKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        }
    }
}

/// One fitted parameter declared by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A pluggable forward model.
pub trait Model {
    /// The options this model recognizes. Must be callable before
    /// `initialize` and must not produce diagnostic output.
    fn options(&self) -> Vec<OptionSpec>;

    /// Consume the run configuration. Diagnostics go to `log`.
    fn initialize(&mut self, options: &RunOptions, log: &mut RunLog) -> Result<(), EngineError>;

    /// Declared parameters, in order. Valid only after `initialize`.
    fn parameters(&self) -> Vec<Parameter>;

    /// Names of additional per-voxel outputs this model can produce, in
    /// declared order.
    fn extra_outputs(&self) -> Vec<String> {
        Vec::new()
    }

    /// The design matrix (`n_points` rows, one column per parameter)
    /// relating a voxel's series to the parameters.
    fn design(&self, n_points: usize) -> Result<DMatrix<f64>, EngineError>;

    /// An extra per-voxel output series computed from fitted parameters.
    /// `None` means the model does not produce the named output.
    fn extra_series(&self, _name: &str, _params: &DVector<f64>) -> Option<Vec<f64>> {
        None
    }
}

/// Constructor for a registered model.
pub type ModelFactory = fn() -> Box<dyn Model>;

/// Polynomial-in-time series model: `y(t) = c0 + c1*t + ... + cd*t^d` with
/// `t` the 0-based time index.
#[derive(Debug)]
pub struct PolyModel {
    degree: usize,
}

impl PolyModel {
    pub const NAME: &'static str = "poly";
    const DEFAULT_DEGREE: usize = 2;

    pub fn create() -> Box<dyn Model> {
        Box::new(Self {
            degree: Self::DEFAULT_DEGREE,
        })
    }
}

impl Model for PolyModel {
    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::new(
            "degree",
            OptionKind::Number,
            "Maximum power of the fitted polynomial (default 2)",
        )]
    }

    fn initialize(&mut self, options: &RunOptions, log: &mut RunLog) -> Result<(), EngineError> {
        self.degree = options.get_usize_or("degree", Self::DEFAULT_DEGREE)?;
        log.line(format!("poly: degree {}", self.degree));
        Ok(())
    }

    fn parameters(&self) -> Vec<Parameter> {
        (0..=self.degree).map(|j| Parameter::new(format!("c{j}"))).collect()
    }

    fn design(&self, n_points: usize) -> Result<DMatrix<f64>, EngineError> {
        let p = self.degree + 1;
        if n_points < p {
            return Err(EngineError::BadOptionValue {
                name: "degree".to_string(),
                message: format!(
                    "degree {} needs at least {} data points, got {}",
                    self.degree, p, n_points
                ),
            });
        }
        Ok(DMatrix::from_fn(n_points, p, |t, j| (t as f64).powi(j as i32)))
    }
}

/// General linear model whose basis columns come from an ASCII matrix file
/// named by the `basis` option (one row per time point).
#[derive(Debug, Default)]
pub struct DesignModel {
    basis: Option<DMatrix<f64>>,
}

impl DesignModel {
    pub const NAME: &'static str = "design";

    pub fn create() -> Box<dyn Model> {
        Box::new(Self::default())
    }
}

impl Model for DesignModel {
    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::new(
            "basis",
            OptionKind::Matrix,
            "Design matrix file, one row per time point, one column per regressor",
        )]
    }

    fn initialize(&mut self, options: &RunOptions, log: &mut RunLog) -> Result<(), EngineError> {
        let path = options.get_string("basis")?;
        let basis = read_ascii_matrix(path.as_ref()).map_err(EngineError::Io)?;
        log.line(format!(
            "design: basis {} rows x {} columns from {path}",
            basis.nrows(),
            basis.ncols()
        ));
        self.basis = Some(basis);
        Ok(())
    }

    fn parameters(&self) -> Vec<Parameter> {
        let cols = self.basis.as_ref().map(DMatrix::ncols).unwrap_or(0);
        (1..=cols).map(|j| Parameter::new(format!("beta{j}"))).collect()
    }

    fn design(&self, n_points: usize) -> Result<DMatrix<f64>, EngineError> {
        let basis = self
            .basis
            .clone()
            .ok_or_else(|| EngineError::MissingOption("basis".to_string()))?;
        if basis.nrows() != n_points {
            return Err(EngineError::DataShape(format!(
                "basis matrix has {} rows but the data has {} points per voxel",
                basis.nrows(),
                n_points
            )));
        }
        Ok(basis)
    }
}
