//! The engine seam.
//!
//! The fitting engine is an external collaborator from the marshalling
//! layer's point of view: the layer only ever drives the narrow operation
//! set defined by [`Engine`] — option set/get, spatial extent, voxel-data
//! set/get/size, and a blocking `run` with a log sink. Model introspection
//! (option descriptors, parameters, extra outputs) goes through the
//! process-wide model registry and the [`Model`] trait.
//!
//! [`GlmEngine`] is the in-crate engine implementation: it fits
//! linear-in-parameters models voxel-wise by ordinary least squares. Its
//! numerical internals are deliberately simple; the interesting contract is
//! the data layout it shares with the layer (full-grid column-major buffers
//! in, masked storage inside, zero-filled full grids back out).

pub mod glm;
pub mod library;
pub mod log;
pub mod model;
pub mod options;
pub mod registry;

pub use glm::GlmEngine;
pub use log::RunLog;
pub use model::{Model, ModelFactory, OptionKind, OptionSpec, Parameter};
pub use options::RunOptions;

/// The operations one fitting run drives, in the order the orchestrator
/// uses them: options and data are write-only while marshalling, `run` is
/// called exactly once, and the voxel-data getters serve result assembly.
pub trait Engine {
    /// Set a named option. All option values are strings at this boundary;
    /// scalars are formatted by the caller.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Read back an option value, if set.
    fn get_option(&self, name: &str) -> Option<String>;

    /// Read an option as a boolean switch. Absent options are `false`.
    fn get_option_bool(&self, name: &str) -> bool;

    /// Read view of the full option store, used to initialize models.
    fn options(&self) -> &RunOptions;

    /// Install the voxel grid extent and per-voxel inclusion flags
    /// (1 = included). Must be called before any voxel data is set.
    fn set_extent(&mut self, nx: usize, ny: usize, nz: usize, mask: &[i32])
    -> Result<(), EngineError>;

    /// Register a named voxel-data buffer: a full-grid column-major array of
    /// `nx*ny*nz*points_per_voxel` single-precision values.
    fn set_voxel_data(
        &mut self,
        name: &str,
        points_per_voxel: usize,
        data: &[f32],
    ) -> Result<(), EngineError>;

    /// Per-voxel series length of a named voxel-data buffer.
    fn voxel_data_len(&self, name: &str) -> Result<usize, EngineError>;

    /// Copy a named voxel-data buffer into `out` as a full-grid column-major
    /// array, zero outside the mask. `out` must hold exactly
    /// `nx*ny*nz*points_per_voxel` values.
    fn get_voxel_data(&self, name: &str, out: &mut [f32]) -> Result<(), EngineError>;

    /// Execute the fit. Blocking and non-cancelable; all diagnostic text
    /// goes to `log`.
    fn run(&mut self, log: &mut RunLog) -> Result<(), EngineError>;
}

/// Failures raised inside the engine boundary.
///
/// These never cross into the host untranslated: the orchestrator maps every
/// variant onto the `Engine` error category, preserving the message.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// No model registered under the requested name.
    ModelNotFound(String),
    /// A required option was not set.
    MissingOption(String),
    /// An option was set to a value the consumer cannot use.
    BadOptionValue { name: String, message: String },
    /// No voxel data registered under the requested name.
    DataNotFound(String),
    /// A buffer's size disagrees with the established extent.
    DataShape(String),
    /// Numerical failure inside the fitting routine.
    Numeric(String),
    /// File access failure (matrix files, model libraries).
    Io(String),
    /// Model library loading failure. Only ever surfaced as a warning.
    Library(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ModelNotFound(name) => write!(f, "unknown model `{name}`"),
            EngineError::MissingOption(name) => write!(f, "required option `{name}` is not set"),
            EngineError::BadOptionValue { name, message } => {
                write!(f, "bad value for option `{name}`: {message}")
            }
            EngineError::DataNotFound(name) => write!(f, "no voxel data named `{name}`"),
            EngineError::DataShape(msg) => write!(f, "{msg}"),
            EngineError::Numeric(msg) => write!(f, "numerical failure: {msg}"),
            EngineError::Io(msg) => write!(f, "{msg}"),
            EngineError::Library(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
