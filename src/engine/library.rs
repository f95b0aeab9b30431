//! Dynamic loading of model plug-in libraries.
//!
//! The host record may carry a `loadmodels` field: a semicolon-delimited
//! list of dynamic library paths. Each library is loaded before field
//! classification so the models it contributes are resolvable by name. A
//! load failure is a warning, never an abort — the requested model may
//! still be resolvable through libraries already loaded.
//!
//! A library exports two symbols: a version marker checked against
//! [`MODEL_LIBRARY_API_VERSION`], and an entry function returning the
//! (name, factory) pairs to merge into the registry. Loaded libraries are
//! intentionally leaked so the factories stay valid for the process
//! lifetime.

use std::path::Path;

use libloading::{Library, Symbol};

use crate::engine::model::ModelFactory;
use crate::engine::{registry, EngineError};

/// Version marker symbol a model library must export as a `u32`.
pub const MODEL_LIBRARY_VERSION_SYMBOL: &[u8] = b"voxfit_model_library_api_version";

/// Entry symbol a model library must export.
pub const MODEL_LIBRARY_ENTRY_SYMBOL: &[u8] = b"voxfit_model_library_entry";

/// The ABI contract version for model libraries.
pub const MODEL_LIBRARY_API_VERSION: u32 = 1;

/// Signature of the entry symbol.
pub type ModelLibraryEntry = unsafe extern "Rust" fn() -> Vec<(String, ModelFactory)>;

/// Load every library in a semicolon-delimited list, warning on failures.
pub fn load_model_libraries(list: &str) {
    for path in split_library_list(list) {
        match load_model_library(Path::new(path)) {
            Ok(count) => log::info!("loaded {count} model(s) from {path}"),
            Err(e) => log::warn!("failed to load model library {path}: {e}"),
        }
    }
}

pub(crate) fn split_library_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Load one model library and merge its models into the registry.
///
/// Returns the number of models registered.
pub fn load_model_library(path: &Path) -> Result<usize, EngineError> {
    // SAFETY: loading and calling a foreign library is inherently unsafe;
    // the version marker is checked before the entry symbol is called.
    let lib = unsafe { Library::new(path) }
        .map_err(|e| EngineError::Library(format!("cannot load {}: {e}", path.display())))?;

    let version: Symbol<'_, *const u32> = unsafe {
        lib.get(MODEL_LIBRARY_VERSION_SYMBOL).map_err(|e| {
            EngineError::Library(format!("{} has no version marker: {e}", path.display()))
        })?
    };
    let version = unsafe { **version };
    if version != MODEL_LIBRARY_API_VERSION {
        return Err(EngineError::Library(format!(
            "{} has api version {version}, host expects {MODEL_LIBRARY_API_VERSION}",
            path.display()
        )));
    }

    let entry: Symbol<'_, ModelLibraryEntry> = unsafe {
        lib.get(MODEL_LIBRARY_ENTRY_SYMBOL).map_err(|e| {
            EngineError::Library(format!("{} has no entry symbol: {e}", path.display()))
        })?
    };
    let models = unsafe { entry() };

    let count = models.len();
    for (name, factory) in models {
        registry::register_model(name, factory);
    }

    // Keep the library mapped for the process lifetime: the registered
    // factories point into it.
    std::mem::forget(lib);

    Ok(count)
}
