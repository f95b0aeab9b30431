//! Process-wide model registry.
//!
//! Models are resolved by name at run time, so the registry is shared
//! process state. Default registration is check-and-set idempotent and is
//! performed at the start of every run rather than relying on load-time
//! side effects; repeated invocations are safe.

use std::collections::BTreeMap;
use std::sync::{Once, RwLock};

use crate::engine::model::{DesignModel, Model, ModelFactory, PolyModel};
use crate::engine::EngineError;

static MODELS: RwLock<BTreeMap<String, ModelFactory>> = RwLock::new(BTreeMap::new());
static DEFAULTS: Once = Once::new();

/// Register the built-in models. Safe to call on every invocation.
pub fn init_defaults() {
    DEFAULTS.call_once(|| {
        register_model(PolyModel::NAME, PolyModel::create);
        register_model(DesignModel::NAME, DesignModel::create);
    });
}

/// Register (or replace) a model factory under a name.
pub fn register_model(name: impl Into<String>, factory: ModelFactory) {
    let mut models = MODELS.write().expect("model registry poisoned");
    models.insert(name.into(), factory);
}

/// Instantiate a model by name.
pub fn instantiate(name: &str) -> Result<Box<dyn Model>, EngineError> {
    let models = MODELS.read().expect("model registry poisoned");
    let factory = models
        .get(name)
        .ok_or_else(|| EngineError::ModelNotFound(name.to_string()))?;
    Ok(factory())
}

/// Registered model names, sorted.
pub fn model_names() -> Vec<String> {
    let models = MODELS.read().expect("model registry poisoned");
    models.keys().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_builtin_models_idempotently() {
        init_defaults();
        init_defaults();

        let names = model_names();
        assert!(names.iter().any(|n| n == "poly"));
        assert!(names.iter().any(|n| n == "design"));
        assert!(instantiate("poly").is_ok());
    }

    #[test]
    fn unknown_model_is_an_error() {
        init_defaults();
        let err = instantiate("definitely-not-registered").err().unwrap();
        assert!(matches!(err, EngineError::ModelNotFound(_)));
    }
}
