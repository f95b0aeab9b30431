//! The engine-side option store.
//!
//! Every option value is a string at this boundary; typed readers parse on
//! demand. This mirrors how the configuration accumulates during
//! marshalling: write-only until `run` begins, read-only afterwards.

use std::collections::BTreeMap;

use crate::engine::EngineError;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    values: BTreeMap<String, String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Required string option.
    pub fn get_string(&self, name: &str) -> Result<String, EngineError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::MissingOption(name.to_string()))
    }

    /// Boolean switch: `"true"`, `"1"`, and the empty string (option set as a
    /// bare flag) read as true; anything else, including an absent option,
    /// reads as false.
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.values.get(name).map(String::as_str), Some("true" | "1" | ""))
    }

    /// Optional non-negative integer option with a default.
    ///
    /// Values are parsed leniently enough to accept a host-formatted float
    /// with no fractional part (`"2"` from a host scalar `2.0`), but a
    /// fractional or negative value is an error.
    pub fn get_usize_or(&self, name: &str, default: usize) -> Result<usize, EngineError> {
        let Some(raw) = self.values.get(name) else {
            return Ok(default);
        };
        let parsed = raw
            .parse::<f64>()
            .map_err(|_| EngineError::BadOptionValue {
                name: name.to_string(),
                message: format!("`{raw}` is not a number"),
            })?;
        if !(parsed.is_finite() && parsed >= 0.0 && parsed.fract() == 0.0) {
            return Err(EngineError::BadOptionValue {
                name: name.to_string(),
                message: format!("`{raw}` is not a non-negative integer"),
            });
        }
        Ok(parsed as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_reads() {
        let mut opts = RunOptions::new();
        opts.set("a", "true");
        opts.set("b", "1");
        opts.set("c", "");
        opts.set("d", "false");
        opts.set("e", "yes");

        assert!(opts.get_bool("a"));
        assert!(opts.get_bool("b"));
        assert!(opts.get_bool("c"));
        assert!(!opts.get_bool("d"));
        assert!(!opts.get_bool("e"));
        assert!(!opts.get_bool("missing"));
    }

    #[test]
    fn usize_reads_accept_host_formatted_scalars() {
        let mut opts = RunOptions::new();
        opts.set("degree", "3");
        assert_eq!(opts.get_usize_or("degree", 2).unwrap(), 3);
        assert_eq!(opts.get_usize_or("missing", 2).unwrap(), 2);

        opts.set("degree", "2.5");
        assert!(opts.get_usize_or("degree", 2).is_err());
        opts.set("degree", "-1");
        assert!(opts.get_usize_or("degree", 2).is_err());
    }

    #[test]
    fn missing_required_option_is_an_error() {
        let opts = RunOptions::new();
        let err = opts.get_string("model").unwrap_err();
        assert!(err.to_string().contains("model"));
    }
}
