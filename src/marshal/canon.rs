//! Option-name canonicalization.
//!
//! Engine option names routinely contain `-`, which is illegal in host
//! field identifiers, so hosts write `_` in its place. The rule: if the
//! field name exactly matches an option the model declares, keep it as is —
//! the model may legitimately declare a name containing `_`, and exact
//! match must win over substitution. Otherwise replace every `_` with `-`.
//!
//! Core engine options never contain `_`, so the fallback is safe for them.

use crate::engine::OptionSpec;

/// The character hosts use in place of the engine's separator.
pub const HOST_PLACEHOLDER: char = '_';

/// The engine's option-name separator.
pub const OPTION_SEPARATOR: &str = "-";

/// Map a host field name onto the engine's option name.
pub fn canonical_option_name(name: &str, model_options: &[OptionSpec]) -> String {
    if model_options.iter().any(|opt| opt.name == name) {
        return name.to_string();
    }
    name.replace(HOST_PLACEHOLDER, OPTION_SEPARATOR)
}
