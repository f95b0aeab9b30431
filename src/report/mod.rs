//! Terminal reporting for the demo front-end.
//!
//! Formatting stays in one place so the marshalling and engine code stay
//! clean and output changes are localized.

pub mod format;

pub use format::*;
