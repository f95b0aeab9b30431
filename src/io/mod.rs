//! Input/output helpers.
//!
//! - ASCII matrix files read/write (`matrix`)
//! - result exports (JSON) (`export`)

pub mod export;
pub mod matrix;

pub use export::*;
pub use matrix::*;
