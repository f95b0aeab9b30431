//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dynamic host-side value model (`Value`, `NumArray`)
//! - the host record (`RunRecord`) consumed by one fitting run
//! - the host-facing result (`FitOutput`, `OutputItem`)
//! - the demo-run configuration (`DemoConfig`)

pub mod types;

pub use types::*;
