//! Mathematical utilities: the least-squares core shared by all models.

pub mod lstsq;

pub use lstsq::*;
