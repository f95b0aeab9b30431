//! Result side of a run: which outputs to request, and reshaping them back
//! into dimensioned host arrays.

pub mod assemble;
pub mod enumerate;

pub use assemble::assemble_results;
pub use enumerate::enumerate_outputs;
