//! Image preprocessing module for evaluation input
//!
//! Normalizes arbitrary decoded images into fixed-size 8-bit grayscale.

pub mod pipeline;
pub mod steps;

pub use pipeline::Pipeline;
