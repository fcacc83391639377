//! Result analysis
//!
//! Turns an executed plan into a structured verdict.

pub mod analyzer;

// Re-export commonly used types
pub use analyzer::{trace_report, ResultAnalyzer};
