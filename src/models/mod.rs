//! Data models for the analytics engine.
//!
//! Records are the immutable inputs, metric blocks are analyzer outputs and
//! the report types tie them together with the later pipeline stages.

pub mod metrics;
pub mod records;
pub mod report;

pub use metrics::*;
pub use records::*;
pub use report::*;
