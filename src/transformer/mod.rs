//! Metric transformation module
//!
//! This module moves namespace segments matching a configured pattern out of
//! a metric's namespace and into its tags.

pub mod filter;
pub mod pattern;

pub use filter::{NamespaceFilter, ScanMode};
pub use pattern::SegmentPattern;
