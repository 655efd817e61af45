//! Data layer for the registration dashboard.
//!
//! Discovers monthly CSV files, parses them, reshapes them into long-form
//! records and answers aggregation queries over the result.

pub mod aggregator;
pub mod analysis;
pub mod dataset;
pub mod discovery;
pub mod export;
pub mod normalizer;
pub mod reader;

pub use dashboard_core as core;
