//! Runtime layer for the registration dashboard.
//!
//! Owns the dataset cache and turns a loaded dataset plus a query into a
//! dashboard snapshot.

pub mod data_manager;
pub mod snapshot;

pub use dashboard_core as core;
pub use dashboard_data as data;
