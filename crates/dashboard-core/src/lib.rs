//! Domain layer for the registration dashboard.
//!
//! Holds the vehicle-registration data model, calendar period arithmetic,
//! growth/share calculations, number formatting, the error taxonomy and the
//! command-line settings shared by every other crate.

pub mod calculations;
pub mod calendar;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{DashboardError, Result};
