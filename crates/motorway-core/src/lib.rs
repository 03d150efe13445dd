//! Core types for the motorway monitor.
//!
//! Holds the error type, the `DD/MM/YYYY HH:MM` timestamp parser, duration
//! formatting, the [`models::VehicleRecord`] model and CLI settings shared by
//! the data, runtime and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
