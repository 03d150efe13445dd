//! Data layer for the motorway monitor.
//!
//! Turns the raw vehicle log into [`VehicleRecord`](motorway_core::models::VehicleRecord)s,
//! keeps the spent time of open records current, aggregates fleet-wide
//! statistics and runs the one-shot analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod live;
pub mod reader;

pub use motorway_core as core;
