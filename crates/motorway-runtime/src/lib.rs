//! Runtime layer for the motorway monitor.
//!
//! Keeps a cached copy of the feed, re-ingests it on a fixed cadence and
//! drives the once-per-tick spent-time refresh and aggregation, handing
//! snapshots to the caller over a channel.

pub mod data_manager;
pub mod orchestrator;

pub use motorway_core as core;
pub use motorway_data as data;
