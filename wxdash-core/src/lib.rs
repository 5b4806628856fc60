//! Core library for the `wxdash` weather tools.
//!
//! This crate defines:
//! - Geocoding, current-conditions, and historical-archive clients
//! - Unit/time conversion utilities and the WMO weather-code lexicon
//! - The response cache and retry policy used by the historical path
//! - Configuration & credentials handling
//!
//! It is used by `wxdash-cli`, but can also be reused by other binaries or
//! services. Presentation (widgets, charts, terminal output) lives entirely
//! outside this crate; everything here returns plain data.

pub mod cache;
pub mod client;
pub mod config;
pub mod convert;
pub mod model;
pub mod retry;
pub mod wmo;

pub use cache::{CachePolicy, HttpCache};
pub use client::{ArchiveError, CurrentClient, GeocodeClient, Geocoder, HistoryClient};
pub use config::Config;
pub use model::{
    CurrentConditions, CurrentOutcome, DailyRow, HistoryData, HistoryOutcome, HourlyRow, Location,
};
pub use retry::RetryPolicy;
