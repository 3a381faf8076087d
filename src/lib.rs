// ABOUTME: Library entry point for opendata-etl
// ABOUTME: Report and Open311 extraction, reshaping and Socrata loading

pub mod commands;
pub mod config;
pub mod datasets;
pub mod datetime;
pub mod error;
pub mod extract;
pub mod open311;
pub mod pipeline;
pub mod projection;
pub mod record;
pub mod socrata;

pub use error::{EtlError, Result};
pub use record::Record;
