// ABOUTME: Command implementations for each ETL job
// ABOUTME: Report jobs share one pipeline; open311 runs the incremental poller

pub mod open311;
pub mod report;

pub use report::run_report;
