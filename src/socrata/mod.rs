// ABOUTME: Socrata sink - SODA API client plus the DatasetSink seam jobs are generic over
// ABOUTME: Provides upsert/replace loading and high-water-mark lookups

pub mod client;
pub mod models;

pub use client::SocrataClient;
pub use models::{SoqlQuery, UpsertResult};

use clap::ValueEnum;

use crate::error::Result;
use crate::record::Record;

/// A hosted dataset that accepts records.
///
/// Every call is awaited to completion before the caller moves on, and
/// failures come back as errors rather than partial results.
#[allow(async_fn_in_trait)]
pub trait DatasetSink {
    async fn upsert(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult>;

    async fn replace(&self, dataset_id: &str, records: &[Record]) -> Result<UpsertResult>;

    /// Most recent non-null value of `column` across the dataset, or `None`
    /// when the dataset has no such rows.
    async fn latest_value(&self, dataset_id: &str, column: &str) -> Result<Option<String>>;
}

/// How records are written to the dataset.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum LoadMethod {
    #[default]
    Upsert,
    Replace,
}

/// Load `records` into `dataset_id` with the requested method.
pub async fn load<S: DatasetSink>(
    sink: &S,
    dataset_id: &str,
    records: &[Record],
    method: LoadMethod,
) -> Result<UpsertResult> {
    match method {
        LoadMethod::Upsert => sink.upsert(dataset_id, records).await,
        LoadMethod::Replace => sink.replace(dataset_id, records).await,
    }
}
