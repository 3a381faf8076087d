// ABOUTME: Open311 incremental sync - watermark, paging client, normalizer and poller
// ABOUTME: Keeps the realtime Socrata dataset current with recently updated requests

pub mod client;
pub mod normalize;
pub mod poller;
pub mod watermark;

pub use client::{Open311Client, PAGE_SIZE};
pub use normalize::{normalize_page, normalize_record, OPEN311_FIELDS, TIMESTAMP_FIELDS};
pub use poller::{poll, Pacer, PollStats, PollerConfig};
pub use watermark::{resolve_watermark, DEFAULT_WATERMARK};

use crate::error::Result;
use crate::record::Record;

/// A paged source of service requests ordered by `updated_datetime`.
#[allow(async_fn_in_trait)]
pub trait RequestSource {
    /// Fetch 1-based `page` of requests updated after `updated_after`.
    /// An empty page means there is nothing further.
    async fn fetch_page(&self, updated_after: &str, page: u32) -> Result<Vec<Record>>;
}
