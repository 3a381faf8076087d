// ABOUTME: Incremental poller - pages Open311 from a watermark and upserts each page
// ABOUTME: Self-throttles to stay under the API's request-per-minute ceiling

use std::time::Duration;
use tokio::time::Instant;

use super::normalize::normalize_page;
use super::RequestSource;
use crate::error::Result;
use crate::socrata::DatasetSink;

/// Open311 allows at most this many requests per minute.
pub const MAX_REQUESTS_PER_MINUTE: u32 = 10;

/// Slack added to every pause so clock jitter never trips the limit.
pub const PACING_BUFFER: Duration = Duration::from_millis(100);

/// Spaces request cycles at least `min_interval + buffer` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min_interval: Duration,
    buffer: Duration,
}

impl Pacer {
    pub fn new(min_interval: Duration, buffer: Duration) -> Self {
        Self {
            min_interval,
            buffer,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(
            Duration::from_secs(60) / max_requests.max(1),
            PACING_BUFFER,
        )
    }

    /// How long to sleep after a cycle that took `elapsed`; never negative.
    pub fn delay_after(&self, elapsed: Duration) -> Duration {
        (self.min_interval + self.buffer).saturating_sub(elapsed)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::per_minute(MAX_REQUESTS_PER_MINUTE)
    }
}

/// Settings for one poll run.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Realtime dataset receiving the upserts
    pub dataset_id: String,
    /// Fields kept on each record; `None` keeps everything
    pub allow_list: Option<Vec<String>>,
    pub pacer: Pacer,
}

impl PollerConfig {
    pub fn new(dataset_id: &str, allow_list: Option<Vec<String>>) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            allow_list,
            pacer: Pacer::default(),
        }
    }
}

/// Summary of a completed poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    pub watermark: String,
    pub pages: u32,
    pub records: u64,
    pub rows_created: u64,
    pub rows_updated: u64,
}

/// Page through `source` from `watermark` until an empty page, normalizing
/// and upserting each page into the sink as it arrives.
///
/// The watermark is fixed for the whole run. Any fetch, normalization or
/// upload failure aborts the run; rerunning is safe because upserts are
/// keyed.
pub async fn poll<Src, Snk>(
    source: &Src,
    sink: &Snk,
    config: &PollerConfig,
    watermark: &str,
) -> Result<PollStats>
where
    Src: RequestSource,
    Snk: DatasetSink,
{
    let mut stats = PollStats {
        watermark: watermark.to_string(),
        ..Default::default()
    };
    let allow_list = config.allow_list.as_deref();
    let mut page: u32 = 1;

    loop {
        let start = Instant::now();

        let mut records = source.fetch_page(watermark, page).await?;
        if records.is_empty() {
            tracing::info!("Page {} is empty, no more updates after {}", page, watermark);
            break;
        }

        normalize_page(&mut records, allow_list)?;

        let result = sink.upsert(&config.dataset_id, &records).await?;
        tracing::info!(
            "Page {}: upserted {} records ({})",
            page,
            records.len(),
            result
        );

        stats.pages += 1;
        stats.records += records.len() as u64;
        stats.rows_created += result.rows_created;
        stats.rows_updated += result.rows_updated;

        let delay = config.pacer.delay_after(start.elapsed());
        tokio::time::sleep(delay).await;

        page += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacer_interval() {
        assert_eq!(
            Pacer::default(),
            Pacer::new(Duration::from_secs(6), Duration::from_millis(100))
        );
    }

    #[test]
    fn test_delay_after_fast_cycle() {
        let pacer = Pacer::default();
        assert_eq!(
            pacer.delay_after(Duration::from_secs(1)),
            Duration::from_millis(5100)
        );
        assert_eq!(pacer.delay_after(Duration::ZERO), Duration::from_millis(6100));
    }

    #[test]
    fn test_delay_after_slow_cycle_is_zero() {
        let pacer = Pacer::default();
        assert_eq!(pacer.delay_after(Duration::from_secs(7)), Duration::ZERO);
        assert_eq!(
            pacer.delay_after(Duration::from_millis(6100)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_per_minute_zero_does_not_divide_by_zero() {
        let pacer = Pacer::per_minute(0);
        assert_eq!(pacer.delay_after(Duration::from_secs(61)), Duration::ZERO);
    }
}
