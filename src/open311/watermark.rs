// ABOUTME: Resolves the "updated since" watermark for an Open311 poll
// ABOUTME: Uses an operator override or the sink's own high-water mark

use chrono::{Duration, NaiveDateTime};

use crate::datetime::{central_to_utc, format_utc, parse_iso_utc};
use crate::error::{EtlError, Result};
use crate::socrata::DatasetSink;

/// Watermark used when the realtime dataset holds no rows yet.
pub const DEFAULT_WATERMARK: &str = "2025-10-13T00:00:00Z";

/// Column holding the high-water mark in the realtime dataset.
pub const WATERMARK_COLUMN: &str = "updated_datetime";

/// Subtracted from operator overrides so records updated just before the
/// given instant are fetched again.
pub const SAFETY_MARGIN_MINUTES: i64 = 10;

/// Watermark from an operator-supplied ISO-8601 timestamp, minus the margin.
pub fn from_override(value: &str) -> Result<String> {
    let instant = parse_iso_utc(value)?;
    Ok(format_utc(
        &(instant - Duration::minutes(SAFETY_MARGIN_MINUTES)),
    ))
}

/// Watermark from the sink's most recent floating (Central) timestamp.
pub fn from_sink_value(value: &str) -> Result<String> {
    let naive = value.trim().parse::<NaiveDateTime>().map_err(|e| {
        EtlError::InvalidInput(format!(
            "Unexpected {} value in dataset: {} ({})",
            WATERMARK_COLUMN, value, e
        ))
    })?;
    Ok(format_utc(&central_to_utc(&naive)))
}

/// Determine the lower bound for the next poll.
///
/// An override wins. Otherwise the newest `updated_datetime` already in the
/// dataset is used, falling back to [`DEFAULT_WATERMARK`] when it is empty.
pub async fn resolve_watermark<S: DatasetSink>(
    sink: &S,
    dataset_id: &str,
    override_date: Option<&str>,
) -> Result<String> {
    if let Some(date) = override_date {
        let watermark = from_override(date)?;
        tracing::info!(
            "Using provided date (minus {} minutes): {}",
            SAFETY_MARGIN_MINUTES,
            watermark
        );
        return Ok(watermark);
    }

    match sink.latest_value(dataset_id, WATERMARK_COLUMN).await? {
        Some(latest) => {
            let watermark = from_sink_value(&latest)?;
            tracing::info!(
                "Most recent record in dataset was updated {} (Central), polling from {}",
                latest,
                watermark
            );
            Ok(watermark)
        }
        None => {
            tracing::info!("Dataset is empty, polling from {}", DEFAULT_WATERMARK);
            Ok(DEFAULT_WATERMARK.to_string())
        }
    }
}
