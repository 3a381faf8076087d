// ABOUTME: Report job command - extract a report endpoint, reshape it, load it into Socrata
// ABOUTME: Shared by the requests, activities and flex-notes subcommands

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::ReportConfig;
use crate::extract::extract_report;
use crate::pipeline::ReportDataset;
use crate::socrata::{load, DatasetSink, LoadMethod, SocrataClient, UpsertResult};

/// Report servers build exports on request; large ones take a while.
const REPORT_TIMEOUT: Duration = Duration::from_secs(300);

/// Run `dataset` with configuration from the environment.
pub async fn run(dataset: &ReportDataset, method: Option<LoadMethod>) -> Result<()> {
    let config = ReportConfig::from_env(dataset.dataset_var, dataset.endpoint_var)
        .with_context(|| format!("Configuration for the {} job is incomplete", dataset.name))?;

    let http = Client::builder()
        .timeout(REPORT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")?;
    let sink = SocrataClient::new(&config.socrata).context("Failed to create Socrata client")?;

    let result = run_report(
        dataset,
        &http,
        &sink,
        &config.endpoint,
        &config.dataset_id,
        method.unwrap_or(dataset.method),
    )
    .await?;

    tracing::info!("{} load finished: {}", dataset.name, result);
    Ok(())
}

/// Extract, transform and load one report into `sink`.
pub async fn run_report<S: DatasetSink>(
    dataset: &ReportDataset,
    http: &Client,
    sink: &S,
    endpoint: &str,
    dataset_id: &str,
    method: LoadMethod,
) -> Result<UpsertResult> {
    let records = extract_report(http, endpoint).await?;

    tracing::info!("Transforming {} data", dataset.name);
    let records = dataset
        .transform(records)
        .with_context(|| format!("Failed to transform {} data", dataset.name))?;

    tracing::info!(
        "Uploading {} {} records to Socrata ({:?})",
        records.len(),
        dataset.name,
        method
    );
    let result = load(sink, dataset_id, &records, method)
        .await
        .with_context(|| format!("Failed to load {} records into {}", dataset.name, dataset_id))?;

    Ok(result)
}
