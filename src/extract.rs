// ABOUTME: Report endpoint extraction - downloads CSV or Excel reports into records
// ABOUTME: CSV reports are UTF-16 tab-separated; types are inferred per column

use anyhow::Context;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use reqwest::Client;
use serde_json::{Number, Value};
use std::io::Cursor;

use crate::error::{EtlError, Result};
use crate::record::Record;
use crate::socrata::client::ensure_success;

/// Cell contents read as missing, matching what dataframe loaders treat as NA.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Excel,
}

impl ReportFormat {
    /// Report URLs name their format; anything that is not `.csv` is a workbook.
    pub fn from_endpoint(endpoint: &str) -> Self {
        if endpoint.to_lowercase().contains(".csv") {
            ReportFormat::Csv
        } else {
            ReportFormat::Excel
        }
    }
}

/// Download `endpoint` and decode it into records.
///
/// Decoding failures are logged with a hint about the web application
/// firewall before being returned; every failure is fatal for the job.
pub async fn extract_report(client: &Client, endpoint: &str) -> anyhow::Result<Vec<Record>> {
    let bytes = fetch(client, endpoint)
        .await
        .with_context(|| format!("Failed to download report from {}", endpoint))?;

    let decoded = match ReportFormat::from_endpoint(endpoint) {
        ReportFormat::Csv => decode_utf16(&bytes).and_then(|text| parse_csv(&text, b'\t')),
        ReportFormat::Excel => parse_excel(bytes),
    };

    let records = match decoded {
        Ok(records) => records,
        Err(e) if e.is_decoding() => {
            tracing::error!("{}", EtlError::DECODING_HINT);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Downloaded {} records from endpoint", records.len());
    Ok(records)
}

async fn fetch(client: &Client, endpoint: &str) -> Result<Vec<u8>> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        let response = client.get(endpoint).send().await?;
        let response = ensure_success(endpoint, response).await?;
        Ok(response.bytes().await?.to_vec())
    } else {
        Ok(tokio::fs::read(endpoint).await?)
    }
}

/// Decode a UTF-16 payload that starts with a byte-order mark.
///
/// The firewall's challenge page is UTF-8 HTML, so a missing BOM means the
/// report was never served.
pub fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => {
            return Err(EtlError::Decoding(
                "payload is not UTF-16 (no byte-order mark)".to_string(),
            ))
        }
    };

    if body.len() % 2 != 0 {
        return Err(EtlError::Decoding(
            "truncated UTF-16 payload (odd byte count)".to_string(),
        ));
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|e| EtlError::Decoding(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut seen = false;
    for cell in cells.filter(|c| !is_na(c)) {
        seen = true;
        let cell = cell.trim();
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    if seen {
        kind
    } else {
        ColumnKind::Text
    }
}

fn cell_value(cell: &str, kind: ColumnKind) -> Value {
    if is_na(cell) {
        return Value::Null;
    }
    let trimmed = cell.trim();
    match kind {
        ColumnKind::Integer => trimmed.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        ColumnKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

/// Parse delimited text with a header row into records.
pub fn parse_csv(text: &str, delimiter: u8) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut cells: Vec<String> = row.iter().map(str::to_string).collect();
        cells.resize(headers.len(), String::new());
        rows.push(cells);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|i| infer_kind(rows.iter().map(|r| r[i].as_str())))
        .collect();

    Ok(rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(kinds.iter())
                .zip(row.iter())
                .map(|((header, kind), cell)| (header.clone(), cell_value(cell, *kind)))
                .collect()
        })
        .collect())
}

fn excel_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::String(s) if is_na(s) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

/// Read the first worksheet of a workbook, using its first row as headers.
pub fn parse_excel(bytes: Vec<u8>) -> Result<Vec<Record>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| EtlError::Decoding(format!("not a readable workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::Decoding("workbook has no worksheets".to_string()))?
        .map_err(|e| EtlError::Decoding(format!("unreadable worksheet: {}", e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = row.get(i).map(excel_value).unwrap_or(Value::Null);
                    (header.clone(), value)
                })
                .collect()
        })
        .collect())
}
