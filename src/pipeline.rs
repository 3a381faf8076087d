// ABOUTME: Generic report pipeline - field mapping plus ordered per-record transform steps
// ABOUTME: Each report dataset is a mapping table and a few hooks around it

use chrono::Datelike;
use serde_json::{Number, Value};

use crate::datetime::parse_report_datetime;
use crate::error::{EtlError, Result};
use crate::projection::LambertConformalConic;
use crate::record::{wkt_point, Record};
use crate::socrata::LoadMethod;

/// Ordered `(source column label, dataset field name)` pairs.
pub type FieldMap = &'static [(&'static str, &'static str)];

/// Format Socrata expects for floating timestamps.
const SOCRATA_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

/// A transform hook applied across all records of a report.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Project state plane columns to WGS-84, adding `latitude`, `longitude`
    /// and a `location` point.
    ProjectStatePlane { x: &'static str, y: &'static str },
    /// Add `fiscal_year`; the fiscal year starts in October.
    FiscalYear { from: &'static str },
    /// Reformat every field whose name contains `date`.
    FormatDates,
    /// Drop records where `field` is null or absent.
    DropMissing { field: &'static str },
    /// Drop records where `field` equals one of `values`.
    ExcludeValues {
        field: &'static str,
        values: &'static [&'static str],
    },
}

impl Step {
    pub fn apply(&self, mut records: Vec<Record>) -> Result<Vec<Record>> {
        match *self {
            Step::ProjectStatePlane { x, y } => {
                let projection = LambertConformalConic::texas_central();
                for record in records.iter_mut() {
                    project_state_plane(record, &projection, x, y);
                }
            }
            Step::FiscalYear { from } => {
                for record in records.iter_mut() {
                    let year = fiscal_year(record.get(from), from)?;
                    record.insert("fiscal_year".to_string(), year);
                }
            }
            Step::FormatDates => {
                for record in records.iter_mut() {
                    format_dates(record)?;
                }
            }
            Step::DropMissing { field } => {
                let before = records.len();
                records.retain(|r| r.get(field).is_some_and(|v| !v.is_null()));
                tracing::debug!("Dropped {} records without {}", before - records.len(), field);
            }
            Step::ExcludeValues { field, values } => {
                let before = records.len();
                records.retain(|r| {
                    !r.get(field)
                        .and_then(Value::as_str)
                        .is_some_and(|v| values.contains(&v))
                });
                tracing::debug!(
                    "Dropped {} records with excluded {} values",
                    before - records.len(),
                    field
                );
            }
        }
        Ok(records)
    }
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn project_state_plane(
    record: &mut Record,
    projection: &LambertConformalConic,
    x: &str,
    y: &str,
) {
    let coordinates = match (as_f64(record.get(x)), as_f64(record.get(y))) {
        (Some(easting), Some(northing)) => projection.try_inverse(easting, northing),
        _ => None,
    };

    let (latitude, longitude, location) = match coordinates {
        Some((lat, lon)) => (
            float_value(lat),
            float_value(lon),
            Value::String(wkt_point(&lon.to_string(), &lat.to_string())),
        ),
        None => (Value::Null, Value::Null, Value::Null),
    };

    record.insert("latitude".to_string(), latitude);
    record.insert("longitude".to_string(), longitude);
    record.insert("location".to_string(), location);
}

fn fiscal_year(value: Option<&Value>, field: &str) -> Result<Value> {
    let text = match value {
        None | Some(Value::Null) => return Ok(Value::Null),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(EtlError::InvalidInput(format!(
                "{} is not a date: {}",
                field, other
            )))
        }
    };

    let date = parse_report_datetime(text)
        .ok_or_else(|| EtlError::InvalidInput(format!("{} is not a date: {}", field, text)))?;
    let year = if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    };
    Ok(Value::from(year))
}

fn format_dates(record: &mut Record) -> Result<()> {
    for (field, value) in record.iter_mut() {
        if !field.contains("date") {
            continue;
        }
        let formatted = match value {
            Value::Null => continue,
            Value::String(s) if s.trim().is_empty() => Value::Null,
            Value::String(s) => {
                let parsed = parse_report_datetime(s).ok_or_else(|| {
                    EtlError::InvalidInput(format!("{} is not a date: {}", field, s))
                })?;
                Value::String(parsed.format(SOCRATA_DATETIME).to_string())
            }
            other => {
                return Err(EtlError::InvalidInput(format!(
                    "{} is not a date: {}",
                    field, other
                )))
            }
        };
        *value = formatted;
    }
    Ok(())
}

/// Select the mapped columns from each record and rename them.
pub fn apply_field_map(records: Vec<Record>, map: FieldMap) -> Result<Vec<Record>> {
    records
        .into_iter()
        .map(|mut record| {
            map.iter()
                .map(|(source, target)| {
                    record
                        .remove(*source)
                        .map(|value| (target.to_string(), value))
                        .ok_or_else(|| EtlError::MissingColumn(source.to_string()))
                })
                .collect::<Result<Record>>()
        })
        .collect()
}

/// A report-backed dataset: where it comes from, how it is reshaped and how
/// it is loaded.
#[derive(Debug, Clone, Copy)]
pub struct ReportDataset {
    pub name: &'static str,
    /// Environment variable naming the Socrata dataset id
    pub dataset_var: &'static str,
    /// Environment variable naming the report endpoint
    pub endpoint_var: &'static str,
    /// Steps run on source-labelled columns
    pub pre: &'static [Step],
    pub field_map: FieldMap,
    /// Steps run on dataset field names
    pub post: &'static [Step],
    pub method: LoadMethod,
}

impl ReportDataset {
    pub fn transform(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        let mut records = records;
        for step in self.pre {
            records = step.apply(records)?;
        }
        records = apply_field_map(records, self.field_map)?;
        for step in self.post {
            records = step.apply(records)?;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_apply_field_map_selects_and_renames() {
        const MAP: FieldMap = &[("Created Date", "sr_created_date"), ("SR Status", "status")];
        let records = vec![record(json!({
            "Created Date": "2025-10-15 08:00:00",
            "SR Status": "Closed",
            "Unmapped": 1,
        }))];

        let mapped = apply_field_map(records, MAP).unwrap();
        assert_eq!(
            Value::Object(mapped[0].clone()),
            json!({"sr_created_date": "2025-10-15 08:00:00", "status": "Closed"})
        );
    }

    #[test]
    fn test_apply_field_map_missing_column() {
        const MAP: FieldMap = &[("Close Date", "sr_closed_date")];
        let err = apply_field_map(vec![record(json!({"Created Date": null}))], MAP).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn(ref c) if c == "Close Date"));
    }

    #[test]
    fn test_fiscal_year_step() {
        let records = vec![
            record(json!({"Created Date": "10/01/2024 09:00:00 AM"})),
            record(json!({"Created Date": "2024-09-30 23:59:59"})),
            record(json!({"Created Date": null})),
        ];
        let out = Step::FiscalYear {
            from: "Created Date",
        }
        .apply(records)
        .unwrap();

        assert_eq!(out[0]["fiscal_year"], json!(2025));
        assert_eq!(out[1]["fiscal_year"], json!(2024));
        assert_eq!(out[2]["fiscal_year"], Value::Null);
    }

    #[test]
    fn test_format_dates_step() {
        let records = vec![record(json!({
            "sr_created_date": "10/15/2025 08:05:09 PM",
            "sr_closed_date": null,
            "sr_updated_date": "",
            "description": "10/15/2025",
        }))];
        let out = Step::FormatDates.apply(records).unwrap();

        assert_eq!(out[0]["sr_created_date"], json!("2025-10-15T20:05:09"));
        assert_eq!(out[0]["sr_closed_date"], Value::Null);
        assert_eq!(out[0]["sr_updated_date"], Value::Null);
        assert_eq!(out[0]["description"], json!("10/15/2025"));
    }

    #[test]
    fn test_format_dates_rejects_unparseable() {
        let records = vec![record(json!({"sr_created_date": "someday"}))];
        let err = Step::FormatDates.apply(records).unwrap_err();
        assert!(matches!(err, EtlError::InvalidInput(_)));
    }

    #[test]
    fn test_project_state_plane_step() {
        let records = vec![
            record(json!({"X": 3115180.857216383, "Y": 10071476.985145131})),
            record(json!({"X": null, "Y": 10071476.985145131})),
        ];
        let out = Step::ProjectStatePlane { x: "X", y: "Y" }
            .apply(records)
            .unwrap();

        let lat = out[0]["latitude"].as_f64().unwrap();
        let lon = out[0]["longitude"].as_f64().unwrap();
        assert!((lat - 30.27).abs() < 1e-6);
        assert!((lon + 97.74).abs() < 1e-6);
        assert_eq!(out[0]["location"], json!(format!("POINT ({} {})", lon, lat)));

        assert_eq!(out[1]["latitude"], Value::Null);
        assert_eq!(out[1]["location"], Value::Null);
    }

    #[test]
    fn test_drop_missing_step() {
        let records = vec![
            record(json!({"activity_id": 7})),
            record(json!({"activity_id": null})),
            record(json!({})),
        ];
        let out = Step::DropMissing {
            field: "activity_id",
        }
        .apply(records)
        .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_exclude_values_step() {
        const IGNORED: &[&str] = &["Mobile Apps Reporter Information"];
        let records = vec![
            record(json!({"flex_question": "Mobile Apps Reporter Information"})),
            record(json!({"flex_question": "Is the light out?"})),
            record(json!({"flex_question": null})),
        ];
        let out = Step::ExcludeValues {
            field: "flex_question",
            values: IGNORED,
        }
        .apply(records)
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["flex_question"], json!("Is the light out?"));
    }
}
