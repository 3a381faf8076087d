// ABOUTME: Per-record reshaping of Open311 service requests before upload
// ABOUTME: Derives the WKT location, floats timestamps to Central time, applies the allow-list

use serde_json::Value;

use crate::datetime::utc_to_floating_central;
use crate::error::{EtlError, Result};
use crate::record::{is_truthy, scalar_text, wkt_point, Record};

/// Timestamps the API reports in UTC and the dataset stores as floating Central time.
pub const TIMESTAMP_FIELDS: [&str; 2] = ["updated_datetime", "requested_datetime"];

/// Columns of the realtime dataset. Anything else the API adds is dropped.
pub const OPEN311_FIELDS: &[&str] = &[
    "service_request_id",
    "status",
    "status_notes",
    "service_name",
    "service_code",
    "description",
    "agency_responsible",
    "service_notice",
    "requested_datetime",
    "updated_datetime",
    "expected_datetime",
    "address",
    "address_id",
    "zipcode",
    "lat",
    "long",
    "media_url",
    "location",
];

/// `POINT (<long> <lat>)` when both coordinates are present, non-zero and
/// numeric, otherwise null.
pub fn point_location(record: &Record) -> Value {
    let coordinate = |key: &str| {
        record
            .get(key)
            .filter(|v| is_truthy(v))
            .and_then(scalar_text)
            .filter(|s| s.parse::<f64>().is_ok_and(f64::is_finite))
    };

    match (coordinate("long"), coordinate("lat")) {
        (Some(long), Some(lat)) => Value::String(wkt_point(&long, &lat)),
        _ => Value::Null,
    }
}

/// Rewrite each present, non-null UTC timestamp in `fields` as floating
/// Central time, in place.
pub fn localize_timestamps(record: &mut Record, fields: &[&str]) -> Result<()> {
    for field in fields {
        let Some(value) = record.get_mut(*field) else {
            continue;
        };
        if !is_truthy(value) {
            continue;
        }
        let text = value.as_str().ok_or_else(|| {
            EtlError::InvalidInput(format!("{} is not a timestamp string: {}", field, value))
        })?;
        *value = Value::String(utc_to_floating_central(text)?);
    }
    Ok(())
}

/// Drop every field not named in `allowed`.
pub fn restrict_fields<S: AsRef<str>>(record: &mut Record, allowed: &[S]) {
    record.retain(|key, _| allowed.iter().any(|a| a.as_ref() == key.as_str()));
}

/// Apply location derivation, timestamp localization and the optional
/// allow-list to one record.
pub fn normalize_record(record: &mut Record, allow_list: Option<&[String]>) -> Result<()> {
    let location = point_location(record);
    record.insert("location".to_string(), location);
    localize_timestamps(record, &TIMESTAMP_FIELDS)?;
    if let Some(allowed) = allow_list {
        restrict_fields(record, allowed);
    }
    Ok(())
}

/// Normalize a page of records; the first failure aborts the page.
pub fn normalize_page(records: &mut [Record], allow_list: Option<&[String]>) -> Result<()> {
    for record in records.iter_mut() {
        normalize_record(record, allow_list)?;
    }
    Ok(())
}

/// The default allow-list as owned strings.
pub fn default_allow_list() -> Vec<String> {
    OPEN311_FIELDS.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_point_location() {
        let rec = record(json!({"lat": 30.27, "long": -97.74}));
        assert_eq!(point_location(&rec), json!("POINT (-97.74 30.27)"));
    }

    #[test]
    fn test_point_location_missing_coordinate() {
        assert_eq!(
            point_location(&record(json!({"lat": null, "long": -97.74}))),
            Value::Null
        );
        assert_eq!(point_location(&record(json!({"long": -97.74}))), Value::Null);
        assert_eq!(
            point_location(&record(json!({"lat": 0, "long": -97.74}))),
            Value::Null
        );
        assert_eq!(
            point_location(&record(json!({"lat": "", "long": "-97.74"}))),
            Value::Null
        );
    }

    #[test]
    fn test_point_location_non_numeric_coordinate() {
        assert_eq!(
            point_location(&record(json!({"lat": "n/a", "long": "-97.74"}))),
            Value::Null
        );
        assert_eq!(
            point_location(&record(json!({"lat": "30.27", "long": "NaN"}))),
            Value::Null
        );
        assert_eq!(
            point_location(&record(json!({"lat": "30.27", "long": "inf"}))),
            Value::Null
        );
        assert_eq!(
            point_location(&record(json!({"lat": [30.27], "long": -97.74}))),
            Value::Null
        );
    }

    #[test]
    fn test_point_location_string_coordinates() {
        let rec = record(json!({"lat": "30.2672", "long": "-97.7431"}));
        assert_eq!(point_location(&rec), json!("POINT (-97.7431 30.2672)"));
    }

    #[test]
    fn test_localize_timestamps() {
        let mut rec = record(json!({
            "updated_datetime": "2025-10-15T13:00:00Z",
            "requested_datetime": null,
            "expected_datetime": "2025-10-20T00:00:00Z",
        }));
        localize_timestamps(&mut rec, &TIMESTAMP_FIELDS).unwrap();
        assert_eq!(rec["updated_datetime"], json!("2025-10-15T08:00:00"));
        assert_eq!(rec["requested_datetime"], Value::Null);
        assert_eq!(rec["expected_datetime"], json!("2025-10-20T00:00:00Z"));
    }

    #[test]
    fn test_localize_timestamps_with_offset() {
        let mut rec = record(json!({"requested_datetime": "2025-01-10T09:15:30+00:00"}));
        localize_timestamps(&mut rec, &TIMESTAMP_FIELDS).unwrap();
        assert_eq!(rec["requested_datetime"], json!("2025-01-10T03:15:30"));
    }

    #[test]
    fn test_localize_timestamps_rejects_garbage() {
        let mut rec = record(json!({"updated_datetime": "yesterday"}));
        let err = localize_timestamps(&mut rec, &TIMESTAMP_FIELDS).unwrap_err();
        assert!(matches!(err, EtlError::InvalidInput(_)));

        let mut rec = record(json!({"updated_datetime": 1760533200}));
        assert!(localize_timestamps(&mut rec, &TIMESTAMP_FIELDS).is_err());
    }

    #[test]
    fn test_restrict_fields() {
        let mut rec = record(json!({"a": 1, "b": 2, "c": 3}));
        restrict_fields(&mut rec, &["a", "c"]);
        assert_eq!(Value::Object(rec), json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_normalize_record_with_allow_list() {
        let allow = vec!["a".to_string(), "c".to_string()];
        let mut rec = record(json!({"a": 1, "b": 2, "c": 3}));
        normalize_record(&mut rec, Some(allow.as_slice())).unwrap();
        assert_eq!(Value::Object(rec), json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_normalize_record_full() {
        let allow = default_allow_list();
        let mut rec = record(json!({
            "service_request_id": "25-00412345",
            "lat": 30.27,
            "long": -97.74,
            "updated_datetime": "2025-10-15T13:00:00Z",
            "requested_datetime": "2025-10-15T12:00:00Z",
            "extended_attributes": {"x": 1},
        }));
        normalize_record(&mut rec, Some(allow.as_slice())).unwrap();

        assert_eq!(rec["location"], json!("POINT (-97.74 30.27)"));
        assert_eq!(rec["updated_datetime"], json!("2025-10-15T08:00:00"));
        assert_eq!(rec["requested_datetime"], json!("2025-10-15T07:00:00"));
        assert!(!rec.contains_key("extended_attributes"));
    }

    #[test]
    fn test_normalize_record_without_allow_list_keeps_everything() {
        let mut rec = record(json!({"lat": null, "long": null, "extra": true}));
        normalize_record(&mut rec, None).unwrap();
        assert_eq!(rec["location"], Value::Null);
        assert_eq!(rec["extra"], json!(true));
    }
}
