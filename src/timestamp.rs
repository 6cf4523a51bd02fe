//! Timestamp normalization.
//!
//! Documents written by different clients over the years store times in
//! several shapes: the hosted store's `{_seconds, _nanoseconds}` object,
//! ISO strings, and epoch milliseconds. Everything is normalized to UTC
//! before it leaves the API.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::warn;

/// Convert any supported timestamp representation to a UTC instant.
pub fn normalize(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Null => None,
        Value::Object(obj) => from_timestamp_object(obj),
        Value::String(s) => parse_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        other => {
            warn!("Unknown timestamp format: {}", other);
            None
        }
    }
}

fn from_timestamp_object(obj: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let seconds = obj
        .get("_seconds")
        .or_else(|| obj.get("seconds"))
        .and_then(Value::as_i64);
    let Some(seconds) = seconds else {
        warn!("Unknown timestamp format: {:?}", obj);
        return None;
    };
    let nanos = obj
        .get("_nanoseconds")
        .or_else(|| obj.get("nanoseconds"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let Some(millis) = seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(nanos / 1_000_000))
    else {
        warn!("Timestamp out of range: {}s {}ns", seconds, nanos);
        return None;
    };
    Utc.timestamp_millis_opt(millis).single()
}

fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Normalized ISO string for `value`, or JSON null.
pub fn iso_or_null(value: Option<&Value>) -> Value {
    value
        .and_then(normalize)
        .map(|dt| Value::String(to_iso(&dt)))
        .unwrap_or(Value::Null)
}

/// Rewrite the named fields to ISO strings where they normalize.
pub fn isoify_fields(data: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = data.get_mut(*key) {
            if let Some(dt) = normalize(value) {
                *value = Value::String(to_iso(&dt));
            }
        }
    }
}

pub fn now_iso() -> String {
    to_iso(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_timestamp_object_keeps_millisecond_precision() {
        let dt = normalize(&json!({ "_seconds": 1_700_000_000, "_nanoseconds": 123_999_999 }))
            .unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_123);

        let dt = normalize(&json!({ "seconds": 10, "nanoseconds": 0 })).unwrap();
        assert_eq!(dt.timestamp_millis(), 10_000);
    }

    #[test]
    fn strings_and_numbers_normalize() {
        let dt = normalize(&json!("2024-06-01T08:30:00+07:00")).unwrap();
        assert_eq!(to_iso(&dt), "2024-06-01T01:30:00.000Z");

        let dt = normalize(&json!("2024-06-01")).unwrap();
        assert_eq!(to_iso(&dt), "2024-06-01T00:00:00.000Z");

        let dt = normalize(&json!(0)).unwrap();
        assert_eq!(to_iso(&dt), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn unknown_shapes_are_none() {
        assert!(normalize(&Value::Null).is_none());
        assert!(normalize(&json!(true)).is_none());
        assert!(normalize(&json!("next tuesday")).is_none());
        assert!(normalize(&json!({ "when": 1 })).is_none());
    }

    #[test]
    fn out_of_range_timestamp_objects_are_none() {
        assert!(normalize(&json!({ "_seconds": i64::MAX / 10, "_nanoseconds": 0 })).is_none());
        assert!(normalize(&json!({ "_seconds": i64::MIN, "_nanoseconds": 0 })).is_none());
        assert!(
            normalize(&json!({ "_seconds": i64::MAX / 1000, "_nanoseconds": 999_999_999 }))
                .is_none()
        );
        assert!(normalize(&json!(i64::MAX)).is_none());

        let mut data = json!({ "createdAt": { "_seconds": i64::MAX / 10 } })
            .as_object()
            .cloned()
            .unwrap();
        isoify_fields(&mut data, &["createdAt"]);
        assert_eq!(data["createdAt"]["_seconds"], i64::MAX / 10);
    }

    #[test]
    fn isoify_only_touches_named_fields() {
        let mut data = json!({
            "createdAt": { "_seconds": 0, "_nanoseconds": 0 },
            "lastModified": "not a date",
            "title": "Robot arm",
        })
        .as_object()
        .cloned()
        .unwrap();

        isoify_fields(&mut data, &["createdAt", "lastModified", "lastUpdated"]);
        assert_eq!(data["createdAt"], "1970-01-01T00:00:00.000Z");
        assert_eq!(data["lastModified"], "not a date");
        assert_eq!(data["title"], "Robot arm");
        assert!(!data.contains_key("lastUpdated"));
    }
}
