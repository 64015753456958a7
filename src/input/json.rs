//! JSON adapter: discovers the trajectory array inside the shapes that
//! logging tools actually emit, then reads fix-like objects through a set of
//! field aliases.

use crate::core::Fix;
use crate::input::text::range_warning;
use crate::input::timestamp::parse_timestamp;
use crate::input::{ParseError, ParseOutcome, ParseWarning};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Keys probed, in order, for the trajectory array of a top-level object.
const ARRAY_KEYS: [&str; 6] = ["points", "data", "locations", "coordinates", "trajectory", "path"];

const LAT_KEYS: [&str; 4] = ["lat", "latitude", "latitude1", "y"];
const LNG_KEYS: [&str; 5] = ["lng", "lon", "longitude", "longitude1", "x"];
const TIME_KEYS: [&str; 5] = ["timestamp", "time", "currentTime", "date", "datetime"];

/// Parse a JSON document from text and extract its fixes.
pub fn load_from_json_str(text: &str) -> Result<ParseOutcome, ParseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::UnsupportedStructure {
        details: format!("not valid JSON: {}", e),
    })?;
    load_from_json(&value)
}

/// Extract fixes from an already-parsed JSON value. Accepts a top-level
/// array, an object with the array under a known key, or the nested
/// `data[0].locations` / `data[0].section.locations` fallbacks.
pub fn load_from_json(value: &Value) -> Result<ParseOutcome, ParseError> {
    load_from_json_with_base(value, now_ms())
}

/// Same as [`load_from_json`] with an explicit timestamp-synthesis base.
pub fn load_from_json_with_base(value: &Value, base_ms: u64) -> Result<ParseOutcome, ParseError> {
    let array = find_trajectory_array(value)?;
    let mut outcome = ParseOutcome::default();

    for (index, candidate) in array.iter().enumerate() {
        match read_candidate(candidate, index, base_ms, &mut outcome.warnings) {
            Some(fix) => outcome.fixes.push(fix),
            None => continue,
        }
    }
    Ok(outcome)
}

fn find_trajectory_array(value: &Value) -> Result<&Vec<Value>, ParseError> {
    if let Some(array) = value.as_array() {
        return Ok(array);
    }
    if value.is_object() {
        for key in ARRAY_KEYS {
            if let Some(array) = value.get(key).and_then(Value::as_array) {
                // an array of wrapper objects (no coordinates) is not the
                // trajectory; keep probing so the nested fallbacks can run
                if looks_fix_like(array) {
                    return Ok(array);
                }
            }
        }
        // legacy exports nest the track one or two levels under data[0]
        if let Some(first) = value.get("data").and_then(|d| d.get(0)) {
            if let Some(array) = first.get("locations").and_then(Value::as_array) {
                return Ok(array);
            }
            if let Some(array) = first
                .get("section")
                .and_then(|s| s.get("locations"))
                .and_then(Value::as_array)
            {
                return Ok(array);
            }
        }
    }
    Err(ParseError::UnsupportedStructure {
        details: "no trajectory array found at the top level or under any known key".to_string(),
    })
}

fn looks_fix_like(array: &[Value]) -> bool {
    match array.first() {
        None => true,
        Some(Value::Object(object)) => LAT_KEYS.iter().any(|k| object.contains_key(*k)),
        // non-object elements are surfaced as per-record warnings downstream
        Some(_) => true,
    }
}

fn read_candidate(
    candidate: &Value,
    index: usize,
    base_ms: u64,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Fix> {
    let object = match candidate.as_object() {
        Some(o) => o,
        None => {
            warnings.push(ParseWarning::InvalidFormat {
                record: index,
                details: "trajectory element is not an object".to_string(),
            });
            return None;
        }
    };

    let lat = first_number(object, &LAT_KEYS);
    let lng = first_number(object, &LNG_KEYS);
    let (lat, lng) = match (lat, lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            warnings.push(ParseWarning::InvalidFormat {
                record: index,
                details: "no latitude/longitude under any known key".to_string(),
            });
            return None;
        }
    };

    let t = match first_timestamp(object, &TIME_KEYS) {
        TimestampField::Parsed(t) => t,
        TimestampField::Missing => base_ms + index as u64 * 1000,
        TimestampField::Unparseable(token) => {
            warnings.push(ParseWarning::InvalidTimestamp { record: index, token });
            base_ms + index as u64 * 1000
        }
    };

    match Fix::new(lat, lng, t) {
        Ok(fix) => Some(fix),
        Err(e) => {
            warnings.push(range_warning(index, e));
            None
        }
    }
}

// Numbers may arrive as JSON numbers or as numeric strings; loggers emit both.
fn first_number(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match object.get(*key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().parse::<f64>() {
                    return Some(v);
                }
            }
            _ => continue,
        }
    }
    None
}

enum TimestampField {
    Parsed(u64),
    Missing,
    Unparseable(String),
}

fn first_timestamp(object: &serde_json::Map<String, Value>, keys: &[&str]) -> TimestampField {
    for key in keys {
        match object.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(t) = n.as_f64().and_then(|v| parse_timestamp(&v.to_string())) {
                    return TimestampField::Parsed(t);
                }
                return TimestampField::Unparseable(n.to_string());
            }
            Some(Value::String(s)) => {
                return match parse_timestamp(s) {
                    Some(t) => TimestampField::Parsed(t),
                    None => TimestampField::Unparseable(s.clone()),
                };
            }
            _ => continue,
        }
    }
    TimestampField::Missing
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
