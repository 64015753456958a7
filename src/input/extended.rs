//! CSV adapter and the extended-record reduction.
//!
//! The CSV shape is `lat,lng,timestamp[,spd,alt,cog]`; header order is
//! honored, unknown columns are ignored, and the optional extended columns
//! may be blank or `null` per row.

use crate::core::{ExtendedFix, Fix};
use crate::input::text::range_warning;
use crate::input::timestamp::parse_timestamp;
use crate::input::{ParseError, ParseOutcome, ParseWarning};

/// Reduce extended records to the canonical fixes the detector consumes.
pub fn from_extended(records: &[ExtendedFix]) -> Vec<Fix> {
    records.iter().map(ExtendedFix::reduce).collect()
}

/// Parse CSV text into plain fixes, dropping the extended fields.
pub fn parse_csv(text: &str) -> Result<ParseOutcome, ParseError> {
    let (records, warnings) = parse_csv_extended(text)?;
    Ok(ParseOutcome { fixes: from_extended(&records), warnings })
}

/// Parse CSV text into extended records, keeping speed/altitude/course where
/// present.
pub fn parse_csv_extended(text: &str) -> Result<(Vec<ExtendedFix>, Vec<ParseWarning>), ParseError> {
    let mut lines = text.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => {
                return Err(ParseError::UnsupportedStructure {
                    details: "empty CSV document".to_string(),
                })
            }
        }
    };

    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let lat_col = column_index(&columns, "lat")?;
    let lng_col = column_index(&columns, "lng")?;
    let time_col = column_index(&columns, "timestamp")?;
    let spd_col = columns.iter().position(|c| c == "spd");
    let alt_col = columns.iter().position(|c| c == "alt");
    let cog_col = columns.iter().position(|c| c == "cog");

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (line_index, raw_line) in lines {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();

        let lat = cells.get(lat_col).and_then(|c| c.parse::<f64>().ok());
        let lng = cells.get(lng_col).and_then(|c| c.parse::<f64>().ok());
        let t = cells.get(time_col).and_then(|c| parse_timestamp(c));
        let (lat, lng, t) = match (lat, lng, t) {
            (Some(lat), Some(lng), Some(t)) => (lat, lng, t),
            _ => {
                warnings.push(ParseWarning::InvalidFormat {
                    record: line_no,
                    details: "row is missing lat, lng or timestamp".to_string(),
                });
                continue;
            }
        };

        let fix = match Fix::new(lat, lng, t) {
            Ok(fix) => fix,
            Err(e) => {
                warnings.push(range_warning(line_no, e));
                continue;
            }
        };

        records.push(ExtendedFix {
            fix,
            speed: optional_cell(&cells, spd_col),
            altitude: optional_cell(&cells, alt_col),
            course: optional_cell(&cells, cog_col),
        });
    }

    Ok((records, warnings))
}

fn column_index(columns: &[String], name: &str) -> Result<usize, ParseError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| ParseError::UnsupportedStructure {
            details: format!("CSV header is missing the '{}' column", name),
        })
}

fn optional_cell(cells: &[&str], column: Option<usize>) -> Option<f64> {
    let cell = cells.get(column?)?;
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
        return None;
    }
    cell.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_header() {
        let text = "lat,lng,timestamp\n39.9,116.4,1700000000000\n39.91,116.41,1700000001000\n";
        let outcome = parse_csv(text).unwrap();
        assert_eq!(outcome.fixes.len(), 2);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.fixes[1].t, 1_700_000_001_000);
    }

    #[test]
    fn test_extended_columns_with_nulls() {
        let text = "lat,lng,timestamp,spd,alt,cog\n39.9,116.4,1700000000000,12.5,44.0,180.0\n39.91,116.41,1700000001000,null,,90.0\n";
        let (records, warnings) = parse_csv_extended(text).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speed, Some(12.5));
        assert_eq!(records[0].altitude, Some(44.0));
        assert_eq!(records[1].speed, None);
        assert_eq!(records[1].altitude, None);
        assert_eq!(records[1].course, Some(90.0));

        let fixes = from_extended(&records);
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].lat, 39.9);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let text = "lat,timestamp\n39.9,1700000000000\n";
        assert!(matches!(
            parse_csv(text),
            Err(ParseError::UnsupportedStructure { .. })
        ));
    }

    #[test]
    fn test_bad_rows_warn_and_continue() {
        let text = "lat,lng,timestamp\n39.9,116.4,1700000000000\noops,116.4,1700000001000\n95.0,116.4,1700000002000\n";
        let outcome = parse_csv(text).unwrap();
        assert_eq!(outcome.fixes.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(matches!(outcome.warnings[0], ParseWarning::InvalidFormat { record: 2, .. }));
        assert!(matches!(
            outcome.warnings[1],
            ParseWarning::RangeViolation { record: 3, field: "latitude", .. }
        ));
    }

    #[test]
    fn test_civil_datetime_cells() {
        let text = "lat,lng,timestamp\n39.9,116.4,2023-11-14T22:13:20Z\n";
        let outcome = parse_csv(text).unwrap();
        assert_eq!(outcome.fixes[0].t, 1_700_000_000_000);
    }

    #[test]
    fn test_empty_document_fails() {
        assert!(parse_csv("").is_err());
        assert!(parse_csv("\n\n").is_err());
    }
}
