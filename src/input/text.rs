//! Line-oriented text adapter.

use crate::core::{Fix, FixError};
use crate::input::timestamp::parse_timestamp;
use crate::input::{ParseOutcome, ParseWarning};
use std::time::{SystemTime, UNIX_EPOCH};

/// Parse one fix per line: tokens separated by commas, semicolons, tabs or
/// spaces; the first two numeric tokens are latitude and longitude, the
/// remainder (if any) is the timestamp. Blank lines and lines starting with
/// `#` or `//` are skipped silently; malformed lines are skipped with a
/// warning. Missing timestamps are synthesised from the current wall clock
/// plus one second per fix.
pub fn parse_from_string(text: &str) -> ParseOutcome {
    parse_from_string_with_base(text, now_ms())
}

/// Same as [`parse_from_string`] with an explicit synthesis base, for
/// deterministic replay and tests.
pub fn parse_from_string_with_base(text: &str, base_ms: u64) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let tokens: Vec<&str> = line
            .split(|c: char| matches!(c, ',' | ';' | '\t' | ' '))
            .filter(|t| !t.is_empty())
            .collect();

        let mut numeric = Vec::with_capacity(2);
        let mut rest_from = tokens.len();
        for (i, token) in tokens.iter().enumerate() {
            if let Ok(value) = token.parse::<f64>() {
                numeric.push(value);
                if numeric.len() == 2 {
                    rest_from = i + 1;
                    break;
                }
            }
        }

        if numeric.len() < 2 {
            outcome.warnings.push(ParseWarning::InvalidFormat {
                record: line_no,
                details: format!("expected two numeric coordinates, found {}", numeric.len()),
            });
            continue;
        }

        let (lat, lng) = (numeric[0], numeric[1]);
        // datetime tokens may have been split on the space separator; the
        // remainder of the line is rejoined before parsing
        let timestamp_token = tokens[rest_from..].join(" ");
        let t = if timestamp_token.is_empty() {
            synthesised(base_ms, outcome.fixes.len())
        } else {
            match parse_timestamp(&timestamp_token) {
                Some(t) => t,
                None => {
                    outcome.warnings.push(ParseWarning::InvalidTimestamp {
                        record: line_no,
                        token: timestamp_token,
                    });
                    synthesised(base_ms, outcome.fixes.len())
                }
            }
        };

        match Fix::new(lat, lng, t) {
            Ok(fix) => outcome.fixes.push(fix),
            Err(e) => outcome.warnings.push(range_warning(line_no, e)),
        }
    }

    outcome
}

fn synthesised(base_ms: u64, index: usize) -> u64 {
    base_ms + index as u64 * 1000
}

pub(crate) fn range_warning(record: usize, error: FixError) -> ParseWarning {
    match error {
        FixError::LatitudeOutOfRange { value } => {
            ParseWarning::RangeViolation { record, field: "latitude", value }
        }
        FixError::LongitudeOutOfRange { value } => {
            ParseWarning::RangeViolation { record, field: "longitude", value }
        }
        FixError::NonFiniteCoordinate { field, value } => {
            ParseWarning::RangeViolation { record, field, value }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_separators() {
        let text = "39.9042,116.4074,1700000000000\n39.9043;116.4075;1700000001000\n39.9044\t116.4076\t1700000002000\n39.9045 116.4077 1700000003000\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes.len(), 4);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.fixes[0].t, 1_700_000_000_000);
        assert_eq!(outcome.fixes[3].lng, 116.4077);
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let text = "# header comment\n\n// another comment\n39.9,116.4,1700000000000\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_line_skipped_with_warning() {
        let text = "95.0,116.4,1700000000000\n39.9,116.4,1700000001000\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes.len(), 1);
        assert_eq!(
            outcome.warnings,
            vec![ParseWarning::RangeViolation { record: 1, field: "latitude", value: 95.0 }]
        );
    }

    #[test]
    fn test_malformed_line_warns_and_continues() {
        let text = "not a fix at all\n39.9,116.4,1700000000000\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            ParseWarning::InvalidFormat { record: 1, .. }
        ));
    }

    #[test]
    fn test_missing_timestamp_synthesised() {
        let text = "39.9,116.4\n39.91,116.41\n";
        let outcome = parse_from_string_with_base(text, 5_000);
        assert_eq!(outcome.fixes.len(), 2);
        assert_eq!(outcome.fixes[0].t, 5_000);
        assert_eq!(outcome.fixes[1].t, 6_000);
    }

    #[test]
    fn test_civil_datetime_timestamp() {
        let text = "39.9,116.4,2023-11-14 22:13:20\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes.len(), 1);
        assert_eq!(outcome.fixes[0].t, 1_700_000_000_000);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_bad_timestamp_warns_but_keeps_fix() {
        let text = "39.9,116.4,not-a-time\n";
        let outcome = parse_from_string_with_base(text, 9_000);
        assert_eq!(outcome.fixes.len(), 1);
        assert_eq!(outcome.fixes[0].t, 9_000);
        assert!(matches!(
            outcome.warnings[0],
            ParseWarning::InvalidTimestamp { record: 1, .. }
        ));
    }

    #[test]
    fn test_seconds_timestamps_scaled() {
        let text = "39.9,116.4,1700000000\n";
        let outcome = parse_from_string_with_base(text, 0);
        assert_eq!(outcome.fixes[0].t, 1_700_000_000_000);
    }
}
