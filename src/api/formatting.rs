//! Output formatting: canonical JSON and CSV, with an optional coordinate
//! shift for renderers that sit on a Chinese map base.

use crate::algorithms::gcj02::wgs84_to_gcj02;
use crate::api::types::ProcessingResult;
use crate::core::{ExtendedFix, Fix};

/// Coordinate frame of exported positions. The detector always works in
/// WGS-84; GCJ-02 is applied only at the export boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateFrame {
    #[default]
    Wgs84,
    Gcj02,
}

fn project(fix: &Fix, frame: CoordinateFrame) -> Fix {
    match frame {
        CoordinateFrame::Wgs84 => *fix,
        CoordinateFrame::Gcj02 => {
            let shifted = wgs84_to_gcj02((*fix).into());
            Fix { lat: shifted.lat, lng: shifted.lng, t: fix.t }
        }
    }
}

/// Serialize fixes to the canonical `{lat, lng, timestamp}` JSON array.
pub fn export_fixes_json(
    fixes: &[Fix],
    frame: CoordinateFrame,
    pretty: bool,
) -> Result<String, serde_json::Error> {
    let projected: Vec<Fix> = fixes.iter().map(|f| project(f, frame)).collect();
    if pretty {
        serde_json::to_string_pretty(&projected)
    } else {
        serde_json::to_string(&projected)
    }
}

/// Serialize a processing result, optionally pretty-printed.
pub fn export_result_json(
    result: &ProcessingResult,
    pretty: bool,
) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
}

/// Render extended records as CSV. The extended columns appear only when at
/// least one record carries any of them; absent values are empty cells.
pub fn export_fixes_csv(records: &[ExtendedFix], frame: CoordinateFrame) -> String {
    let has_extended = records
        .iter()
        .any(|r| r.speed.is_some() || r.altitude.is_some() || r.course.is_some());

    let mut out = String::new();
    if has_extended {
        out.push_str("lat,lng,timestamp,spd,alt,cog\n");
    } else {
        out.push_str("lat,lng,timestamp\n");
    }

    for record in records {
        let fix = project(&record.fix, frame);
        out.push_str(&format!("{},{},{}", fix.lat, fix.lng, fix.t));
        if has_extended {
            out.push(',');
            push_optional(&mut out, record.speed);
            out.push(',');
            push_optional(&mut out, record.altitude);
            out.push(',');
            push_optional(&mut out, record.course);
        }
        out.push('\n');
    }
    out
}

fn push_optional(out: &mut String, value: Option<f64>) {
    if let Some(v) = value {
        out.push_str(&v.to_string());
    }
}
