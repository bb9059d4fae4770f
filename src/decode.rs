//! Row-tolerant decoder for delimited sensor reading files.
//!
//! Source files are UTF-8 text with one `{timestamp};{value}` record per
//! line. Values use a **comma** as the decimal separator (`12,5`), which is
//! how the upstream ingestion writes them; a dot is not a valid character
//! in a value and such rows are dropped like any other malformed row.
//!
//! Malformed rows never fail the decode as a whole — they are skipped and
//! the rest of the stream is processed. This mirrors the tolerance of the
//! data tier: a single corrupt row must not make a whole day unreadable.

use chrono::NaiveDateTime;

use crate::models::SensorReading;

/// Default field delimiter used by all backend artifacts.
pub const DEFAULT_DELIMITER: char = ';';

/// Timestamp formats accepted in column 0, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Decodes a reading file into its well-formed rows, preserving input
/// order. `has_header` skips the first line entirely.
pub fn decode_readings(bytes: &[u8], has_header: bool, delimiter: char) -> Vec<SensorReading> {
    let text = String::from_utf8_lossy(bytes);
    let skip = usize::from(has_header);

    text.lines()
        .skip(skip)
        .filter_map(|line| decode_row(line, delimiter))
        .collect()
}

/// Parses one row, returning `None` for anything malformed: missing
/// delimiter, unparseable timestamp, or unparseable value.
fn decode_row(line: &str, delimiter: char) -> Option<SensorReading> {
    let mut fields = line.split(delimiter);
    let timestamp = parse_timestamp(fields.next()?)?;
    let value = parse_comma_decimal(fields.next()?)?;
    Some(SensorReading { timestamp, value })
}

fn parse_timestamp(field: &str) -> Option<NaiveDateTime> {
    let field = field.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(field, fmt).ok())
}

/// Parses a decimal with comma as the decimal separator. At most one comma
/// is allowed; a dot anywhere makes the field malformed.
fn parse_comma_decimal(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() || field.contains('.') {
        return None;
    }
    let normalized = field.replacen(',', ".", 1);
    // A second comma survives the replacen and fails the parse below.
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
