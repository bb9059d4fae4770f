//! Device catalog reader.
//!
//! The catalog (`metadata.csv`) is the registry mapping each device to the
//! sensor types it reports, one `{deviceId};{sensorType}` row per pairing.
//! It is re-read from storage on every device-wide query — no caching, so
//! there is no staleness to reason about.
//!
//! Unlike sensor data files, the catalog gets no row-level tolerance: a
//! short row fails the whole read. The catalog is the only map from a
//! device to its sensors, and skipping a truncated row would silently drop
//! a sensor from every aggregate answer.

use thiserror::Error;

use crate::models::CatalogEntry;

/// Catalog parse failure. Always fatal for the read.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog row {line_no}: expected `deviceId;sensorType`, got {line:?}")]
    MalformedRow { line_no: usize, line: String },
}

/// Parses the full catalog, preserving file order. Blank lines are
/// skipped; any other row with fewer than two fields is fatal.
pub fn read_catalog(bytes: &[u8]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let text = String::from_utf8_lossy(bytes);
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(';');
        let device_id = fields.next().unwrap_or_default().trim();
        let sensor_type = fields.next().map(str::trim);

        match sensor_type {
            Some(sensor_type) if !device_id.is_empty() && !sensor_type.is_empty() => {
                entries.push(CatalogEntry {
                    device_id: device_id.to_string(),
                    sensor_type: sensor_type.to_string(),
                });
            }
            _ => {
                return Err(CatalogError::MalformedRow {
                    line_no: idx + 1,
                    line: line.to_string(),
                });
            }
        }
    }

    Ok(entries)
}
