//! Core data types flowing through the retrieval pipeline.
//!
//! Readings are decoded fresh per request and handed straight to the
//! caller; nothing here is persisted or shared between queries.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Object key of the device catalog inside the backend container.
pub const CATALOG_KEY: &str = "metadata.csv";

/// Name of the cold-tier archive within a device/sensor prefix.
pub const ARCHIVE_NAME: &str = "historical.zip";

/// A single decoded measurement.
///
/// Serialized field names (`EventDateTime`, `SensorValue`) are part of the
/// wire contract and must not change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    #[serde(rename = "EventDateTime")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "SensorValue")]
    pub value: f64,
}

/// One row of the device catalog: a (device, sensor type) pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub device_id: String,
    pub sensor_type: String,
}

/// Key of the hot-tier object holding one device/sensor/date of readings.
pub fn hot_object_key(device_id: &str, sensor_type: &str, date: &str) -> String {
    format!("{}/{}/{}.csv", device_id, sensor_type, date)
}

/// Key of the cold-tier archive for a device/sensor pair.
pub fn archive_key(device_id: &str, sensor_type: &str) -> String {
    format!("{}/{}/{}", device_id, sensor_type, ARCHIVE_NAME)
}

/// Entry name of one date's readings inside a cold archive.
pub fn archive_entry_name(date: &str) -> String {
    format!("{}.csv", date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_object_key_shapes() {
        assert_eq!(
            hot_object_key("dockan", "humidity", "2019-01-10"),
            "dockan/humidity/2019-01-10.csv"
        );
        assert_eq!(
            archive_key("dockan", "rainfall"),
            "dockan/rainfall/historical.zip"
        );
        assert_eq!(archive_entry_name("2022-01-05"), "2022-01-05.csv");
    }

    #[test]
    fn test_reading_wire_shape() {
        let reading = SensorReading {
            timestamp: NaiveDate::from_ymd_opt(2019, 1, 10)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            value: 12.5,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "EventDateTime": "2019-01-10T00:00:00",
                "SensorValue": 12.5,
            })
        );
    }
}
