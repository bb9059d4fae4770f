//! Query orchestrator: the entry point for both retrieval operations.
//!
//! Single-sensor queries resolve one artifact through the tier locator and
//! decode it. Device-wide queries re-read the device catalog (fresh fetch
//! every call — no cache, no staleness), then run the single-sensor path
//! for each registered sensor in catalog order, absorbing per-sensor
//! misses: a device may legitimately have data for some sensors and not
//! others on a given date.
//!
//! Both operations are single-pass, stateless, and non-retrying. The
//! storage backend is injected at construction; no ambient configuration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::read_catalog;
use crate::decode::{decode_readings, DEFAULT_DELIMITER};
use crate::error::QueryError;
use crate::models::{SensorReading, CATALOG_KEY};
use crate::storage::ObjectStore;
use crate::tiers;

/// Stateless request handler over an injected object store.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ObjectStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// All readings for one device/sensor/date.
    ///
    /// An empty result is success, not an error — every row of the
    /// artifact may have been malformed and dropped by the decoder. Only
    /// a missing artifact is [`QueryError::NotFound`].
    pub async fn get_sensor_data(
        &self,
        device_id: &str,
        sensor_type: &str,
        date: &str,
    ) -> Result<Vec<SensorReading>, QueryError> {
        let located = tiers::locate(self.store.as_ref(), device_id, sensor_type, date).await?;
        let readings = decode_readings(&located.bytes, false, DEFAULT_DELIMITER);
        debug!(
            device = device_id,
            sensor = sensor_type,
            date,
            tier = ?located.tier,
            rows = readings.len(),
            "decoded sensor artifact"
        );
        Ok(readings)
    }

    /// All readings for one device/date across every sensor the catalog
    /// registers for it, concatenated in catalog order.
    ///
    /// A sensor with no data for the date contributes nothing and does not
    /// abort the query. If the concatenation ends up empty — device absent
    /// from the catalog, or every sensor missed — the whole query is
    /// [`QueryError::NotFound`]. A missing or malformed catalog is a
    /// harder failure and surfaces as [`QueryError::Internal`].
    pub async fn get_device_data(
        &self,
        device_id: &str,
        date: &str,
    ) -> Result<Vec<SensorReading>, QueryError> {
        info!(device = device_id, date, "reading sensor types from metadata");
        let catalog_bytes = self.store.fetch(CATALOG_KEY).await.map_err(|e| {
            QueryError::Internal(format!("failed to fetch {}: {}", CATALOG_KEY, e))
        })?;
        let entries =
            read_catalog(&catalog_bytes).map_err(|e| QueryError::Internal(e.to_string()))?;

        let mut readings = Vec::new();
        for entry in entries.iter().filter(|e| e.device_id == device_id) {
            match self
                .get_sensor_data(device_id, &entry.sensor_type, date)
                .await
            {
                Ok(mut rows) => readings.append(&mut rows),
                Err(QueryError::NotFound(detail)) => {
                    debug!(
                        device = device_id,
                        sensor = %entry.sensor_type,
                        date,
                        detail = %detail,
                        "sensor has no data for date, skipping"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        if readings.is_empty() {
            return Err(QueryError::NotFound(format!(
                "No data were found for {}.",
                device_id
            )));
        }

        Ok(readings)
    }
}
