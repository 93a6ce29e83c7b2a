//! Telemetry ingestion

use casa_core::Reading;
use tracing::{debug, warn};

use crate::error::GatewayResult;
use crate::session::GatewaySession;

/// What happened to one inbound reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// No registered device has this physical id
    Dropped,
    /// Persisted only
    Stored,
    /// Persisted and cached for the next evaluation pass
    Cached,
}

impl GatewaySession {
    /// Ingest a batch of readings from one `newData` frame
    pub async fn ingest(&self, readings: Vec<Reading>) {
        for reading in readings {
            let physical_id = reading.device_id.clone();
            if let Err(e) = self.ingest_reading(reading) {
                warn!(physical_id = %physical_id, "Failed to ingest reading: {}", e);
            }
        }
    }

    /// Resolve, maybe cache, then persist one reading
    ///
    /// Every resolved reading is stored, direct ones included. Only direct
    /// fields go to the cache, keyed by the registered device id.
    pub fn ingest_reading(&self, mut reading: Reading) -> GatewayResult<IngestOutcome> {
        let device = match self.store().device_by_physical_id(&reading.device_id)? {
            Some(device) => device,
            None => {
                debug!(physical_id = %reading.device_id, "Reading from unregistered device dropped");
                return Ok(IngestOutcome::Dropped);
            }
        };
        reading.device_id = device.id.clone();

        let direct = self
            .catalog()
            .field(&device.plugin, &device.physical_name, &reading.field)
            .map(|f| f.direct)
            .unwrap_or(false);

        let outcome = if direct {
            self.cache().put(reading.clone())?;
            IngestOutcome::Cached
        } else {
            IngestOutcome::Stored
        };

        self.store().insert_reading(&reading)?;
        debug!(device_id = %device.id, field = %reading.field, ?outcome, "Reading ingested");
        Ok(outcome)
    }
}
