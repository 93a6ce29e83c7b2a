//! Telemetry cache for direct readings
//!
//! Direct fields are only ever pushed by the gateway and never queried from
//! history, so the latest such reading per device is held in memory until
//! the automation scheduler has looked at it once.
//!
//! The cache is owned by a single background task. [`TelemetryCache`] is a
//! cheap cloneable handle that sends it commands; ingestion puts readings,
//! the scheduler takes a [`CacheSnapshot`] at the start of a pass and clears
//! through the snapshot's watermark at the end. Readings that arrive while a
//! pass is running carry a higher sequence number and survive that clear.

use std::collections::HashMap;

use casa_core::Reading;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Telemetry cache errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry cache task has stopped")]
    Closed,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

enum Command {
    Put(Reading),
    Snapshot(oneshot::Sender<CacheSnapshot>),
    ClearThrough(u64),
    Clear,
}

/// Point-in-time copy of the cache
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    readings: HashMap<String, Reading>,
    watermark: u64,
}

impl CacheSnapshot {
    /// Build a snapshot directly, keyed by each reading's device id
    pub fn from_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let mut map = HashMap::new();
        let mut watermark = 0;
        for reading in readings {
            watermark += 1;
            map.insert(reading.device_id.clone(), reading);
        }
        Self {
            readings: map,
            watermark,
        }
    }

    /// Latest direct reading for a registered device
    pub fn get(&self, device_id: &str) -> Option<&Reading> {
        self.readings.get(device_id)
    }

    /// Highest sequence number included in this snapshot
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Handle to the cache task
#[derive(Debug, Clone)]
pub struct TelemetryCache {
    tx: mpsc::UnboundedSender<Command>,
}

impl TelemetryCache {
    /// Spawn the owning task on the current Tokio runtime
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self { tx }
    }

    /// Store a reading, replacing any earlier one for the same device
    pub fn put(&self, reading: Reading) -> TelemetryResult<()> {
        self.send(Command::Put(reading))
    }

    pub async fn snapshot(&self) -> TelemetryResult<CacheSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| TelemetryError::Closed)
    }

    /// Drop every entry stored at or before `watermark`
    pub fn clear_through(&self, watermark: u64) -> TelemetryResult<()> {
        self.send(Command::ClearThrough(watermark))
    }

    /// Drop everything
    pub fn clear(&self) -> TelemetryResult<()> {
        self.send(Command::Clear)
    }

    fn send(&self, command: Command) -> TelemetryResult<()> {
        self.tx.send(command).map_err(|_| TelemetryError::Closed)
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>) {
    // device id -> (sequence, reading)
    let mut entries: HashMap<String, (u64, Reading)> = HashMap::new();
    let mut seq: u64 = 0;

    while let Some(command) = rx.recv().await {
        match command {
            Command::Put(reading) => {
                seq += 1;
                trace!(device_id = %reading.device_id, field = %reading.field, seq, "Caching direct reading");
                entries.insert(reading.device_id.clone(), (seq, reading));
            }
            Command::Snapshot(reply) => {
                let readings = entries
                    .iter()
                    .map(|(id, (_, r))| (id.clone(), r.clone()))
                    .collect();
                let _ = reply.send(CacheSnapshot {
                    readings,
                    watermark: seq,
                });
            }
            Command::ClearThrough(watermark) => {
                let before = entries.len();
                entries.retain(|_, (s, _)| *s > watermark);
                trace!(watermark, removed = before - entries.len(), "Cleared telemetry cache");
            }
            Command::Clear => entries.clear(),
        }
    }

    debug!("Telemetry cache task stopped");
}
