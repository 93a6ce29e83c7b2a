//! Fixed-interval automation scheduler
//!
//! Each tick runs one pass: snapshot the telemetry cache, evaluate every
//! enabled automation, dispatch the actions of those that hold, write one
//! audit row per firing, then clear the cache up to the snapshot watermark.
//! Ticks that would start while a pass is still running are skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use casa_core::{LogEntry, LogType};
use casa_gateway::{action_message, ActionMessage, GatewaySession};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::automation::{Automation, AutomationResult};
use crate::eval::ConditionEvaluator;

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Automations whose triggers were evaluated
    pub evaluated: usize,
    /// Disabled or invalid automations
    pub skipped: usize,
    /// Automations whose triggers held
    pub fired: usize,
    pub actions_sent: usize,
    pub actions_failed: usize,
}

/// Drives evaluation passes on a fixed interval
pub struct AutomationScheduler {
    session: Arc<GatewaySession>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AutomationScheduler {
    pub fn new(session: Arc<GatewaySession>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            session,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Spawn the scheduling loop
    ///
    /// Returns `None` if the loop is already running.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Automation scheduler already running");
            return None;
        }

        info!(interval_ms = self.interval.as_millis() as u64, "Starting automation scheduler");

        let session = self.session.clone();
        let running = self.running.clone();
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match Self::run_pass(&session).await {
                            Ok(report) if report.fired > 0 => debug!(?report, "Automation pass"),
                            Ok(report) => trace!(?report, "Automation pass"),
                            Err(e) => error!("Automation pass failed: {}", e),
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Received shutdown signal");
                        break;
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            info!("Automation scheduler stopped");
        }))
    }

    pub fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        info!("Stopping automation scheduler");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one full evaluation pass
    ///
    /// The cache is cleared through the pass's snapshot even when loading
    /// automations fails, so direct readings are never seen by more than one
    /// pass.
    pub async fn run_pass(session: &GatewaySession) -> AutomationResult<PassReport> {
        let snapshot = session.cache().snapshot().await?;
        let result = Self::evaluate_and_dispatch(session, &snapshot).await;
        session.cache().clear_through(snapshot.watermark())?;
        result
    }

    async fn evaluate_and_dispatch(
        session: &GatewaySession,
        snapshot: &casa_telemetry::CacheSnapshot,
    ) -> AutomationResult<PassReport> {
        let mut report = PassReport::default();
        let records = session.store().automations()?;

        let fired: Vec<Automation> = {
            let evaluator =
                ConditionEvaluator::new(session.store().as_ref(), session.catalog(), snapshot);
            let mut fired = Vec::new();

            for record in &records {
                if !record.status {
                    report.skipped += 1;
                    continue;
                }
                let automation = match Automation::parse(record) {
                    Ok(automation) => automation,
                    Err(e) => {
                        warn!(automation_id = %record.id, "Skipping invalid automation: {}", e);
                        report.skipped += 1;
                        continue;
                    }
                };

                report.evaluated += 1;
                if evaluator.evaluate(&automation) {
                    fired.push(automation);
                }
            }
            fired
        };

        for automation in &fired {
            report.fired += 1;
            let sent = Self::fire(session, automation, &mut report).await;

            Self::audit(session, automation, &sent);
        }

        Ok(report)
    }

    /// Append the `automation` audit row for one firing
    ///
    /// Failures are logged; the pass carries on.
    fn audit(session: &GatewaySession, automation: &Automation, sent: &[ActionMessage]) {
        let value = match serde_json::to_string(sent) {
            Ok(value) => value,
            Err(e) => {
                warn!(automation_id = %automation.id, "Failed to encode audit value: {}", e);
                return;
            }
        };
        if let Err(e) = session
            .store()
            .append_log(&LogEntry::new(LogType::Automation, &automation.id, value))
        {
            warn!(automation_id = %automation.id, "Failed to write audit log: {}", e);
        }
    }

    /// Dispatch every action of a fired automation
    ///
    /// A failed action is logged and skipped; the rest are still attempted.
    /// Returns the messages that were attempted.
    async fn fire(
        session: &GatewaySession,
        automation: &Automation,
        report: &mut PassReport,
    ) -> Vec<ActionMessage> {
        info!(automation_id = %automation.id, name = %automation.name, "Automation triggered");
        let mut attempted = Vec::with_capacity(automation.actions.len());

        for action in &automation.actions {
            let device = match session.store().device(&action.device_id) {
                Ok(Some(device)) => device,
                Ok(None) => {
                    warn!(automation_id = %automation.id, device_id = %action.device_id, "Action device not found");
                    report.actions_failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(automation_id = %automation.id, device_id = %action.device_id, "Failed to load action device: {}", e);
                    report.actions_failed += 1;
                    continue;
                }
            };

            let message = action_message(&device, &action.call, &action.params);
            match session.dispatch(&message).await {
                Ok(()) => report.actions_sent += 1,
                Err(e) => {
                    warn!(automation_id = %automation.id, device_id = %device.id, call = %action.call, "Action not delivered: {}", e);
                    report.actions_failed += 1;
                }
            }
            attempted.push(message);
        }

        attempted
    }
}

impl Drop for AutomationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
