//! Condition evaluation
//!
//! A trigger reads either the telemetry cache (direct fields) or the latest
//! stored reading (everything else), then compares according to the field's
//! catalog type. Anything that prevents a comparison (unknown device, no
//! catalog entry, no data, unparsable value) leaves the trigger unmet.

use casa_core::{Catalog, Device, FieldSpec, FieldValue};
use casa_store::Store;
use casa_telemetry::CacheSnapshot;
use tracing::{debug, trace, warn};

use crate::automation::{Automation, AutomationError, AutomationResult, Trigger};
use crate::condition::{combine, TriggerValue};

/// Evaluates automations against one pass worth of data
pub struct ConditionEvaluator<'a> {
    store: &'a dyn Store,
    catalog: &'a Catalog,
    cache: &'a CacheSnapshot,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(store: &'a dyn Store, catalog: &'a Catalog, cache: &'a CacheSnapshot) -> Self {
        Self {
            store,
            catalog,
            cache,
        }
    }

    /// Whether the automation's triggers hold right now
    pub fn evaluate(&self, automation: &Automation) -> bool {
        let outcomes: Vec<bool> = automation
            .triggers
            .iter()
            .map(|trigger| self.trigger_met(trigger))
            .collect();

        let result = combine(&outcomes, &automation.combinators);
        trace!(automation_id = %automation.id, ?outcomes, result, "Evaluated automation");
        result
    }

    /// Outcome of a single trigger; failures count as unmet
    pub fn trigger_met(&self, trigger: &Trigger) -> bool {
        match self.check(trigger) {
            Ok(met) => met,
            Err(AutomationError::Store(e)) => {
                warn!(device_id = %trigger.device_id, key = %trigger.key, "Store error during evaluation: {}", e);
                false
            }
            Err(e) => {
                debug!(device_id = %trigger.device_id, key = %trigger.key, "Trigger unmet: {}", e);
                false
            }
        }
    }

    fn check(&self, trigger: &Trigger) -> AutomationResult<bool> {
        let (device, field) = self.resolve(trigger)?;

        if field.direct {
            let Some(reading) = self.cache.get(&device.id) else {
                return Ok(false);
            };
            if reading.field != trigger.key {
                return Ok(false);
            }
            Ok(reading
                .value(field.value_type)
                .map(|value| direct_matches(&value, &trigger.value))
                .unwrap_or(false))
        } else {
            let Some(reading) = self.store.latest_reading(&device.id, &trigger.key)? else {
                return Ok(false);
            };
            Ok(reading
                .value(field.value_type)
                .map(|value| stored_matches(&value, &trigger.value))
                .unwrap_or(false))
        }
    }

    fn resolve(&self, trigger: &Trigger) -> AutomationResult<(Device, FieldSpec)> {
        let device = self
            .store
            .device(&trigger.device_id)?
            .ok_or_else(|| AutomationError::DeviceNotFound(trigger.device_id.clone()))?;

        let field = self
            .catalog
            .field(&device.plugin, &device.physical_name, &trigger.key)
            .ok_or_else(|| AutomationError::FieldNotFound {
                plugin: device.plugin.clone(),
                model: device.physical_name.clone(),
                field: trigger.key.clone(),
            })?;

        Ok((device, field))
    }
}

/// Direct fields: string equality or numeric equality only
///
/// Operator prefixes are not understood here, and bool fields never match.
fn direct_matches(value: &FieldValue, expected: &TriggerValue) -> bool {
    match value {
        FieldValue::String(s) => *s == expected.raw,
        FieldValue::Number(n) => expected.number.map_or(false, |e| *n == e),
        FieldValue::Bool(_) => false,
    }
}

/// Stored fields: string equality, prefixed numeric comparison, bool equality
fn stored_matches(value: &FieldValue, expected: &TriggerValue) -> bool {
    match value {
        FieldValue::String(s) => *s == expected.raw,
        FieldValue::Number(n) => expected
            .comparison
            .map_or(false, |(cmp, e)| cmp.compare(*n, e)),
        FieldValue::Bool(b) => expected.boolean.map_or(false, |e| *b == e),
    }
}
