//! Typed automations parsed from stored records

use casa_core::AutomationRecord;
use casa_store::StoreError;
use casa_telemetry::TelemetryError;
use thiserror::Error;

use crate::condition::{Combinator, TriggerValue};

/// Automation errors
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("automation {automation_id}: {field} has {found} entries, expected {expected}")]
    LengthMismatch {
        automation_id: String,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("automation {automation_id}: unknown trigger operator '{value}'")]
    InvalidCombinator { automation_id: String, value: String },

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("no catalog field '{field}' for plugin {plugin} model {model}")]
    FieldNotFound {
        plugin: String,
        model: String,
        field: String,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("telemetry cache error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// One condition: a device field compared against an expected value
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub device_id: String,
    pub key: String,
    pub value: TriggerValue,
}

/// One command to send when the automation holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub device_id: String,
    pub call: String,
    pub params: String,
}

/// A validated automation
#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    pub id: String,
    pub home_id: String,
    pub name: String,
    pub enabled: bool,
    pub triggers: Vec<Trigger>,
    /// `combinators[i]` joins the outcomes of `triggers[i]` and `triggers[i + 1]`
    pub combinators: Vec<Combinator>,
    pub actions: Vec<Action>,
}

impl Automation {
    /// Validate the parallel arrays of a record and parse its values
    pub fn parse(record: &AutomationRecord) -> AutomationResult<Self> {
        let triggers = record.triggers.len();
        let check = |field: &'static str, found: usize, expected: usize| {
            if found == expected {
                Ok(())
            } else {
                Err(AutomationError::LengthMismatch {
                    automation_id: record.id.clone(),
                    field,
                    expected,
                    found,
                })
            }
        };

        check("triggerKeys", record.trigger_keys.len(), triggers)?;
        check("triggerValues", record.trigger_values.len(), triggers)?;
        check(
            "triggerOperators",
            record.trigger_operators.len(),
            triggers.saturating_sub(1),
        )?;
        check("actionCalls", record.action_calls.len(), record.actions.len())?;
        check("actionValues", record.action_values.len(), record.actions.len())?;

        let combinators = record
            .trigger_operators
            .iter()
            .map(|op| {
                Combinator::parse(op).ok_or_else(|| AutomationError::InvalidCombinator {
                    automation_id: record.id.clone(),
                    value: op.clone(),
                })
            })
            .collect::<AutomationResult<Vec<_>>>()?;

        let triggers = record
            .triggers
            .iter()
            .zip(&record.trigger_keys)
            .zip(&record.trigger_values)
            .map(|((device_id, key), value)| Trigger {
                device_id: device_id.clone(),
                key: key.clone(),
                value: TriggerValue::parse(value.as_str()),
            })
            .collect();

        let actions = record
            .actions
            .iter()
            .zip(&record.action_calls)
            .zip(&record.action_values)
            .map(|((device_id, call), params)| Action {
                device_id: device_id.clone(),
                call: call.clone(),
                params: params.clone(),
            })
            .collect();

        Ok(Self {
            id: record.id.clone(),
            home_id: record.home_id.clone(),
            name: record.name.clone(),
            enabled: record.status,
            triggers,
            combinators,
            actions,
        })
    }
}

impl TryFrom<&AutomationRecord> for Automation {
    type Error = AutomationError;

    fn try_from(record: &AutomationRecord) -> AutomationResult<Self> {
        Self::parse(record)
    }
}
