//! Automation engine
//!
//! Stored automations are condition/action rules over device telemetry:
//!
//! ```text
//! AUTOMATION = TRIGGERS (joined by AND/OR) → ACTIONS
//! ```
//!
//! - [`Automation`] - a stored record parsed once per pass into typed
//!   triggers, combinators and actions
//! - [`ConditionEvaluator`] - decides whether a rule's triggers hold against
//!   cached direct readings and stored history
//! - [`AutomationScheduler`] - fixed-interval loop that evaluates every rule
//!   and dispatches the actions of those that hold

pub mod automation;
pub mod condition;
pub mod eval;
pub mod scheduler;

pub use automation::{Action, Automation, AutomationError, AutomationResult, Trigger};
pub use condition::{combine, Combinator, Comparator, TriggerValue};
pub use eval::ConditionEvaluator;
pub use scheduler::{AutomationScheduler, PassReport};
