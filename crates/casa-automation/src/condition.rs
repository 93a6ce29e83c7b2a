//! Trigger comparison values and AND/OR grouping
//!
//! Trigger values and combinators are stored as plain strings. They are
//! parsed here once when an automation is loaded, so evaluation only deals
//! with typed values.

use std::fmt;

/// Numeric comparison prefix of a stored-field trigger value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Eq => "=",
            Comparator::Neq => "!=",
        }
    }

    /// Split a leading comparator off `raw`
    ///
    /// Two-character operators are matched before single-character ones.
    pub fn split(raw: &str) -> Option<(Comparator, &str)> {
        const TWO: [(&str, Comparator); 3] = [
            (">=", Comparator::Gte),
            ("<=", Comparator::Lte),
            ("!=", Comparator::Neq),
        ];
        const ONE: [(&str, Comparator); 3] = [
            (">", Comparator::Gt),
            ("<", Comparator::Lt),
            ("=", Comparator::Eq),
        ];

        TWO.iter()
            .chain(ONE.iter())
            .find_map(|(prefix, cmp)| raw.strip_prefix(prefix).map(|rest| (*cmp, rest)))
    }

    /// `actual <op> expected`
    pub fn compare(&self, actual: f64, expected: f64) -> bool {
        match self {
            Comparator::Gt => actual > expected,
            Comparator::Gte => actual >= expected,
            Comparator::Lt => actual < expected,
            Comparator::Lte => actual <= expected,
            Comparator::Eq => actual == expected,
            Comparator::Neq => actual != expected,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Joins two consecutive trigger outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case(casa_core::operators::AND) {
            Some(Combinator::And)
        } else if raw.eq_ignore_ascii_case(casa_core::operators::OR) {
            Some(Combinator::Or)
        } else {
            None
        }
    }
}

/// A trigger's expected value, pre-parsed for every interpretation
///
/// Which interpretation applies depends on the catalog type of the field and
/// on whether it is direct, both only known at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerValue {
    /// Exact string as stored; used for string fields
    pub raw: String,
    /// Operator-prefixed number, e.g. `">=20"`; used for stored numeric fields
    pub comparison: Option<(Comparator, f64)>,
    /// Plain number; used for direct numeric fields
    pub number: Option<f64>,
    /// Boolean literal; used for stored bool fields
    pub boolean: Option<bool>,
}

impl TriggerValue {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let comparison = Comparator::split(&raw)
            .and_then(|(cmp, rest)| rest.parse::<f64>().ok().map(|value| (cmp, value)));
        let number = raw.parse::<f64>().ok();
        let boolean = parse_bool(&raw);

        Self {
            raw,
            comparison,
            number,
            boolean,
        }
    }
}

/// Boolean literals accepted by gateways: `1 t T TRUE true True` and the
/// matching false spellings
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Combine trigger outcomes left to right without precedence or parentheses
///
/// Outcomes are split into groups at every `OR`. A group starts with the
/// outcome following the `OR` (or the first outcome). Each `AND` sets the
/// group to whether both of its neighbouring outcomes hold, so the last
/// `AND` in a group decides it. The result holds when any group holds.
/// No outcomes means false.
///
/// Existing rules were written against exactly this order, so it must not be
/// replaced with conventional boolean precedence.
pub fn combine(outcomes: &[bool], combinators: &[Combinator]) -> bool {
    let Some(&first) = outcomes.first() else {
        return false;
    };

    let mut groups = vec![first];
    for (i, combinator) in combinators.iter().enumerate() {
        let Some(&next) = outcomes.get(i + 1) else {
            break;
        };
        match combinator {
            Combinator::And => {
                if let Some(current) = groups.last_mut() {
                    *current = outcomes[i] && next;
                }
            }
            Combinator::Or => groups.push(next),
        }
    }

    groups.into_iter().any(|group| group)
}
