//! Decision extraction and the decision-conflict predicate.
//!
//! Decisions are events whose type is `decision`, or whose payload carries
//! `type: "decision"` or a `decision` field. Two decisions conflict when they
//! target the same resource or path, or set the same categorical dimension,
//! but disagree on the value.

use fmerge_types::{Event, EventId, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TARGET_KEYS: [&str; 3] = ["resource", "path", "target"];
const DIMENSION_KEYS: [&str; 2] = ["category", "dimension"];
const VALUE_KEYS: [&str; 3] = ["decision", "value", "choice"];

/// A borrowed, field-normalized view of a decision event.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionView<'a> {
    pub event: &'a Event,
    /// The resource or path the decision applies to.
    pub target: Option<&'a str>,
    /// The categorical dimension being set (e.g. `architecture`).
    pub dimension: Option<&'a str>,
    /// The decided value.
    pub value: Option<&'a Value>,
    /// The payload's `type` field.
    pub kind: Option<&'a str>,
    /// The payload's `scope` field.
    pub scope: Option<&'a str>,
}

impl<'a> DecisionView<'a> {
    /// View `event` as a decision; `None` if it does not record one.
    pub fn from_event(event: &'a Event) -> Option<Self> {
        if !event.is_decision() {
            return None;
        }
        let kind = event.payload_str("type");
        let dimension = first_str(event, &DIMENSION_KEYS)
            .or_else(|| kind.filter(|k| !k.eq_ignore_ascii_case("decision")));
        Some(Self {
            event,
            target: first_str(event, &TARGET_KEYS),
            dimension,
            value: VALUE_KEYS.iter().find_map(|key| event.payload.get(*key)),
            kind,
            scope: event.payload_str("scope"),
        })
    }

    /// Returns `true` if the two decisions set the same thing differently.
    pub fn conflicts_with(&self, other: &DecisionView<'_>) -> bool {
        let (Some(mine), Some(theirs)) = (self.value, other.value) else {
            return false;
        };
        if mine == theirs {
            return false;
        }
        same(self.target, other.target) || same(self.dimension, other.dimension)
    }

    /// Impact of a conflict between the two decisions.
    ///
    /// `High` if either is architectural (by type or scope), `Medium` if
    /// either is scoped to implementation, `Low` otherwise.
    pub fn impact(&self, other: &DecisionView<'_>) -> Severity {
        if self.is_architectural() || other.is_architectural() {
            Severity::High
        } else if tag_is(self.scope, "implementation") || tag_is(other.scope, "implementation") {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn is_architectural(&self) -> bool {
        tag_is(self.kind, "architecture") || tag_is(self.scope, "architecture")
    }

    /// What the two decisions disagree on, for descriptions.
    pub fn subject(&self, other: &DecisionView<'_>) -> String {
        if same(self.target, other.target) {
            format!("target '{}'", self.target.unwrap_or_default())
        } else {
            format!("'{}'", self.dimension.unwrap_or_default())
        }
    }

    /// The decided value rendered for display.
    pub fn value_label(&self) -> String {
        match self.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<none>".into(),
        }
    }
}

fn first_str<'a>(event: &'a Event, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| event.payload_str(key))
}

fn tag_is(field: Option<&str>, tag: &str) -> bool {
    field.is_some_and(|f| f.eq_ignore_ascii_case(tag))
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// All decisions in an event stream, in stream order.
pub fn extract_decisions(events: &[Event]) -> Vec<DecisionView<'_>> {
    events.iter().filter_map(DecisionView::from_event).collect()
}

/// A pair of mutually inconsistent decisions within one event stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionConflict {
    pub first: EventId,
    pub second: EventId,
    pub severity: Severity,
    pub reason: String,
}

/// Find decisions in a single stream that contradict each other.
///
/// Uses the same predicate as cross-stack detection; useful as a
/// self-consistency check on one branch before merging it.
pub fn identify_conflicting_decisions(events: &[Event]) -> Vec<DecisionConflict> {
    let decisions = extract_decisions(events);
    let mut conflicts = Vec::new();

    for (i, first) in decisions.iter().enumerate() {
        for second in &decisions[i + 1..] {
            if first.event.id == second.event.id || !first.conflicts_with(second) {
                continue;
            }
            conflicts.push(DecisionConflict {
                first: first.event.id.clone(),
                second: second.event.id.clone(),
                severity: first.impact(second),
                reason: format!(
                    "decisions on {} disagree: {} vs {}",
                    first.subject(second),
                    first.value_label(),
                    second.value_label()
                ),
            });
        }
    }

    conflicts
}
