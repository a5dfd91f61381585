//! Declarative interaction gates.
//!
//! A phase describes what it asks of the player with an [`Interaction`] and
//! suspends on it through `PhaseContext::gate`. Every gate resolves to a
//! [`GateOutcome`]; none can hold the player forever because a
//! [`GatePolicy`] always carries a timeout or a give-up affordance.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::surfaces::ObjectHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(pub u64);

impl GateId {
    /// Process-wide unique id, so gates of consecutive phases never collide.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "w" => Some(Self::Up),
            "down" | "s" => Some(Self::Down),
            "left" | "a" => Some(Self::Left),
            "right" | "d" => Some(Self::Right),
            _ => None,
        }
    }

    /// Grid offset as (dx, dy), y growing downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    /// Pick one option.
    Choice { options: Vec<String> },
    /// Pick exactly `required` distinct options.
    MultiSelect {
        options: Vec<String>,
        required: usize,
    },
    /// Place items into `slots` ordered positions.
    Ordering { items: Vec<String>, slots: usize },
    /// A single button.
    Confirm { label: String },
    /// Arrow keys on a board.
    Directional,
    /// Click scene objects.
    ObjectHunt { targets: Vec<ObjectHandle> },
}

impl Interaction {
    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn multi_select<I, S>(options: I, required: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect {
            options: options.into_iter().map(Into::into).collect(),
            required,
        }
    }

    pub fn ordering<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let slots = items.len();
        Self::Ordering { items, slots }
    }

    pub fn confirm(label: impl Into<String>) -> Self {
        Self::Confirm {
            label: label.into(),
        }
    }

    pub fn object_hunt(targets: Vec<ObjectHandle>) -> Self {
        Self::ObjectHunt { targets }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Choice { .. } => "choice",
            Self::MultiSelect { .. } => "multi_select",
            Self::Ordering { .. } => "ordering",
            Self::Confirm { .. } => "confirm",
            Self::Directional => "directional",
            Self::ObjectHunt { .. } => "object_hunt",
        }
    }

    /// Whether `input` is a well-formed answer to this gate.
    ///
    /// Correctness is the script's business; this only filters inputs
    /// that do not fit the shape of the gate. An ordering may be partial
    /// so the script can tell the player to fill every position.
    pub fn accepts(&self, input: &PlayerInput) -> bool {
        match (self, input) {
            (_, PlayerInput::GiveUp) => true,
            (Self::Choice { options }, PlayerInput::Select(index)) => *index < options.len(),
            (Self::MultiSelect { options, required }, PlayerInput::SelectMany(picks)) => {
                picks.len() == *required && distinct_in_range(picks, options.len())
            }
            (Self::Ordering { items, slots }, PlayerInput::Order(order)) => {
                order.len() <= *slots && distinct_in_range(order, items.len())
            }
            (Self::Confirm { .. }, PlayerInput::Confirm) => true,
            (Self::Directional, PlayerInput::Move(_)) => true,
            (Self::ObjectHunt { targets }, PlayerInput::Click(handle)) => targets.contains(handle),
            _ => false,
        }
    }
}

fn distinct_in_range(indices: &[usize], len: usize) -> bool {
    let mut seen = HashSet::new();
    indices.iter().all(|i| *i < len && seen.insert(*i))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PlayerInput {
    Select(usize),
    SelectMany(Vec<usize>),
    Order(Vec<usize>),
    Confirm,
    Move(Direction),
    Click(ObjectHandle),
    GiveUp,
}

impl PlayerInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::SelectMany(_) => "select_many",
            Self::Order(_) => "order",
            Self::Confirm => "confirm",
            Self::Move(_) => "move",
            Self::Click(_) => "click",
            Self::GiveUp => "give_up",
        }
    }
}

/// Escape hatches of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub timeout: Option<Duration>,
    pub allow_give_up: bool,
}

impl GatePolicy {
    pub fn give_up() -> Self {
        Self {
            timeout: None,
            allow_give_up: true,
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            allow_give_up: false,
        }
    }

    pub fn with_give_up(mut self) -> Self {
        self.allow_give_up = true;
        self
    }

    /// A policy with no exit at all gets the give-up affordance.
    pub fn normalized(self) -> Self {
        if self.timeout.is_none() && !self.allow_give_up {
            return self.with_give_up();
        }
        self
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::give_up()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Responded(PlayerInput),
    TimedOut,
    GaveUp,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Responded(_) => "responded",
            Self::TimedOut => "timed_out",
            Self::GaveUp => "gave_up",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_accepts_in_range() {
        let gate = Interaction::choice(["a", "b"]);
        assert!(gate.accepts(&PlayerInput::Select(1)));
        assert!(!gate.accepts(&PlayerInput::Select(2)));
        assert!(!gate.accepts(&PlayerInput::Confirm));
        assert!(gate.accepts(&PlayerInput::GiveUp));
    }

    #[test]
    fn test_multi_select_needs_exact_distinct_count() {
        let gate = Interaction::multi_select(["a", "b", "c", "d"], 3);
        assert!(gate.accepts(&PlayerInput::SelectMany(vec![0, 2, 3])));
        assert!(!gate.accepts(&PlayerInput::SelectMany(vec![0, 2])));
        assert!(!gate.accepts(&PlayerInput::SelectMany(vec![0, 0, 1])));
        assert!(!gate.accepts(&PlayerInput::SelectMany(vec![0, 1, 9])));
    }

    #[test]
    fn test_ordering_allows_partial() {
        let gate = Interaction::ordering(["a", "b", "c"]);
        assert!(gate.accepts(&PlayerInput::Order(vec![2, 0, 1])));
        assert!(gate.accepts(&PlayerInput::Order(vec![2])));
        assert!(!gate.accepts(&PlayerInput::Order(vec![1, 1])));
        assert!(!gate.accepts(&PlayerInput::Order(vec![0, 1, 2, 3])));
    }

    #[test]
    fn test_object_hunt_filters_clicks() {
        let gate = Interaction::object_hunt(vec![ObjectHandle(4), ObjectHandle(9)]);
        assert!(gate.accepts(&PlayerInput::Click(ObjectHandle(9))));
        assert!(!gate.accepts(&PlayerInput::Click(ObjectHandle(5))));
    }

    #[test]
    fn test_policy_without_exit_gets_give_up() {
        let trapped = GatePolicy {
            timeout: None,
            allow_give_up: false,
        };
        assert!(trapped.normalized().allow_give_up);

        let timed = GatePolicy::timeout(Duration::from_secs(5));
        assert!(!timed.normalized().allow_give_up);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("UP"), Some(Direction::Up));
        assert_eq!(Direction::parse("a"), Some(Direction::Left));
        assert_eq!(Direction::parse("north"), None);
        assert_eq!(Direction::Down.delta(), (0, 1));
    }

    #[test]
    fn test_input_serialization() {
        let json = serde_json::to_string(&PlayerInput::Order(vec![1, 0])).unwrap();
        assert_eq!(json, r#"{"type":"order","value":[1,0]}"#);
    }
}
