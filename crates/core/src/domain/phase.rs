use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of one scripted phase, always in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PhaseId(u8);

impl PhaseId {
    pub const LETTER: PhaseId = PhaseId(0);
    pub const COURAGE: PhaseId = PhaseId(1);
    pub const WISDOM: PhaseId = PhaseId(2);
    pub const LOYALTY: PhaseId = PhaseId(3);
    pub const FAITH: PhaseId = PhaseId(4);
    pub const PATRONUS: PhaseId = PhaseId(5);
    pub const TEMPTATION: PhaseId = PhaseId(6);
    pub const DARK_NIGHT: PhaseId = PhaseId(7);
    pub const GRACE: PhaseId = PhaseId(8);

    /// Number of phases in the journey.
    pub const COUNT: usize = 9;

    pub fn new(value: u8) -> Option<Self> {
        (usize::from(value) < Self::COUNT).then_some(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub fn all() -> impl Iterator<Item = PhaseId> {
        (0..Self::COUNT as u8).map(PhaseId)
    }

    /// Static catalog entry for this phase.
    pub fn info(self) -> &'static PhaseInfo {
        &PHASE_CATALOG[usize::from(self.0)]
    }
}

impl TryFrom<u8> for PhaseId {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| CoreError::InvalidPhase(value.to_string()))
    }
}

impl From<PhaseId> for u8 {
    fn from(id: PhaseId) -> Self {
        id.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhaseId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| CoreError::InvalidPhase(s.to_string()))
    }
}

/// How a phase becomes available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockRequirement {
    /// Available from the very first session.
    Always,
    /// Unlocked by entering the code printed on a physical card.
    Card(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub id: PhaseId,
    pub title: &'static str,
    pub unlock: UnlockRequirement,
    /// Music cue key played while the phase runs.
    pub music: &'static str,
    /// Background texture key.
    pub background: &'static str,
    /// Phase entered directly, without a card, once this one completes.
    pub auto_advance_to: Option<PhaseId>,
    /// Instruction shown after completion when the next phase needs a card.
    pub next_card_prompt: Option<&'static str>,
}

pub const PHASE_CATALOG: [PhaseInfo; PhaseId::COUNT] = [
    PhaseInfo {
        id: PhaseId::LETTER,
        title: "The Letter",
        unlock: UnlockRequirement::Always,
        music: "intro",
        background: "phase0",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's first card and enter its code to begin your journey."),
    },
    PhaseInfo {
        id: PhaseId::COURAGE,
        title: "Courage",
        unlock: UnlockRequirement::Card("AURORA1"),
        music: "courage",
        background: "phase1",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's second card to continue."),
    },
    PhaseInfo {
        id: PhaseId::WISDOM,
        title: "Wisdom",
        unlock: UnlockRequirement::Card("AURORA2"),
        music: "wisdom",
        background: "phase2",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's third card."),
    },
    PhaseInfo {
        id: PhaseId::LOYALTY,
        title: "Loyalty",
        unlock: UnlockRequirement::Card("AURORA3"),
        music: "loyalty",
        background: "phase3",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's fourth card."),
    },
    PhaseInfo {
        id: PhaseId::FAITH,
        title: "Faith",
        unlock: UnlockRequirement::Card("AURORA4"),
        music: "ambition",
        background: "phase4",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's fifth card."),
    },
    PhaseInfo {
        id: PhaseId::PATRONUS,
        title: "The Patronus",
        unlock: UnlockRequirement::Card("AURORA5"),
        music: "patronus",
        background: "phase5",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's sixth card."),
    },
    PhaseInfo {
        id: PhaseId::TEMPTATION,
        title: "Temptation",
        unlock: UnlockRequirement::Card("AURORA6"),
        music: "temptation",
        background: "phase6",
        auto_advance_to: None,
        next_card_prompt: Some("Take Hedwig's seventh card."),
    },
    PhaseInfo {
        id: PhaseId::DARK_NIGHT,
        title: "The Dark Night",
        unlock: UnlockRequirement::Card("AURORA7"),
        music: "darkness",
        background: "phase7",
        auto_advance_to: Some(PhaseId::GRACE),
        next_card_prompt: None,
    },
    PhaseInfo {
        id: PhaseId::GRACE,
        title: "Grace",
        unlock: UnlockRequirement::Card("AURORA8"),
        music: "grace",
        background: "phase8",
        auto_advance_to: None,
        next_card_prompt: None,
    },
];
