use serde::{Deserialize, Serialize};

/// Lifecycle of one running phase instance.
///
/// `Destroyed` is reachable from every state and has no way out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Constructed,
    Initializing,
    Running,
    Completed,
    Destroyed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Destroyed => "destroyed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "constructed" => Some(Self::Constructed),
            "initializing" => Some(Self::Initializing),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "destroyed" => Some(Self::Destroyed),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Destroyed)
    }
}

/// Why a phase is being entered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    /// A card code was accepted.
    Code,
    /// The previous phase finished and hands over without a card.
    AutoAdvance,
    /// Startup resumes the saved current phase.
    Resume,
    /// Explicit navigation requested by the host.
    Manual,
}

impl EntryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::AutoAdvance => "auto_advance",
            Self::Resume => "resume",
            Self::Manual => "manual",
        }
    }

    /// Whether entering for this reason grants the unlock.
    pub fn unlocks(&self) -> bool {
        matches!(self, Self::Code | Self::AutoAdvance)
    }
}
