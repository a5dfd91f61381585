use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::phase::{PhaseId, UnlockRequirement, PHASE_CATALOG};
use crate::error::{CoreError, Result};

pub const MESSAGE_EMPTY: &str = "Enter the code printed on your card.";
pub const MESSAGE_UNKNOWN: &str = "Invalid code. Check the card again.";
pub const MESSAGE_ALREADY_USED: &str = "This card has already been used.";

/// Mapping from normalized card code to the phase it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockCodeTable {
    codes: BTreeMap<String, PhaseId>,
}

impl UnlockCodeTable {
    /// The printed card set, one code per card-gated phase.
    pub fn standard() -> Self {
        let codes = PHASE_CATALOG
            .iter()
            .filter_map(|info| match info.unlock {
                UnlockRequirement::Card(code) => Some((Self::normalize(code), info.id)),
                UnlockRequirement::Always => None,
            })
            .collect();
        Self { codes }
    }

    /// Builds a table from custom pairs, normalizing every code.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, PhaseId)>,
        S: AsRef<str>,
    {
        let mut codes = BTreeMap::new();
        for (code, phase) in pairs {
            let normalized = Self::normalize(code.as_ref());
            if normalized.is_empty() {
                return Err(CoreError::InvalidCode(code.as_ref().to_string()));
            }
            if codes.insert(normalized.clone(), phase).is_some() {
                return Err(CoreError::Validation(format!(
                    "duplicate unlock code {normalized}"
                )));
            }
        }
        Ok(Self { codes })
    }

    /// Trims surrounding whitespace and folds case.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn lookup(&self, raw: &str) -> Option<PhaseId> {
        self.codes.get(&Self::normalize(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PhaseId)> {
        self.codes.iter().map(|(code, phase)| (code.as_str(), *phase))
    }
}

impl Default for UnlockCodeTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeRejection {
    Empty,
    Unknown,
    AlreadyUsed,
}

impl CodeRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Unknown => "unknown",
            Self::AlreadyUsed => "already_used",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => MESSAGE_EMPTY,
            Self::Unknown => MESSAGE_UNKNOWN,
            Self::AlreadyUsed => MESSAGE_ALREADY_USED,
        }
    }
}

/// Outcome of submitting a card code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeValidation {
    pub valid: bool,
    pub phase: Option<PhaseId>,
    pub message: String,
    pub rejection: Option<CodeRejection>,
}

impl CodeValidation {
    pub fn accepted(phase: PhaseId) -> Self {
        Self {
            valid: true,
            phase: Some(phase),
            message: format!("Phase {} unlocked: {}!", phase, phase.info().title),
            rejection: None,
        }
    }

    pub fn rejected(reason: CodeRejection) -> Self {
        Self {
            valid: false,
            phase: None,
            message: reason.message().to_string(),
            rejection: Some(reason),
        }
    }
}
