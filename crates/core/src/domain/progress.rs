//! Persisted progress aggregate and its JSON document form.
//!
//! The document is camelCase and stored under [`SAVE_KEY`]:
//!
//! ```json
//! {
//!   "currentPhase": 2,
//!   "unlockedPhases": [0, 1, 2],
//!   "phaseProgress": { "1": { "completed": true, "timestamp": 1700000000000, "objectsFound": [] } },
//!   "cardsUsed": ["AURORA1", "AURORA2"],
//!   "totalPlayTime": 420000,
//!   "lastSave": 1700000000000
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::phase::PhaseId;
use crate::error::{CoreError, Result};

/// Storage key of the progress document.
pub const SAVE_KEY: &str = "aurora-save-v1";

/// Completion record of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    pub completed: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_time: Option<u64>,
    /// Phase-specific result data, stored inline next to the fixed fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl PhaseRecord {
    pub fn completed(payload: Map<String, Value>) -> Self {
        Self {
            completed: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
            play_time: None,
            payload,
        }
    }

    pub fn with_play_time(mut self, play_time_ms: u64) -> Self {
        self.play_time = Some(play_time_ms);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub current_phase: PhaseId,
    pub unlocked_phases: BTreeSet<PhaseId>,
    pub phase_progress: BTreeMap<PhaseId, PhaseRecord>,
    pub cards_used: Vec<String>,
    /// Accumulated play time in milliseconds.
    pub total_play_time: u64,
    /// Milliseconds since the Unix epoch, 0 when never saved.
    pub last_save: i64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current_phase: PhaseId::LETTER,
            unlocked_phases: BTreeSet::from([PhaseId::LETTER]),
            phase_progress: BTreeMap::new(),
            cards_used: Vec::new(),
            total_play_time: 0,
            last_save: 0,
        }
    }
}

/// Result of a lenient document decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedProgress {
    pub state: ProgressState,
    /// Fields that were missing or malformed and fell back to their default.
    pub repaired: Vec<String>,
}

impl DecodedProgress {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty()
    }
}

impl ProgressState {
    pub fn is_unlocked(&self, phase: PhaseId) -> bool {
        self.unlocked_phases.contains(&phase)
    }

    pub fn is_completed(&self, phase: PhaseId) -> bool {
        self.phase_progress
            .get(&phase)
            .map(|record| record.completed)
            .unwrap_or(false)
    }

    /// Marks `phase` unlocked. Returns `true` when it was not unlocked before.
    pub fn unlock(&mut self, phase: PhaseId) -> bool {
        self.unlocked_phases.insert(phase)
    }

    pub fn has_used_card(&self, code: &str) -> bool {
        self.cards_used.iter().any(|used| used == code)
    }

    pub fn use_card(&mut self, code: impl Into<String>) {
        let code = code.into();
        if !self.has_used_card(&code) {
            self.cards_used.push(code);
        }
    }

    /// Records (or overwrites) the completion record of `phase`.
    pub fn record_completion(&mut self, phase: PhaseId, record: PhaseRecord) -> &PhaseRecord {
        self.phase_progress.insert(phase, record);
        &self.phase_progress[&phase]
    }

    pub fn completed_count(&self) -> usize {
        self.phase_progress
            .values()
            .filter(|record| record.completed)
            .count()
    }

    /// Share of the journey completed, in whole percent.
    pub fn completion_percentage(&self) -> u8 {
        let percent = self.completed_count() * 100 / PhaseId::COUNT;
        percent.min(100) as u8
    }

    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decodes a document field by field.
    ///
    /// Never fails: anything missing or malformed falls back to its default
    /// and is listed in [`DecodedProgress::repaired`]. Phase 0 is always
    /// unlocked afterwards.
    pub fn from_document(document: &Value) -> DecodedProgress {
        let mut state = ProgressState::default();
        let mut repaired = Vec::new();

        let Some(fields) = document.as_object() else {
            repaired.push("document".to_string());
            return DecodedProgress { state, repaired };
        };

        match fields
            .get("currentPhase")
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .and_then(PhaseId::new)
        {
            Some(phase) => state.current_phase = phase,
            None => repaired.push("currentPhase".to_string()),
        }

        match fields.get("unlockedPhases").and_then(Value::as_array) {
            Some(items) => {
                for item in items {
                    match item
                        .as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .and_then(PhaseId::new)
                    {
                        Some(phase) => {
                            state.unlocked_phases.insert(phase);
                        }
                        None => repaired.push(format!("unlockedPhases[{item}]")),
                    }
                }
            }
            None => repaired.push("unlockedPhases".to_string()),
        }

        match fields.get("phaseProgress").and_then(Value::as_object) {
            Some(records) => {
                for (key, value) in records {
                    let phase = key.parse::<PhaseId>().ok();
                    let record = serde_json::from_value::<PhaseRecord>(value.clone()).ok();
                    match (phase, record) {
                        (Some(phase), Some(record)) => {
                            state.phase_progress.insert(phase, record);
                        }
                        _ => repaired.push(format!("phaseProgress.{key}")),
                    }
                }
            }
            None => repaired.push("phaseProgress".to_string()),
        }

        match fields.get("cardsUsed").and_then(Value::as_array) {
            Some(items) => {
                for item in items {
                    match item.as_str() {
                        Some(code) => state.use_card(code),
                        None => repaired.push(format!("cardsUsed[{item}]")),
                    }
                }
            }
            None => repaired.push("cardsUsed".to_string()),
        }

        match fields.get("totalPlayTime").and_then(Value::as_u64) {
            Some(ms) => state.total_play_time = ms,
            None => repaired.push("totalPlayTime".to_string()),
        }

        match fields.get("lastSave").and_then(Value::as_i64) {
            Some(ms) => state.last_save = ms,
            None => repaired.push("lastSave".to_string()),
        }

        state.unlocked_phases.insert(PhaseId::LETTER);

        DecodedProgress { state, repaired }
    }
}
