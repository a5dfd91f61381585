//! Unlock gate over the persisted progress document.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use aurora_core::{
    CodeRejection, CodeValidation, DecodedProgress, EntryReason, PhaseId, PhaseRecord,
    ProgressState, UnlockCodeTable, SAVE_KEY,
};
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ProgressError, Result};
use crate::store::ProgressStore;

/// What [`ProgressGate::restore`] found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing saved yet, or the store could not be read.
    Fresh,
    /// A document was loaded; `repaired` fields fell back to defaults.
    Restored { repaired: Vec<String> },
    /// The stored text was not JSON and was ignored.
    Corrupt,
}

/// Validates card codes, tracks unlocked and completed phases and persists
/// the whole [`ProgressState`] as one document.
pub struct ProgressGate {
    store: Arc<dyn ProgressStore>,
    codes: UnlockCodeTable,
    state: RwLock<ProgressState>,
    session_started: Mutex<Instant>,
}

impl ProgressGate {
    pub fn new(store: Arc<dyn ProgressStore>, codes: UnlockCodeTable) -> Self {
        Self {
            store,
            codes,
            state: RwLock::new(ProgressState::default()),
            session_started: Mutex::new(Instant::now()),
        }
    }

    /// Create a gate and restore whatever the store holds.
    pub async fn open(store: Arc<dyn ProgressStore>, codes: UnlockCodeTable) -> Self {
        let gate = Self::new(store, codes);
        gate.restore().await;
        gate
    }

    fn read(&self) -> RwLockReadGuard<'_, ProgressState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProgressState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Milliseconds played since the last persist or restore.
    fn session_elapsed_ms(&self) -> u64 {
        let started = self
            .session_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        started.elapsed().as_millis() as u64
    }

    fn restart_session(&self) {
        *self
            .session_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn codes(&self) -> &UnlockCodeTable {
        &self.codes
    }

    pub fn snapshot(&self) -> ProgressState {
        self.read().clone()
    }

    pub fn current_phase(&self) -> PhaseId {
        self.read().current_phase
    }

    pub fn is_unlocked(&self, phase: PhaseId) -> bool {
        self.read().is_unlocked(phase)
    }

    pub fn is_completed(&self, phase: PhaseId) -> bool {
        self.read().is_completed(phase)
    }

    pub fn record(&self, phase: PhaseId) -> Option<PhaseRecord> {
        self.read().phase_progress.get(&phase).cloned()
    }

    pub fn completion_percentage(&self) -> u8 {
        self.read().completion_percentage()
    }

    /// Saved play time plus the running session.
    pub fn total_play_time(&self) -> Duration {
        let saved = self.read().total_play_time;
        Duration::from_millis(saved + self.session_elapsed_ms())
    }

    pub fn formatted_play_time(&self) -> String {
        format_play_time(self.total_play_time())
    }

    /// Check a card code and, when it is valid and unused, consume it and
    /// unlock its phase.
    ///
    /// Rejections never mutate state.
    pub async fn validate_code(&self, raw: &str) -> CodeValidation {
        let code = UnlockCodeTable::normalize(raw);
        if code.is_empty() {
            return CodeValidation::rejected(CodeRejection::Empty);
        }

        let Some(phase) = self.codes.lookup(&code) else {
            debug!(code = %code, "Unknown unlock code");
            return CodeValidation::rejected(CodeRejection::Unknown);
        };

        {
            let mut state = self.write();
            if state.has_used_card(&code) {
                debug!(code = %code, phase = %phase, "Unlock code already used");
                return CodeValidation::rejected(CodeRejection::AlreadyUsed);
            }
            state.use_card(code.clone());
            state.unlock(phase);
        }

        info!(code = %code, phase = %phase, "Unlock code accepted");
        if let Err(e) = self.persist().await {
            warn!(error = %e, "Failed to persist progress after unlock");
        }

        CodeValidation::accepted(phase)
    }

    /// Record `phase` as the current phase, unlocking it when the entry
    /// reason grants access.
    pub async fn record_entry(&self, phase: PhaseId, reason: EntryReason) -> Result<()> {
        {
            let mut state = self.write();
            state.current_phase = phase;
            if reason.unlocks() && state.unlock(phase) {
                debug!(phase = %phase, reason = reason.as_str(), "Phase unlocked on entry");
            }
        }
        self.persist().await
    }

    /// Record completion of `phase` with its payload and persist immediately.
    ///
    /// The in-memory record is kept even when persisting fails.
    pub async fn complete_phase(
        &self,
        phase: PhaseId,
        payload: Map<String, Value>,
    ) -> Result<PhaseRecord> {
        let played = self.total_play_time().as_millis() as u64;
        let record = {
            let mut state = self.write();
            state
                .record_completion(phase, PhaseRecord::completed(payload).with_play_time(played))
                .clone()
        };

        info!(phase = %phase, "Phase completed");
        self.persist().await?;
        Ok(record)
    }

    /// Write the whole document to the store.
    ///
    /// Session play time is folded into `totalPlayTime` first.
    pub async fn persist(&self) -> Result<()> {
        let elapsed = self.session_elapsed_ms();
        let document = {
            let mut state = self.write();
            state.total_play_time += elapsed;
            state.last_save = chrono::Utc::now().timestamp_millis();
            state.to_document()?
        };
        self.restart_session();

        let text = serde_json::to_string(&document)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        self.store.set(SAVE_KEY, &text).await?;

        debug!(bytes = text.len(), "Progress persisted");
        Ok(())
    }

    /// Load the stored document. Never fails: anything unreadable degrades
    /// to a fresh start.
    pub async fn restore(&self) -> RestoreOutcome {
        let outcome = match self.store.get(SAVE_KEY).await {
            Ok(None) => {
                *self.write() = ProgressState::default();
                RestoreOutcome::Fresh
            }
            Ok(Some(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(document) => {
                    let DecodedProgress { state, repaired } =
                        ProgressState::from_document(&document);
                    if !repaired.is_empty() {
                        warn!(fields = ?repaired, "Saved progress partially repaired");
                    }
                    *self.write() = state;
                    RestoreOutcome::Restored { repaired }
                }
                Err(e) => {
                    warn!(error = %e, "Saved progress is corrupt, starting fresh");
                    *self.write() = ProgressState::default();
                    RestoreOutcome::Corrupt
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not read saved progress, starting fresh");
                *self.write() = ProgressState::default();
                RestoreOutcome::Fresh
            }
        };

        self.restart_session();
        let (current_phase, completed) = {
            let state = self.read();
            (state.current_phase, state.completed_count())
        };
        info!(current_phase = %current_phase, completed, "Progress restored");
        outcome
    }

    /// The document plus an `exportDate`, suitable for backup files.
    pub fn export(&self) -> Result<Value> {
        let mut document = self.read().to_document()?;
        if let Some(fields) = document.as_object_mut() {
            fields.insert(
                "exportDate".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        Ok(document)
    }

    /// Replace progress with an exported document and persist it.
    ///
    /// Anything that is not a JSON object is refused. Returns the fields that
    /// had to be repaired.
    pub async fn import(&self, document: &Value) -> Result<Vec<String>> {
        if !document.is_object() {
            return Err(ProgressError::InvalidDocument(
                "expected a JSON object".to_string(),
            ));
        }

        let DecodedProgress { state, repaired } = ProgressState::from_document(document);
        *self.write() = state;
        self.restart_session();

        info!(repaired = repaired.len(), "Progress imported");
        self.persist().await?;
        Ok(repaired)
    }

    /// Wipe all progress. Confirmation is the caller's responsibility.
    pub async fn reset_all(&self) -> Result<()> {
        self.store.remove(SAVE_KEY).await?;
        *self.write() = ProgressState::default();
        self.restart_session();
        info!("Progress reset");
        Ok(())
    }
}

impl std::fmt::Debug for ProgressGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("ProgressGate")
            .field("current_phase", &state.current_phase)
            .field("unlocked", &state.unlocked_phases)
            .field("completed", &state.completed_count())
            .finish()
    }
}

/// `"1h 5m"` from an hour up, `"5m 3s"` below.
pub fn format_play_time(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    fn gate_with(store: Arc<MemoryStore>) -> ProgressGate {
        ProgressGate::new(store, UnlockCodeTable::standard())
    }

    struct BrokenStore;

    #[async_trait]
    impl ProgressStore for BrokenStore {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }

        async fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }

        async fn remove(&self, _key: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn test_valid_code_unlocks_once() {
        let gate = gate_with(Arc::new(MemoryStore::new()));

        let first = gate.validate_code("AURORA1").await;
        assert!(first.valid);
        assert_eq!(first.phase, Some(PhaseId::COURAGE));
        assert!(gate.is_unlocked(PhaseId::COURAGE));
        assert!(gate.snapshot().has_used_card("AURORA1"));

        let second = gate.validate_code("AURORA1").await;
        assert!(!second.valid);
        assert_eq!(second.rejection, Some(CodeRejection::AlreadyUsed));
        assert!(second.message.contains("already been used"));
    }

    #[tokio::test]
    async fn test_code_normalization() {
        let gate = gate_with(Arc::new(MemoryStore::new()));

        let accepted = gate.validate_code("  aurora2 ").await;
        assert_eq!(accepted.phase, Some(PhaseId::WISDOM));

        let reused = gate.validate_code("AURORA2").await;
        assert_eq!(reused.rejection, Some(CodeRejection::AlreadyUsed));
    }

    #[tokio::test]
    async fn test_unknown_code_mutates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store.clone());
        let before = gate.snapshot();

        for _ in 0..3 {
            let result = gate.validate_code("ZZZZ").await;
            assert!(!result.valid);
            assert_eq!(result.rejection, Some(CodeRejection::Unknown));
            assert!(result.message.contains("Invalid code"));
        }

        assert_eq!(gate.snapshot(), before);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_code() {
        let gate = gate_with(Arc::new(MemoryStore::new()));
        let result = gate.validate_code("   ").await;
        assert_eq!(result.rejection, Some(CodeRejection::Empty));
    }

    #[tokio::test]
    async fn test_complete_phase_persists_record() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store.clone());

        let mut payload = Map::new();
        payload.insert("objectsFound".to_string(), json!(["sword", "lion"]));
        let record = gate
            .complete_phase(PhaseId::COURAGE, payload)
            .await
            .unwrap();

        assert!(record.completed);
        assert!(gate.is_completed(PhaseId::COURAGE));

        let saved: Value =
            serde_json::from_str(&store.get(SAVE_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(saved["phaseProgress"]["1"]["completed"], json!(true));
        assert_eq!(
            saved["phaseProgress"]["1"]["objectsFound"],
            json!(["sword", "lion"])
        );
    }

    #[tokio::test]
    async fn test_complete_phase_keeps_record_when_store_fails() {
        let gate = ProgressGate::new(Arc::new(BrokenStore), UnlockCodeTable::standard());

        let result = gate.complete_phase(PhaseId::WISDOM, Map::new()).await;
        assert!(matches!(result, Err(ProgressError::Store(_))));
        assert!(gate.is_completed(PhaseId::WISDOM));
    }

    #[tokio::test]
    async fn test_persist_restore_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store.clone());

        gate.validate_code("AURORA1").await;
        gate.record_entry(PhaseId::COURAGE, EntryReason::Code)
            .await
            .unwrap();
        gate.complete_phase(PhaseId::COURAGE, Map::new())
            .await
            .unwrap();
        gate.persist().await.unwrap();

        let restored = gate_with(store.clone());
        let outcome = restored.restore().await;

        assert_eq!(outcome, RestoreOutcome::Restored { repaired: vec![] });
        assert_eq!(restored.snapshot(), gate.snapshot());
        assert_eq!(restored.current_phase(), PhaseId::COURAGE);
    }

    #[tokio::test]
    async fn test_restore_from_empty_store() {
        let gate = gate_with(Arc::new(MemoryStore::new()));

        assert_eq!(gate.restore().await, RestoreOutcome::Fresh);
        assert_eq!(gate.snapshot(), ProgressState::default());
        assert!(gate.is_unlocked(PhaseId::LETTER));
        assert_eq!(gate.completion_percentage(), 0);
    }

    #[tokio::test]
    async fn test_restore_from_corrupt_store() {
        let store = Arc::new(MemoryStore::new());
        store.set(SAVE_KEY, "{not json").await.unwrap();
        let gate = gate_with(store);

        assert_eq!(gate.restore().await, RestoreOutcome::Corrupt);
        assert_eq!(gate.snapshot(), ProgressState::default());
    }

    #[tokio::test]
    async fn test_restore_from_unreadable_store() {
        let gate = ProgressGate::new(Arc::new(BrokenStore), UnlockCodeTable::standard());
        assert_eq!(gate.restore().await, RestoreOutcome::Fresh);
        assert!(gate.is_unlocked(PhaseId::LETTER));
    }

    #[tokio::test]
    async fn test_record_entry_unlocks_only_for_granting_reasons() {
        let gate = gate_with(Arc::new(MemoryStore::new()));

        gate.record_entry(PhaseId::FAITH, EntryReason::Manual)
            .await
            .unwrap();
        assert_eq!(gate.current_phase(), PhaseId::FAITH);
        assert!(!gate.is_unlocked(PhaseId::FAITH));

        gate.record_entry(PhaseId::GRACE, EntryReason::AutoAdvance)
            .await
            .unwrap();
        assert!(gate.is_unlocked(PhaseId::GRACE));
    }

    #[tokio::test]
    async fn test_export_import() {
        let source = gate_with(Arc::new(MemoryStore::new()));
        source.validate_code("AURORA3").await;
        source
            .complete_phase(PhaseId::LOYALTY, Map::new())
            .await
            .unwrap();

        let exported = source.export().unwrap();
        assert!(exported["exportDate"].is_string());

        let target = gate_with(Arc::new(MemoryStore::new()));
        let repaired = target.import(&exported).await.unwrap();
        assert!(repaired.is_empty());
        assert!(target.is_unlocked(PhaseId::LOYALTY));
        assert!(target.is_completed(PhaseId::LOYALTY));
        assert_eq!(
            target.validate_code("AURORA3").await.rejection,
            Some(CodeRejection::AlreadyUsed)
        );
    }

    #[tokio::test]
    async fn test_import_rejects_non_object() {
        let gate = gate_with(Arc::new(MemoryStore::new()));
        let result = gate.import(&json!([1, 2, 3])).await;
        assert!(matches!(result, Err(ProgressError::InvalidDocument(_))));
        assert_eq!(gate.snapshot(), ProgressState::default());
    }

    #[tokio::test]
    async fn test_reset_all() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store.clone());
        gate.validate_code("AURORA1").await;
        assert!(!store.is_empty().await);

        gate.reset_all().await.unwrap();
        assert!(store.is_empty().await);
        assert_eq!(gate.snapshot(), ProgressState::default());
        assert!(gate.validate_code("AURORA1").await.valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_time_accumulates_across_persist() {
        let store = Arc::new(MemoryStore::new());
        let gate = gate_with(store.clone());

        tokio::time::advance(Duration::from_secs(90)).await;
        gate.persist().await.unwrap();
        assert_eq!(gate.snapshot().total_play_time, 90_000);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(gate.total_play_time(), Duration::from_secs(120));
        assert_eq!(gate.formatted_play_time(), "2m 0s");
    }

    #[test]
    fn test_format_play_time() {
        assert_eq!(format_play_time(Duration::from_secs(303)), "5m 3s");
        assert_eq!(format_play_time(Duration::from_secs(3900)), "1h 5m");
        assert_eq!(format_play_time(Duration::ZERO), "0m 0s");
    }
}
