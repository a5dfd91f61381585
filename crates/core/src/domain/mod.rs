mod codes;
mod lifecycle;
mod phase;
mod progress;

pub use codes::{CodeRejection, CodeValidation, UnlockCodeTable};
pub use lifecycle::{EntryReason, LifecycleState};
pub use phase::{PhaseId, PhaseInfo, UnlockRequirement, PHASE_CATALOG};
pub use progress::{DecodedProgress, PhaseRecord, ProgressState, SAVE_KEY};
