//! Phase script contract and the registry of scripts by phase id.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aurora_core::PhaseId;

use super::context::PhaseContext;
use crate::error::PhaseResult;

/// One phase of the experience, written as a sequence of beats.
///
/// Every suspension goes through the context (`pause`, `narrate`, `gate`,
/// `animate`), which returns [`PhaseError::Cancelled`] once the phase is torn
/// down. Propagating that error with `?` ends the script without further
/// side effects.
///
/// [`PhaseError::Cancelled`]: crate::error::PhaseError::Cancelled
#[async_trait]
pub trait PhaseScript: Send {
    fn phase(&self) -> PhaseId;

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()>;
}

/// Builds a fresh script for every entry into a phase.
pub type PhaseFactory = Arc<dyn Fn() -> Box<dyn PhaseScript> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PhaseRegistry {
    factories: BTreeMap<PhaseId, PhaseFactory>,
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, phase: PhaseId, factory: F)
    where
        F: Fn() -> Box<dyn PhaseScript> + Send + Sync + 'static,
    {
        self.factories.insert(phase, Arc::new(factory));
    }

    pub fn with<F>(mut self, phase: PhaseId, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PhaseScript> + Send + Sync + 'static,
    {
        self.register(phase, factory);
        self
    }

    pub fn contains(&self, phase: PhaseId) -> bool {
        self.factories.contains_key(&phase)
    }

    pub fn create(&self, phase: PhaseId) -> Option<Box<dyn PhaseScript>> {
        self.factories.get(&phase).map(|factory| factory())
    }

    pub fn phases(&self) -> impl Iterator<Item = PhaseId> + '_ {
        self.factories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.phases()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle(PhaseId);

    #[async_trait]
    impl PhaseScript for Idle {
        fn phase(&self) -> PhaseId {
            self.0
        }

        async fn initialize(&mut self, _ctx: &PhaseContext) -> PhaseResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_creates_fresh_scripts() {
        let registry = PhaseRegistry::new()
            .with(PhaseId::LETTER, || Box::new(Idle(PhaseId::LETTER)))
            .with(PhaseId::WISDOM, || Box::new(Idle(PhaseId::WISDOM)));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(PhaseId::WISDOM));
        assert!(!registry.contains(PhaseId::GRACE));
        assert_eq!(
            registry.create(PhaseId::WISDOM).map(|s| s.phase()),
            Some(PhaseId::WISDOM)
        );
        assert!(registry.create(PhaseId::GRACE).is_none());
        assert_eq!(
            registry.phases().collect::<Vec<_>>(),
            vec![PhaseId::LETTER, PhaseId::WISDOM]
        );
    }
}
