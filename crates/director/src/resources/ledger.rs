//! Cancellable timers and animations.
//!
//! Every effect a phase schedules goes through the ledger. A single
//! [`ResourceLedger::release_all`] call guarantees nothing scheduled through
//! it runs phase logic afterwards: pending tasks are aborted, and a task
//! that already woke up checks the release token before doing anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::animation::{Tween, TweenTarget};

/// Roughly one display frame.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(u64);

impl fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect-{}", self.0)
    }
}

/// Returned by the awaiting primitives once the ledger is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ledger released")]
pub struct LedgerReleased;

#[derive(Default)]
struct LedgerInner {
    next: u64,
    timers: HashMap<EffectHandle, JoinHandle<()>>,
    animations: HashMap<EffectHandle, JoinHandle<()>>,
}

impl LedgerInner {
    fn next_handle(&mut self) -> EffectHandle {
        self.next += 1;
        EffectHandle(self.next)
    }
}

fn lock(inner: &Mutex<LedgerInner>) -> MutexGuard<'_, LedgerInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ResourceLedger {
    released: CancellationToken,
    inner: Arc<Mutex<LedgerInner>>,
    frame_interval: Duration,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            released: CancellationToken::new(),
            inner: Arc::new(Mutex::new(LedgerInner::default())),
            frame_interval: frame_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    /// Token cancelled by [`release_all`](Self::release_all).
    pub fn token(&self) -> CancellationToken {
        self.released.clone()
    }

    /// Runs `callback` after `delay` unless the ledger is released first.
    ///
    /// Returns `None` without calling `callback` if already released.
    pub fn schedule_delay<F>(&self, delay: Duration, callback: F) -> Option<EffectHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        if self.is_released() {
            return None;
        }

        let handle = inner.next_handle();
        let token = self.released.clone();
        let shared = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let fire = {
                let mut inner = lock(&shared);
                if token.is_cancelled() {
                    false
                } else {
                    inner.timers.remove(&handle);
                    true
                }
            };

            if fire {
                callback();
            }
        });

        inner.timers.insert(handle, task);
        Some(handle)
    }

    /// Suspends for `delay`. Fails as soon as the ledger is released.
    pub async fn await_delay(&self, delay: Duration) -> Result<(), LedgerReleased> {
        let (tx, rx) = oneshot::channel();
        if self
            .schedule_delay(delay, move || {
                let _ = tx.send(());
            })
            .is_none()
        {
            return Err(LedgerReleased);
        }

        tokio::select! {
            biased;
            _ = self.released.cancelled() => Err(LedgerReleased),
            fired = rx => fired.map_err(|_| LedgerReleased),
        }
    }

    /// Starts driving `tween` against `target`, one sample per frame.
    ///
    /// When already released the completion callback runs synchronously,
    /// exactly once, and `None` is returned.
    pub fn animate(&self, target: Arc<dyn TweenTarget>, mut tween: Tween) -> Option<EffectHandle> {
        let on_complete = tween.take_on_complete();

        let mut inner = lock(&self.inner);
        if self.is_released() {
            drop(inner);
            if let Some(callback) = on_complete {
                callback();
            }
            return None;
        }

        let handle = inner.next_handle();
        let token = self.released.clone();
        let shared = Arc::clone(&self.inner);
        let frame_interval = self.frame_interval;

        let task = tokio::spawn(async move {
            let from = tween
                .from
                .unwrap_or_else(|| target.current(tween.property));
            let started = Instant::now();
            let mut frames = tokio::time::interval(frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                frames.tick().await;
                if token.is_cancelled() {
                    return;
                }

                let (value, finished) = tween.sample(from, started.elapsed());
                target.apply(tween.property, value);
                if finished {
                    break;
                }
            }

            let fire = {
                let mut inner = lock(&shared);
                if token.is_cancelled() {
                    false
                } else {
                    inner.animations.remove(&handle);
                    true
                }
            };

            if fire {
                if let Some(callback) = on_complete {
                    callback();
                }
            }
        });

        inner.animations.insert(handle, task);
        Some(handle)
    }

    /// Runs `tween` to completion. An infinite tween only ends on release.
    pub async fn await_animation(
        &self,
        target: Arc<dyn TweenTarget>,
        mut tween: Tween,
    ) -> Result<(), LedgerReleased> {
        if self.is_released() {
            return Err(LedgerReleased);
        }

        let (tx, rx) = oneshot::channel();
        let chained = tween.take_on_complete();
        let tween = tween.with_on_complete(move || {
            if let Some(callback) = chained {
                callback();
            }
            let _ = tx.send(());
        });

        if self.animate(target, tween).is_none() {
            return Err(LedgerReleased);
        }

        tokio::select! {
            biased;
            _ = self.released.cancelled() => Err(LedgerReleased),
            done = rx => done.map_err(|_| LedgerReleased),
        }
    }

    /// Cancels one effect without firing it. Returns whether it was pending.
    pub fn cancel(&self, handle: EffectHandle) -> bool {
        let task = {
            let mut inner = lock(&self.inner);
            inner
                .timers
                .remove(&handle)
                .or_else(|| inner.animations.remove(&handle))
        };

        match task {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer and animation. Idempotent.
    pub fn release_all(&self) {
        self.released.cancel();

        let (timers, animations) = {
            let mut inner = lock(&self.inner);
            (
                std::mem::take(&mut inner.timers),
                std::mem::take(&mut inner.animations),
            )
        };

        if timers.is_empty() && animations.is_empty() {
            return;
        }

        debug!(
            timers = timers.len(),
            animations = animations.len(),
            "Releasing pending effects"
        );

        for task in timers.into_values().chain(animations.into_values()) {
            task.abort();
        }
    }

    pub fn pending_timers(&self) -> usize {
        lock(&self.inner).timers.len()
    }

    pub fn pending_animations(&self) -> usize {
        lock(&self.inner).animations.len()
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResourceLedger {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLedger")
            .field("released", &self.is_released())
            .field("pending_timers", &self.pending_timers())
            .field("pending_animations", &self.pending_animations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Easing, Property};
    use glam::Vec3;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Default)]
    struct Target {
        value: Mutex<Vec3>,
        writes: AtomicUsize,
    }

    impl TweenTarget for Target {
        fn current(&self, _property: Property) -> Vec3 {
            *self.value.lock().unwrap()
        }

        fn apply(&self, _property: Property, value: Vec3) {
            *self.value.lock().unwrap() = value;
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || {
            let shared = Arc::clone(&shared);
            Box::new(move || {
                shared.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_fires_once_after_duration() {
        let ledger = ResourceLedger::new();
        let (fired, make) = counter();

        let handle = ledger.schedule_delay(ms(100), make());
        assert!(handle.is_some());
        assert_eq!(ledger.pending_timers(), 1);

        tokio::time::sleep(ms(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(ms(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_silences_every_pending_effect() {
        let ledger = ResourceLedger::new();
        let target = Arc::new(Target::default());
        let (fired, make) = counter();

        for i in 0..20 {
            ledger.schedule_delay(ms(10 * (i + 1)), make());
            ledger.animate(
                target.clone(),
                Tween::opacity(1.0, ms(50)).with_on_complete(make()),
            );
        }

        tokio::time::sleep(ms(5)).await;
        ledger.release_all();
        let writes_at_release = target.writes.load(Ordering::SeqCst);

        tokio::time::sleep(ms(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(target.writes.load(Ordering::SeqCst), writes_at_release);
        assert_eq!(ledger.pending_timers(), 0);
        assert_eq!(ledger.pending_animations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_is_idempotent() {
        let ledger = ResourceLedger::new();
        ledger.schedule_delay(ms(10), || {});

        ledger.release_all();
        ledger.release_all();

        assert!(ledger.is_released());
        assert_eq!(ledger.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_release_is_noop() {
        let ledger = ResourceLedger::new();
        ledger.release_all();
        let (fired, make) = counter();

        assert!(ledger.schedule_delay(ms(0), make()).is_none());
        tokio::time::sleep(ms(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_after_release_completes_synchronously() {
        let ledger = ResourceLedger::new();
        ledger.release_all();
        let (fired, make) = counter();

        let target = Arc::new(Target::default());
        let handle = ledger.animate(target.clone(), Tween::opacity(1.0, ms(100)).with_on_complete(make()));

        assert!(handle.is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        tokio::time::sleep(ms(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(target.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_delay_rejects_when_released() {
        let ledger = ResourceLedger::new();
        ledger.release_all();
        assert_eq!(ledger.await_delay(ms(10)).await, Err(LedgerReleased));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_delay_rejects_on_release_mid_wait() {
        let ledger = Arc::new(ResourceLedger::new());
        let releaser = Arc::clone(&ledger);
        tokio::spawn(async move {
            tokio::time::sleep(ms(100)).await;
            releaser.release_all();
        });

        let started = Instant::now();
        assert_eq!(ledger.await_delay(ms(10_000)).await, Err(LedgerReleased));
        assert!(started.elapsed() < ms(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_reaches_target() {
        let ledger = ResourceLedger::new();
        let target = Arc::new(Target::default());

        ledger
            .await_animation(
                target.clone(),
                Tween::position(Vec3::new(4.0, 2.0, 0.0), ms(200)).with_easing(Easing::Linear),
            )
            .await
            .unwrap();

        assert_eq!(*target.value.lock().unwrap(), Vec3::new(4.0, 2.0, 0.0));
        assert!(target.writes.load(Ordering::SeqCst) > 2);
        assert_eq!(ledger.pending_animations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_animation_keeps_callers_callback() {
        let ledger = ResourceLedger::new();
        let (fired, make) = counter();

        ledger
            .await_animation(
                Arc::new(Target::default()),
                Tween::scale_uniform(2.0, ms(50)).with_on_complete(make()),
            )
            .await
            .unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_single_effect() {
        let ledger = ResourceLedger::new();
        let (fired, make) = counter();

        let cancelled = ledger.schedule_delay(ms(100), make()).unwrap();
        ledger.schedule_delay(ms(100), make());

        assert!(ledger.cancel(cancelled));
        assert!(!ledger.cancel(cancelled));

        tokio::time::sleep(ms(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!ledger.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_schedule_more() {
        let ledger = Arc::new(ResourceLedger::new());
        let (fired, make) = counter();
        let inner = Arc::clone(&ledger);
        let follow_up = make();

        ledger.schedule_delay(ms(10), move || {
            inner.schedule_delay(ms(10), follow_up);
        });

        tokio::time::sleep(ms(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
