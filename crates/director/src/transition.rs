//! Fade overlay bracketing every phase change.
//!
//! Each fade ends by snapping the overlay to exactly 1 or 0, so a
//! transition never leaves it half applied.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::animation::{Easing, Tween};
use crate::resources::ResourceLedger;
use crate::surfaces::{Color, Overlay, PresentationSurface};

pub struct Transitions {
    presentation: Arc<dyn PresentationSurface>,
    ledger: ResourceLedger,
    duration: Duration,
}

impl Transitions {
    pub fn new(
        presentation: Arc<dyn PresentationSurface>,
        duration: Duration,
        frame_interval: Duration,
    ) -> Self {
        Self {
            presentation,
            ledger: ResourceLedger::with_frame_interval(frame_interval),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    async fn fade_to(&self, opacity: f32) {
        let overlay = Arc::new(Overlay::new(Arc::clone(&self.presentation)));
        let tween = Tween::opacity(opacity, self.duration).with_easing(Easing::QuadInOut);
        if self.ledger.await_animation(overlay, tween).await.is_err() {
            debug!("Transition interrupted");
        }
        self.presentation.set_overlay(opacity);
    }

    /// Covers the scene with an opaque black overlay.
    pub async fn fade_out(&self) {
        self.presentation.set_overlay_color(Color::BLACK);
        self.fade_to(1.0).await;
    }

    /// Reveals the scene again.
    pub async fn fade_in(&self) {
        self.fade_to(0.0).await;
    }

    /// Snaps the overlay fully opaque without animating.
    pub fn cover(&self) {
        self.presentation.set_overlay_color(Color::BLACK);
        self.presentation.set_overlay(1.0);
    }

    /// Stops any running fade and clears the overlay.
    pub fn release(&self) {
        self.ledger.release_all();
        self.presentation.set_overlay(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Recorder, SurfaceCall};

    #[tokio::test(start_paused = true)]
    async fn test_fades_end_exactly() {
        let recorder = Recorder::new();
        let transitions = Transitions::new(
            recorder.surfaces().presentation,
            Duration::from_millis(500),
            Duration::from_millis(16),
        );

        transitions.fade_out().await;
        assert_eq!(recorder.overlay_opacity(), 1.0);
        assert_eq!(
            recorder.calls().first(),
            Some(&SurfaceCall::OverlayColor(Color::BLACK))
        );

        transitions.fade_in().await;
        assert_eq!(recorder.overlay_opacity(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_transition_still_settles() {
        let recorder = Recorder::new();
        let transitions = Transitions::new(
            recorder.surfaces().presentation,
            Duration::from_millis(500),
            Duration::from_millis(16),
        );

        transitions.release();
        transitions.fade_out().await;
        assert_eq!(recorder.overlay_opacity(), 1.0);
    }
}
