use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::grace;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::json;
use tracing::debug;

use super::{payload, set_stage};
use crate::animation::Property;
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, Interaction};
use crate::resources::EffectHandle;
use crate::surfaces::{Color, Counter, ObjectHandle, Placement, Shape, ToastKind};

const WAND_MODEL: &str = "phase8/wand";
const WAND_POSITION: Vec3 = Vec3::new(0.0, 1.0, -2.5);

/// The unsolvable enigma and the end of the journey.
#[derive(Debug, Default)]
pub struct GracePhase {
    attempts: u32,
    gave_up: bool,
}

/// Seconds from the start of the countdown until `remaining` seconds are left.
fn mark(remaining: u64) -> Duration {
    Duration::from_secs(grace::ENIGMA_SECS.saturating_sub(remaining))
}

impl GracePhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn countdown(&self, ctx: &PhaseContext, wand: ObjectHandle) -> Vec<EffectHandle> {
        let mut beats = Vec::new();

        for elapsed in 1..=grace::ENIGMA_SECS {
            let left = (grace::ENIGMA_SECS - elapsed) as u32;
            beats.push(ctx.after(Duration::from_secs(elapsed), move |ctx| {
                ctx.counter(&Counter::new("Time", left));
            }));
        }

        beats.push(ctx.after(mark(grace::MUSIC_STOPS_AT_SECS), |ctx| {
            ctx.stop_music(Duration::from_millis(1000));
        }));

        for (remaining, intensity) in grace::WAND_LIGHT {
            let intensity = *intensity;
            beats.push(ctx.after(mark(*remaining), move |ctx| {
                ctx.set_property(wand, Property::Intensity, Vec3::new(intensity, 0.0, 0.0));
            }));
        }

        beats.into_iter().flatten().collect()
    }

    async fn enigma(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let deadline = ctx.deadline(mark(grace::AVADA_AT_SECS));
        loop {
            let gate = Interaction::Ordering {
                items: grace::ENIGMA_SYMBOLS.iter().map(|s| s.to_string()).collect(),
                slots: grace::ENIGMA_SLOTS,
            };
            match ctx.gate_until(gate, deadline).await? {
                GateOutcome::Responded(_) => {
                    self.attempts += 1;
                    ctx.sfx("wrong");
                    ctx.toast(grace::ENIGMA_WRONG, ToastKind::Error);
                }
                GateOutcome::TimedOut => return Ok(()),
                GateOutcome::GaveUp => {
                    self.gave_up = true;
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl PhaseScript for GracePhase {
    fn phase(&self) -> PhaseId {
        PhaseId::GRACE
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.narrate_all(grace::INTRO).await?;

        let wand = ctx
            .load_model(
                WAND_MODEL,
                Placement::at(WAND_POSITION),
                Shape::Light,
                Color::GREEN,
            )
            .await?;

        ctx.show_text(grace::ENIGMA_HINT, None);
        ctx.counter(&Counter::new("Time", grace::ENIGMA_SECS as u32));
        let countdown = self.countdown(ctx, wand);

        self.enigma(ctx).await?;
        for beat in countdown {
            ctx.ledger().cancel(beat);
        }
        debug!(attempts = self.attempts, gave_up = self.gave_up, "Enigma over");

        ctx.hide_counter();
        ctx.stop_music(Duration::from_millis(300));
        ctx.show_text(grace::AVADA, None);
        ctx.pause((grace::AVADA_AT_SECS - grace::KEDAVRA_AT_SECS) * 1000)
            .await?;
        ctx.show_text(grace::KEDAVRA, None);
        ctx.pause(grace::KEDAVRA_AT_SECS * 1000).await?;

        ctx.sfx("avada");
        ctx.hide_text();
        ctx.flash(
            Color::GREEN,
            Duration::from_millis(500),
            Duration::from_millis(2000),
        )
        .await?;

        ctx.narrate_all(grace::REVELATION).await?;
        ctx.narrate(&grace::MAIN_MESSAGE).await?;
        ctx.particles(WAND_POSITION, 60, Color::GOLD, Duration::from_millis(4000));
        ctx.narrate_all(grace::FINAL_MESSAGE).await?;

        ctx.finish(payload(json!({
            "journeyComplete": true,
            "enigmaAttempts": self.attempts,
            "gaveUp": self.gave_up,
        })))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_count_down_from_the_limit() {
        assert_eq!(mark(grace::MUSIC_STOPS_AT_SECS), Duration::from_secs(50));
        assert_eq!(mark(grace::AVADA_AT_SECS), Duration::from_secs(57));
        assert_eq!(mark(120), Duration::ZERO);
    }
}
