use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::darkness;
use aurora_core::PhaseId;
use serde_json::json;

use super::{payload, set_stage};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::resources::EffectHandle;

/// Overlay opacity of the frozen screen.
const FREEZE_OPACITY: f32 = 0.6;

/// The experience falls apart around three relics, then asks the player to stay.
#[derive(Debug, Default)]
pub struct DarkNightPhase {
    stayed: bool,
}

impl DarkNightPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the disintegration beats relative to now.
    fn disintegrate(&self, ctx: &PhaseContext) -> Vec<EffectHandle> {
        let at = Duration::from_secs;
        [
            ctx.after(at(darkness::GLITCH_AT_SECS), |ctx| {
                ctx.sfx("glitch");
                ctx.show_text(darkness::GLITCH_TEXT, None);
            }),
            ctx.after(at(darkness::BUTTONS_BREAK_AT_SECS), |ctx| {
                ctx.show_text(darkness::BROKEN_TEXT, None);
            }),
            ctx.after(at(darkness::MUSIC_STOPS_AT_SECS), |ctx| {
                ctx.stop_music(Duration::from_millis(300));
            }),
            ctx.after(at(darkness::INTERFACE_BREAKS_AT_SECS), |ctx| {
                ctx.show_text(darkness::UNRESPONSIVE, None);
            }),
            ctx.after(at(darkness::FREEZE_AT_SECS), |ctx| {
                ctx.set_overlay(FREEZE_OPACITY);
            }),
            ctx.after(at(darkness::SILENCE_AT_SECS), |ctx| ctx.hide_text()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[async_trait]
impl PhaseScript for DarkNightPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::DARK_NIGHT
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.show_text(darkness::OPENING.text, None);

        let timeline = self.disintegrate(ctx);
        let deadline = ctx.deadline(Duration::from_secs(darkness::SILENCE_AT_SECS));

        // The relics never answer; choosing one only deepens the glitch.
        loop {
            let gate = Interaction::choice(darkness::RELICS.iter().copied());
            match ctx.gate_until(gate, deadline).await? {
                GateOutcome::Responded(_) => {
                    ctx.sfx("glitch");
                }
                GateOutcome::TimedOut | GateOutcome::GaveUp => break,
            }
        }

        // Giving up early skips straight to the silence.
        for handle in timeline {
            ctx.ledger().cancel(handle);
        }
        ctx.stop_music(Duration::from_millis(300));
        ctx.hide_text();

        let outcome = ctx
            .gate(
                Interaction::confirm(darkness::STAY_LABEL),
                GatePolicy::give_up(),
            )
            .await?;
        self.stayed = outcome == GateOutcome::Responded(PlayerInput::Confirm);

        ctx.fade_overlay(0.0, Duration::from_millis(1500)).await?;
        ctx.narrate(&darkness::REMAIN).await?;

        ctx.finish(payload(json!({ "stayed": self.stayed }))).await
    }
}
