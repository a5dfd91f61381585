use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::intro;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::json;

use super::{hover, payload, set_stage};
use crate::animation::{Easing, Tween};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::surfaces::{Color, Placement, Shape};

const HAT_POSITION: Vec3 = Vec3::new(0.0, 0.0, -3.0);

/// The letter arrives and the Sorting Hat introduces the journey.
#[derive(Debug, Default)]
pub struct LetterPhase;

impl LetterPhase {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhaseScript for LetterPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::LETTER
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);

        let letter = ctx
            .load_model(
                "phase0/letter",
                Placement::at(Vec3::new(0.0, 5.0, -2.0)),
                Shape::Letter,
                Color::WHITE,
            )
            .await?;
        ctx.animate(
            letter,
            Tween::position(Vec3::new(0.0, 1.0, -2.0), Duration::from_millis(2500))
                .with_easing(Easing::SineInOut),
        )
        .await?;

        ctx.sfx("letter-open");
        ctx.narrate(&intro::LETTER).await?;
        ctx.animate(letter, Tween::opacity(0.0, Duration::from_millis(800)))
            .await?;
        ctx.remove(letter);

        let hat = ctx
            .load_model(
                intro::HAT_MODEL,
                Placement::at(HAT_POSITION).with_scale(0.0),
                Shape::Cone,
                Color(0x5b3a29),
            )
            .await?;
        ctx.animate(
            hat,
            Tween::scale_uniform(1.0, Duration::from_millis(1200)).with_easing(Easing::BackOut),
        )
        .await?;
        hover(ctx, hat, HAT_POSITION);

        ctx.narrate_all(intro::HAT_DIALOGUE).await?;
        ctx.finish(payload(json!({ "letterRead": true }))).await
    }
}
