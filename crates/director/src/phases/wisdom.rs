use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::wisdom::{self, Riddle};
use aurora_core::content::Line;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::json;

use super::{celebrate, hover, open_portal, payload, set_stage};
use crate::animation::{Easing, Tween};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::{Color, Placement, Shape, ToastKind};

const EAGLE_POSITION: Vec3 = Vec3::new(0.0, 2.0, -4.0);

/// The eagle's three riddles.
#[derive(Debug, Default)]
pub struct WisdomPhase {
    solved: u32,
    revealed: u32,
    attempts: u32,
}

impl WisdomPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks one riddle until it is answered or the player gives up.
    async fn ask(&mut self, ctx: &PhaseContext, riddle: &Riddle) -> PhaseResult<()> {
        loop {
            ctx.show_text(riddle.question, None);
            let gate = Interaction::choice(riddle.options.iter().copied());

            match ctx.gate(gate, GatePolicy::give_up()).await? {
                GateOutcome::Responded(PlayerInput::Select(index)) if index == riddle.answer => {
                    self.attempts += 1;
                    self.solved += 1;
                    ctx.hide_text();
                    celebrate(ctx, EAGLE_POSITION);
                    return ctx.narrate(&Line::new(riddle.verse, 4000)).await;
                }
                GateOutcome::Responded(_) => {
                    self.attempts += 1;
                    ctx.sfx("wrong");
                    ctx.toast(wisdom::WRONG_ANSWER, ToastKind::Error);
                }
                GateOutcome::TimedOut | GateOutcome::GaveUp => {
                    self.revealed += 1;
                    ctx.show_text(wisdom::REVEAL_ANSWER, Some(riddle.options[riddle.answer]));
                    ctx.pause(3000).await?;
                    return ctx.narrate(&Line::new(riddle.verse, 4000)).await;
                }
            }
        }
    }
}

#[async_trait]
impl PhaseScript for WisdomPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::WISDOM
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);

        let eagle = ctx
            .load_model(
                wisdom::EAGLE_MODEL,
                Placement::at(EAGLE_POSITION),
                Shape::Figure,
                Color::SKY,
            )
            .await?;
        hover(ctx, eagle, EAGLE_POSITION);

        ctx.narrate_all(wisdom::INTRO).await?;

        for (index, riddle) in wisdom::RIDDLES.iter().enumerate() {
            self.ask(ctx, riddle).await?;

            let shelf = Vec3::new(-2.0 + 2.0 * index as f32, 0.5, -3.0);
            if let Some(book) = ctx.placeholder(Shape::Box, Color::GOLD, Placement::at(shelf)) {
                ctx.animate_detached(
                    book,
                    Tween::intensity(2.0, Duration::from_millis(800)).with_easing(Easing::QuadOut),
                );
            }
        }

        ctx.narrate(&wisdom::VERSE).await?;
        open_portal(ctx).await?;

        ctx.finish(payload(json!({
            "riddlesSolved": self.solved,
            "answersRevealed": self.revealed,
            "attempts": self.attempts,
        })))
        .await
    }
}
