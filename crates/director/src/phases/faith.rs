use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::faith::{self, Dilemma, Moral};
use aurora_core::content::Line;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::{json, Map, Value};

use super::{open_portal, payload, set_stage};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::Color;

const ALTAR: Vec3 = Vec3::new(0.0, 1.0, -3.0);

/// Three moral dilemmas in the Slytherin dungeon.
#[derive(Debug, Default)]
pub struct FaithPhase {
    choices: Vec<(&'static str, Option<Moral>)>,
}

impl FaithPhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn count(&self, moral: Moral) -> usize {
        self.choices
            .iter()
            .filter(|(_, choice)| *choice == Some(moral))
            .count()
    }

    async fn face(&mut self, ctx: &PhaseContext, dilemma: &'static Dilemma) -> PhaseResult<()> {
        ctx.show_text(dilemma.question, None);
        let gate = Interaction::choice(dilemma.options.iter().map(|option| option.text));
        let outcome = ctx.gate(gate, GatePolicy::give_up()).await?;
        ctx.hide_text();

        match outcome {
            GateOutcome::Responded(PlayerInput::Select(index)) => {
                let option = &dilemma.options[index];
                self.choices.push((dilemma.id, Some(option.moral)));
                ctx.sfx(if option.moral == Moral::Fail { "wrong" } else { "success" });
                ctx.particles(
                    ALTAR,
                    20,
                    Color(option.moral.color()),
                    Duration::from_millis(1500),
                );
                ctx.narrate(&Line::new(option.feedback, 4000).with_verse(dilemma.reference))
                    .await
            }
            _ => {
                self.choices.push((dilemma.id, None));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PhaseScript for FaithPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::FAITH
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.narrate_all(faith::INTRO).await?;

        for dilemma in faith::DILEMMAS {
            self.face(ctx, dilemma).await?;
        }

        let reflection = if self.count(Moral::Ideal) >= faith::FAITHFUL_THRESHOLD {
            &faith::REFLECTION_FAITHFUL
        } else {
            &faith::REFLECTION_LEARNING
        };
        ctx.narrate(reflection).await?;
        open_portal(ctx).await?;

        let choices: Map<String, Value> = self
            .choices
            .iter()
            .map(|(id, moral)| {
                let moral = moral.map(|m| m.as_str()).unwrap_or("skipped");
                (id.to_string(), json!(moral))
            })
            .collect();

        ctx.finish(payload(json!({
            "choices": choices,
            "idealChoices": self.count(Moral::Ideal),
            "failChoices": self.count(Moral::Fail),
        })))
        .await
    }
}
