use std::f32::consts::TAU;
use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::patronus;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::json;
use tracing::debug;

use super::{celebrate, hover, open_portal, payload, set_stage};
use crate::animation::{Easing, Property, Tween};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::{Color, Counter, ObjectHandle, Placement, Shape};

const STAG_MODEL: &str = "phase5/stag";
const CENTER: Vec3 = Vec3::new(0.0, 1.0, -2.0);
const RING_RADIUS: f32 = 6.0;

/// Memories, a prayer and the dementors of the Dark Forest.
#[derive(Debug, Default)]
pub struct PatronusPhase {
    memories: Vec<&'static str>,
    prayer: Option<&'static str>,
    attempts: u32,
    helped: bool,
}

/// Where dementor `index` of `count` waits before closing in.
fn ring_position(index: usize, count: usize) -> Vec3 {
    let angle = TAU * index as f32 / count as f32;
    CENTER + Vec3::new(angle.cos() * RING_RADIUS, 0.5, angle.sin() * RING_RADIUS)
}

/// Whether an attempt that banished `banished` dementors drives them off.
fn repelled(banished: usize) -> bool {
    banished * 2 >= patronus::DEMENTOR_COUNT
}

impl PatronusPhase {
    pub fn new() -> Self {
        Self::default()
    }

    async fn gather_memories(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let gate = Interaction::multi_select(
            patronus::MEMORIES.iter().copied(),
            patronus::REQUIRED_MEMORIES,
        );
        let picks = match ctx.gate(gate, GatePolicy::give_up()).await? {
            GateOutcome::Responded(PlayerInput::SelectMany(picks)) => picks,
            _ => (0..patronus::REQUIRED_MEMORIES).collect(),
        };
        self.memories = picks.iter().map(|i| patronus::MEMORIES[*i]).collect();

        let light = patronus::LIGHT_PER_MEMORY * self.memories.len() as u32;
        ctx.counter(&Counter::new("Light", light).of(100));
        Ok(())
    }

    async fn pray(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let gate = Interaction::choice(patronus::PRAYERS.iter().copied());
        if let GateOutcome::Responded(PlayerInput::Select(index)) =
            ctx.gate(gate, GatePolicy::give_up()).await?
        {
            self.prayer = Some(patronus::PRAYERS[index]);
        }
        ctx.sfx("prayer");
        ctx.counter(&Counter::new("Light", 100).of(100));
        Ok(())
    }

    /// One timed wave of dementors. Returns whether it was won.
    async fn confront(&mut self, ctx: &PhaseContext) -> PhaseResult<bool> {
        self.attempts += 1;

        let mut remaining: Vec<ObjectHandle> = Vec::with_capacity(patronus::DEMENTOR_COUNT);
        for index in 0..patronus::DEMENTOR_COUNT {
            let start = ring_position(index, patronus::DEMENTOR_COUNT);
            if let Some(dementor) =
                ctx.placeholder(Shape::Figure, Color::SHADOW, Placement::at(start))
            {
                ctx.animate_detached(
                    dementor,
                    Tween::from_to(
                        Property::Position,
                        start,
                        CENTER,
                        Duration::from_secs(patronus::CONFRONTATION_SECS),
                    )
                    .with_easing(Easing::Linear),
                );
                remaining.push(dementor);
            }
        }

        ctx.narrate(&patronus::CONFRONT).await?;
        let deadline = ctx.deadline(Duration::from_secs(patronus::CONFRONTATION_SECS));
        let mut banished = 0;
        let total = patronus::DEMENTOR_COUNT as u32;
        ctx.counter(&Counter::new("Dementors", 0).of(total));

        while !remaining.is_empty() {
            let gate = Interaction::object_hunt(remaining.clone());
            match ctx.gate_until(gate, deadline).await? {
                GateOutcome::Responded(PlayerInput::Click(handle)) => {
                    remaining.retain(|h| *h != handle);
                    ctx.remove(handle);
                    ctx.sfx("banish");
                    ctx.particles(CENTER, 15, Color::SILVER, Duration::from_millis(1000));
                    banished += 1;
                    ctx.counter(&Counter::new("Dementors", banished as u32).of(total));
                }
                GateOutcome::Responded(_) => {}
                GateOutcome::TimedOut => break,
                GateOutcome::GaveUp => {
                    self.helped = true;
                    break;
                }
            }
        }

        for dementor in remaining {
            ctx.remove(dementor);
        }
        debug!(attempt = self.attempts, banished, helped = self.helped, "Confrontation over");
        Ok(self.helped || repelled(banished))
    }
}

#[async_trait]
impl PhaseScript for PatronusPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::PATRONUS
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.narrate_all(patronus::INTRO).await?;

        self.gather_memories(ctx).await?;
        self.pray(ctx).await?;

        while !self.confront(ctx).await? {
            ctx.narrate(&patronus::RETRY).await?;
        }
        ctx.hide_counter();

        let stag = ctx
            .load_model(
                STAG_MODEL,
                Placement::at(CENTER).with_scale(0.1),
                Shape::Figure,
                Color::SILVER,
            )
            .await?;
        ctx.animate(
            stag,
            Tween::scale_uniform(1.0, Duration::from_millis(1500)).with_easing(Easing::BackOut),
        )
        .await?;
        hover(ctx, stag, CENTER);
        celebrate(ctx, CENTER);

        ctx.narrate(&patronus::VICTORY).await?;
        open_portal(ctx).await?;

        ctx.finish(payload(json!({
            "memories": self.memories,
            "prayer": self.prayer,
            "attempts": self.attempts,
            "helped": self.helped,
        })))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_repels() {
        assert!(!repelled(2));
        assert!(repelled(3));
        assert!(repelled(patronus::DEMENTOR_COUNT));
    }

    #[test]
    fn test_ring_positions_are_distinct() {
        let first = ring_position(0, 5);
        let second = ring_position(1, 5);
        assert!((first - CENTER).length() > RING_RADIUS - 0.1);
        assert!(first.distance(second) > 1.0);
    }
}
