use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::loyalty;
use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::json;

use super::{celebrate, open_portal, payload, set_stage};
use crate::animation::{Easing, Tween};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::{Color, Placement, Shape, ToastKind};

const TREE_POSITION: Vec3 = Vec3::new(0.0, 0.0, -4.0);

/// Ruth's story put back in order, then a choice about a friend.
#[derive(Debug, Default)]
pub struct LoyaltyPhase {
    order_attempts: u32,
    order_revealed: bool,
    choice: Option<usize>,
}

/// Whether `order` (indices into the shown events) is the story's true order.
pub fn is_true_order(order: &[usize]) -> bool {
    order.len() == loyalty::STORY_EVENTS.len()
        && order
            .iter()
            .enumerate()
            .all(|(slot, event)| loyalty::STORY_EVENTS[*event].position == slot)
}

fn true_order_labels() -> Vec<&'static str> {
    let mut events: Vec<_> = loyalty::STORY_EVENTS.iter().collect();
    events.sort_by_key(|event| event.position);
    events.into_iter().map(|event| event.label).collect()
}

impl LoyaltyPhase {
    pub fn new() -> Self {
        Self::default()
    }

    async fn order_story(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        let labels = loyalty::STORY_EVENTS.iter().map(|event| event.label);

        loop {
            let gate = Interaction::ordering(labels.clone());
            match ctx.gate(gate, GatePolicy::give_up()).await? {
                GateOutcome::Responded(PlayerInput::Order(order)) => {
                    if order.len() < loyalty::STORY_EVENTS.len() {
                        ctx.toast(loyalty::INCOMPLETE_ORDER, ToastKind::Info);
                        continue;
                    }
                    self.order_attempts += 1;
                    if is_true_order(&order) {
                        celebrate(ctx, TREE_POSITION);
                        return Ok(());
                    }
                    ctx.sfx("wrong");
                    ctx.toast(loyalty::WRONG_ORDER, ToastKind::Error);
                }
                GateOutcome::Responded(_) => {}
                GateOutcome::TimedOut | GateOutcome::GaveUp => {
                    self.order_revealed = true;
                    let story = true_order_labels().join(" / ");
                    ctx.show_text(loyalty::ORDER_REVEALED, Some(&story));
                    ctx.pause(5000).await?;
                    ctx.hide_text();
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl PhaseScript for LoyaltyPhase {
    fn phase(&self) -> PhaseId {
        PhaseId::LOYALTY
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.narrate_all(loyalty::INTRO).await?;

        self.order_story(ctx).await?;

        if let Some(tree) = ctx.placeholder(
            Shape::Cone,
            Color::GREEN,
            Placement::at(TREE_POSITION).with_scale(0.1),
        ) {
            ctx.animate(
                tree,
                Tween::scale_uniform(1.5, Duration::from_millis(2000)).with_easing(Easing::ElasticOut),
            )
            .await?;
        }
        ctx.narrate(&loyalty::TREE_GROWS).await?;

        let choice = &loyalty::CHOICE;
        ctx.show_text(choice.question, None);
        let gate = Interaction::choice(choice.options.iter().copied());
        if let GateOutcome::Responded(PlayerInput::Select(index)) =
            ctx.gate(gate, GatePolicy::give_up()).await?
        {
            self.choice = Some(index);
        }
        ctx.hide_text();
        ctx.narrate(&choice.explanation).await?;

        open_portal(ctx).await?;
        ctx.finish(payload(json!({
            "orderAttempts": self.order_attempts,
            "orderRevealed": self.order_revealed,
            "choice": self.choice.map(|index| choice.options[index]),
        })))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_order() {
        assert!(is_true_order(&[1, 3, 0, 4, 2]));
        assert!(!is_true_order(&[0, 1, 2, 3, 4]));
        assert!(!is_true_order(&[1, 3, 0]));
    }

    #[test]
    fn test_true_order_labels_start_in_moab() {
        let labels = true_order_labels();
        assert_eq!(labels.len(), 5);
        assert!(labels[0].contains("Moab"));
        assert!(labels[4].contains("Boaz redeems"));
    }
}
