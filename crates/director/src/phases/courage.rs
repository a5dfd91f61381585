use std::time::Duration;

use async_trait::async_trait;
use aurora_core::content::courage::{self, HuntObject};
use aurora_core::content::Line;
use aurora_core::PhaseId;
use serde_json::json;
use tracing::debug;

use super::{celebrate, open_portal, payload, set_stage, vec3};
use crate::animation::{Easing, Tween};
use crate::core::{PhaseContext, PhaseScript};
use crate::error::PhaseResult;
use crate::interaction::{GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::surfaces::{Color, Counter, ObjectHandle, Placement, Shape, ToastKind};

/// Hunt for the five hidden objects of the common room.
#[derive(Debug, Default)]
pub struct CouragePhase {
    found: Vec<&'static str>,
    gave_up: bool,
}

impl CouragePhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self) -> Counter {
        Counter::new("Objects", self.found.len() as u32).of(courage::OBJECTS.len() as u32)
    }

    async fn reveal(
        &mut self,
        ctx: &PhaseContext,
        handle: ObjectHandle,
        object: &'static HuntObject,
    ) -> PhaseResult<()> {
        self.found.push(object.key);
        debug!(object = object.key, found = self.found.len(), "Object found");

        ctx.counter(&self.progress());
        ctx.sfx("collect");
        celebrate(ctx, vec3(object.position));
        ctx.animate(
            handle,
            Tween::scale_uniform(1.4, Duration::from_millis(400)).with_easing(Easing::BackOut),
        )
        .await?;

        ctx.narrate(
            &Line::new(object.narration, 4000)
                .with_verse(object.verse)
                .with_voice(object.voice),
        )
        .await
    }
}

#[async_trait]
impl PhaseScript for CouragePhase {
    fn phase(&self) -> PhaseId {
        PhaseId::COURAGE
    }

    async fn initialize(&mut self, ctx: &PhaseContext) -> PhaseResult<()> {
        set_stage(ctx);
        ctx.narrate_all(courage::INTRO).await?;

        let mut targets = Vec::with_capacity(courage::OBJECTS.len());
        for object in courage::OBJECTS {
            let handle = ctx
                .load_model(
                    object.model,
                    Placement::at(vec3(object.position)),
                    Shape::Box,
                    Color::GOLD,
                )
                .await?;
            ctx.animate_detached(
                handle,
                Tween::intensity(1.5, Duration::from_millis(1500))
                    .with_yoyo()
                    .forever(),
            );
            targets.push((handle, object));
        }
        let handles: Vec<ObjectHandle> = targets.iter().map(|(handle, _)| *handle).collect();

        ctx.counter(&self.progress());
        ctx.show_text(courage::HINT, None);

        let policy =
            GatePolicy::timeout(Duration::from_secs(courage::HUNT_HINT_AFTER_SECS)).with_give_up();

        while self.found.len() < courage::OBJECTS.len() {
            match ctx.gate(Interaction::object_hunt(handles.clone()), policy).await? {
                GateOutcome::Responded(PlayerInput::Click(clicked)) => {
                    let Some((handle, object)) = targets.iter().find(|(h, _)| *h == clicked) else {
                        continue;
                    };
                    if self.found.contains(&object.key) {
                        ctx.toast(courage::ALREADY_FOUND, ToastKind::Info);
                        continue;
                    }
                    self.reveal(ctx, *handle, *object).await?;
                }
                GateOutcome::Responded(_) => {}
                GateOutcome::TimedOut => ctx.show_text(courage::TIMEOUT_HINT, None),
                GateOutcome::GaveUp => {
                    self.gave_up = true;
                    ctx.show_text(courage::REVEAL_REST, None);
                    for (handle, object) in &targets {
                        if !self.found.contains(&object.key) {
                            self.found.push(object.key);
                            celebrate(ctx, vec3(object.position));
                            ctx.animate_detached(
                                *handle,
                                Tween::scale_uniform(1.4, Duration::from_millis(400)),
                            );
                        }
                    }
                    ctx.counter(&self.progress());
                    ctx.pause(3000).await?;
                }
            }
        }

        ctx.hide_text();
        ctx.hide_counter();
        ctx.narrate(&courage::SAINT_MESSAGE).await?;
        open_portal(ctx).await?;
        ctx.narrate(&courage::PORTAL).await?;

        ctx.finish(payload(json!({
            "objectsFound": self.found,
            "gaveUp": self.gave_up,
        })))
        .await
    }
}
