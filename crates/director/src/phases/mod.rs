//! The nine phase scripts and the registry that maps ids to them.

mod courage;
mod darkness;
mod faith;
mod grace;
mod intro;
mod loyalty;
mod patronus;
mod temptation;
mod wisdom;

use std::f32::consts::TAU;
use std::time::Duration;

use aurora_core::PhaseId;
use glam::Vec3;
use serde_json::{Map, Value};

pub use courage::CouragePhase;
pub use darkness::DarkNightPhase;
pub use faith::FaithPhase;
pub use grace::GracePhase;
pub use intro::LetterPhase;
pub use loyalty::LoyaltyPhase;
pub use patronus::PatronusPhase;
pub use temptation::{Maze, TemptationPhase};
pub use wisdom::WisdomPhase;

use crate::animation::{Easing, Property, Tween};
use crate::core::{PhaseContext, PhaseRegistry};
use crate::error::PhaseResult;
use crate::surfaces::{Background, Color, ObjectHandle, Placement, Shape};

impl PhaseRegistry {
    /// Every phase of the journey.
    pub fn standard() -> Self {
        PhaseRegistry::new()
            .with(PhaseId::LETTER, || Box::new(LetterPhase::new()))
            .with(PhaseId::COURAGE, || Box::new(CouragePhase::new()))
            .with(PhaseId::WISDOM, || Box::new(WisdomPhase::new()))
            .with(PhaseId::LOYALTY, || Box::new(LoyaltyPhase::new()))
            .with(PhaseId::FAITH, || Box::new(FaithPhase::new()))
            .with(PhaseId::PATRONUS, || Box::new(PatronusPhase::new()))
            .with(PhaseId::TEMPTATION, || Box::new(TemptationPhase::new()))
            .with(PhaseId::DARK_NIGHT, || Box::new(DarkNightPhase::new()))
            .with(PhaseId::GRACE, || Box::new(GracePhase::new()))
    }
}

fn vec3(position: [f32; 3]) -> Vec3 {
    Vec3::from_array(position)
}

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

/// Background and music from the catalog entry.
fn set_stage(ctx: &PhaseContext) {
    let info = ctx.info();
    ctx.set_background(Background::Texture(info.background.to_string()));
    ctx.music(info.music);
}

fn celebrate(ctx: &PhaseContext, position: Vec3) {
    ctx.sfx("success");
    ctx.particles(position, 30, Color::GOLD, Duration::from_millis(2000));
}

/// Spinning ring that opens before the phase hands over.
async fn open_portal(ctx: &PhaseContext) -> PhaseResult<()> {
    let placement = Placement::at(Vec3::new(0.0, 1.0, -3.0)).with_scale(0.1);
    let Some(portal) = ctx.placeholder(Shape::Torus, Color::GOLD, placement) else {
        return Ok(());
    };

    ctx.sfx("portal");
    ctx.animate(
        portal,
        Tween::scale_uniform(1.0, Duration::from_millis(1500)).with_easing(Easing::BackOut),
    )
    .await?;
    ctx.animate_detached(
        portal,
        Tween::rotation(Vec3::new(0.0, 0.0, TAU), Duration::from_secs(4))
            .with_easing(Easing::Linear)
            .forever(),
    );
    Ok(())
}

/// Slow up-and-down drift for hovering models.
fn hover(ctx: &PhaseContext, handle: ObjectHandle, base: Vec3) {
    ctx.animate_detached(
        handle,
        Tween::from_to(
            Property::Position,
            base,
            base + Vec3::new(0.0, 0.15, 0.0),
            Duration::from_millis(2000),
        )
        .with_easing(Easing::SineInOut)
        .with_yoyo()
        .forever(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_every_phase() {
        let registry = PhaseRegistry::standard();
        for phase in PhaseId::all() {
            let script = registry.create(phase).expect("registered");
            assert_eq!(script.phase(), phase);
        }
    }

    #[test]
    fn test_payload_from_object_only() {
        assert_eq!(payload(serde_json::json!({"a": 1})).len(), 1);
        assert!(payload(serde_json::json!([1, 2])).is_empty());
    }
}
