//! Easing curves and property tweens driven by the resource ledger.

mod easing;
mod tween;

pub use easing::{ease, ease_vec3, lerp, Easing};
pub use tween::{Property, Repeat, Tween, TweenTarget};
