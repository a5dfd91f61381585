// Property tweens. A tween only describes the motion; the resource ledger
// drives it frame by frame against a `TweenTarget`.

use std::fmt;
use std::time::Duration;

use glam::Vec3;

use super::easing::{ease_vec3, Easing};

/// Animatable property of a scene object or overlay.
///
/// Scalar properties (`Opacity`, `Intensity`) travel in the `x` lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Position,
    Rotation,
    Scale,
    Opacity,
    Intensity,
}

impl Property {
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Position => "position",
            Property::Rotation => "rotation",
            Property::Scale => "scale",
            Property::Opacity => "opacity",
            Property::Intensity => "intensity",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Property::Opacity | Property::Intensity)
    }
}

/// How often a tween replays after its first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    Forever,
}

impl Repeat {
    fn passes(&self) -> Option<u64> {
        match self {
            Repeat::Once => Some(1),
            Repeat::Times(n) => Some(u64::from(*n) + 1),
            Repeat::Forever => None,
        }
    }
}

/// Something a tween can read from and write to.
pub trait TweenTarget: Send + Sync {
    fn current(&self, property: Property) -> Vec3;
    fn apply(&self, property: Property, value: Vec3);
}

pub struct Tween {
    pub property: Property,
    /// Start value. `None` reads the target's current value when the tween starts.
    pub from: Option<Vec3>,
    pub to: Vec3,
    pub duration: Duration,
    pub easing: Easing,
    pub repeat: Repeat,
    /// Reverse direction on every other pass.
    pub yoyo: bool,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl Tween {
    pub fn to(property: Property, to: Vec3, duration: Duration) -> Self {
        Self {
            property,
            from: None,
            to,
            duration,
            easing: Easing::default(),
            repeat: Repeat::Once,
            yoyo: false,
            on_complete: None,
        }
    }

    pub fn from_to(property: Property, from: Vec3, to: Vec3, duration: Duration) -> Self {
        Self {
            from: Some(from),
            ..Self::to(property, to, duration)
        }
    }

    pub fn position(to: Vec3, duration: Duration) -> Self {
        Self::to(Property::Position, to, duration)
    }

    pub fn rotation(to: Vec3, duration: Duration) -> Self {
        Self::to(Property::Rotation, to, duration)
    }

    pub fn scale_uniform(to: f32, duration: Duration) -> Self {
        Self::to(Property::Scale, Vec3::splat(to), duration)
    }

    pub fn opacity(to: f32, duration: Duration) -> Self {
        Self::to(Property::Opacity, Vec3::new(to, 0.0, 0.0), duration)
    }

    pub fn intensity(to: f32, duration: Duration) -> Self {
        Self::to(Property::Intensity, Vec3::new(to, 0.0, 0.0), duration)
    }

    // -- Builder methods --

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn forever(self) -> Self {
        self.with_repeat(Repeat::Forever)
    }

    pub fn with_yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    pub fn with_on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Stretches the duration by `pace`; 0.5 plays twice as fast.
    pub fn scaled(mut self, pace: f32) -> Self {
        self.duration = crate::director::scale_duration(self.duration, pace);
        self
    }

    pub fn take_on_complete(&mut self) -> Option<Box<dyn FnOnce() + Send>> {
        self.on_complete.take()
    }

    pub fn is_infinite(&self) -> bool {
        self.repeat == Repeat::Forever
    }

    /// Value at `elapsed` when starting from `from`, and whether the tween is done.
    pub fn sample(&self, from: Vec3, elapsed: Duration) -> (Vec3, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }

        let ratio = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let pass = ratio.floor() as u64;

        if let Some(passes) = self.repeat.passes() {
            if pass >= passes {
                let last_reversed = self.yoyo && (passes - 1) % 2 == 1;
                let end = if last_reversed { from } else { self.to };
                return (end, true);
            }
        }

        let mut t = ratio.fract() as f32;
        if self.yoyo && pass % 2 == 1 {
            t = 1.0 - t;
        }
        (ease_vec3(from, self.to, t, self.easing), false)
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("property", &self.property)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("repeat", &self.repeat)
            .field("yoyo", &self.yoyo)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_single_pass() {
        let tween = Tween::opacity(1.0, ms(1000)).with_easing(Easing::Linear);

        let (value, done) = tween.sample(Vec3::ZERO, ms(500));
        assert!((value.x - 0.5).abs() < 1e-4);
        assert!(!done);

        let (value, done) = tween.sample(Vec3::ZERO, ms(1000));
        assert_eq!(value.x, 1.0);
        assert!(done);
    }

    #[test]
    fn test_zero_duration_snaps() {
        let tween = Tween::scale_uniform(2.0, Duration::ZERO);
        assert_eq!(tween.sample(Vec3::ONE, Duration::ZERO), (Vec3::splat(2.0), true));
    }

    #[test]
    fn test_repeat_times_counts_extra_passes() {
        let tween = Tween::opacity(1.0, ms(100)).with_repeat(Repeat::Times(2));
        assert!(!tween.sample(Vec3::ZERO, ms(250)).1);
        assert!(tween.sample(Vec3::ZERO, ms(300)).1);
    }

    #[test]
    fn test_yoyo_reverses_odd_passes() {
        let tween = Tween::opacity(1.0, ms(100))
            .with_easing(Easing::Linear)
            .with_repeat(Repeat::Times(1))
            .with_yoyo();

        let (value, _) = tween.sample(Vec3::ZERO, ms(125));
        assert!((value.x - 0.75).abs() < 1e-4);

        let (value, done) = tween.sample(Vec3::ZERO, ms(200));
        assert_eq!(value.x, 0.0);
        assert!(done);
    }

    #[test]
    fn test_forever_never_finishes() {
        let tween = Tween::rotation(Vec3::Y, ms(10)).forever();
        assert!(tween.is_infinite());
        assert!(!tween.sample(Vec3::ZERO, Duration::from_secs(3600)).1);
    }

    #[test]
    fn test_scaled_duration() {
        let tween = Tween::position(Vec3::X, ms(1000)).scaled(0.5);
        assert_eq!(tween.duration, ms(500));
    }

    #[test]
    fn test_on_complete_taken_once() {
        let mut tween = Tween::opacity(0.0, ms(10)).with_on_complete(|| {});
        assert!(tween.take_on_complete().is_some());
        assert!(tween.take_on_complete().is_none());
    }
}
