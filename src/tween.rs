//! Timed interpolation with easing.
//!
//! A [`Tween`] interpolates a scalar or vector from one value to another over
//! a duration. Instead of invoking callbacks, a [`TweenGroup`] reports what
//! happened during a tick as [`TweenEvent`]s tagged with a caller-chosen
//! target key, and the owner applies them to its own state.
//!
//! # Example
//!
//! ```
//! use plexus::tween::{Easing, Tween, TweenEvent, TweenGroup};
//!
//! #[derive(Clone, Copy, Debug, PartialEq)]
//! enum Target { Opacity }
//!
//! let mut group = TweenGroup::new();
//! group.add(Tween::scalar(Target::Opacity, 0.0, 1.0, 2.0).easing(Easing::Linear), 0.0);
//!
//! let mut events = Vec::new();
//! group.update(1.0, &mut events);
//! assert!(matches!(events[0], TweenEvent::Update { value, .. } if value.as_scalar() == Some(0.5)));
//!
//! events.clear();
//! group.update(2.0, &mut events);
//! assert!(matches!(events[1], TweenEvent::Complete { target: Target::Opacity, .. }));
//! assert!(group.is_empty());
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

/// Easing curves mapping linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    SinusoidalIn,
    SinusoidalOut,
    SinusoidalInOut,
}

impl Easing {
    /// Apply the curve to `t`, which is clamped to `[0, 1]` first.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::SinusoidalIn => 1.0 - (t * FRAC_PI_2).cos(),
            Easing::SinusoidalOut => (t * FRAC_PI_2).sin(),
            Easing::SinusoidalInOut => 0.5 * (1.0 - (PI * t).cos()),
        }
    }
}

/// Value carried by a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenValue {
    Scalar(f32),
    Vector(Vec3),
}

impl TweenValue {
    /// Interpolate toward `to` by `t`. Mismatched kinds snap to `to`.
    pub fn lerp(self, to: TweenValue, t: f32) -> TweenValue {
        match (self, to) {
            (TweenValue::Scalar(a), TweenValue::Scalar(b)) => TweenValue::Scalar(a + (b - a) * t),
            (TweenValue::Vector(a), TweenValue::Vector(b)) => TweenValue::Vector(a.lerp(b, t)),
            _ => to,
        }
    }

    pub fn as_scalar(self) -> Option<f32> {
        match self {
            TweenValue::Scalar(v) => Some(v),
            TweenValue::Vector(_) => None,
        }
    }

    pub fn as_vector(self) -> Option<Vec3> {
        match self {
            TweenValue::Vector(v) => Some(v),
            TweenValue::Scalar(_) => None,
        }
    }
}

impl From<f32> for TweenValue {
    fn from(v: f32) -> Self {
        TweenValue::Scalar(v)
    }
}

impl From<Vec3> for TweenValue {
    fn from(v: Vec3) -> Self {
        TweenValue::Vector(v)
    }
}

/// Identifier assigned by [`TweenGroup::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// An interpolation task: `from` → `to` over `duration` seconds.
#[derive(Debug, Clone)]
pub struct Tween<K> {
    target: K,
    from: TweenValue,
    to: TweenValue,
    duration: f32,
    easing: Easing,
}

impl<K: Copy> Tween<K> {
    /// Linear tween of a scalar.
    pub fn scalar(target: K, from: f32, to: f32, duration: f32) -> Self {
        Self::new(target, from.into(), to.into(), duration)
    }

    /// Linear tween of a vector.
    pub fn vector(target: K, from: Vec3, to: Vec3, duration: f32) -> Self {
        Self::new(target, from.into(), to.into(), duration)
    }

    fn new(target: K, from: TweenValue, to: TweenValue, duration: f32) -> Self {
        Self {
            target,
            from,
            to,
            duration: duration.max(0.0),
            easing: Easing::Linear,
        }
    }

    /// Set the easing curve.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn target(&self) -> K {
        self.target
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Linear progress at `elapsed` seconds since start.
    fn progress(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Eased value at `elapsed` seconds since start.
    pub fn value_at(&self, elapsed: f32) -> TweenValue {
        let t = self.easing.apply(self.progress(elapsed));
        self.from.lerp(self.to, t)
    }
}

/// Something that happened to a tween during [`TweenGroup::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenEvent<K> {
    /// The tween advanced and its target should take `value`.
    Update {
        id: TweenId,
        target: K,
        value: TweenValue,
    },
    /// The tween reached its end value and was removed from the group.
    Complete { id: TweenId, target: K },
}

#[derive(Debug, Clone)]
struct ActiveTween<K> {
    id: TweenId,
    start: f32,
    tween: Tween<K>,
}

/// A set of live tweens advanced together, once per frame.
#[derive(Debug, Clone)]
pub struct TweenGroup<K> {
    tweens: Vec<ActiveTween<K>>,
    next_id: u64,
}

impl<K: Copy> TweenGroup<K> {
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            next_id: 0,
        }
    }

    /// Start `tween` at time `now` (seconds) and add it to the group.
    pub fn add(&mut self, tween: Tween<K>, now: f32) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.push(ActiveTween {
            id,
            start: now,
            tween,
        });
        id
    }

    /// Advance every live tween to time `now`, in insertion order.
    ///
    /// Each tween reports an `Update`; a tween that reached its end also
    /// reports `Complete` right after and is removed. Events are appended to
    /// `events`.
    pub fn update(&mut self, now: f32, events: &mut Vec<TweenEvent<K>>) {
        self.tweens.retain(|active| {
            let elapsed = now - active.start;
            let target = active.tween.target;
            events.push(TweenEvent::Update {
                id: active.id,
                target,
                value: active.tween.value_at(elapsed),
            });

            let finished = active.tween.progress(elapsed) >= 1.0;
            if finished {
                events.push(TweenEvent::Complete { id: active.id, target });
            }
            !finished
        });
    }

    /// Drop every tween without reporting anything.
    pub fn remove_all(&mut self) {
        self.tweens.clear();
    }

    /// Number of live tweens.
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

impl<K: Copy> Default for TweenGroup<K> {
    fn default() -> Self {
        Self::new()
    }
}
