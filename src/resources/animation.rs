//! Per-effect animation behaviors.
//!
//! A [`Behavior`] is a pure function of the total game time. It gets `&self`
//! and the absolute time, never a per-frame delta, so there is no hidden
//! accumulator: replaying a timestamp always reproduces the same colour,
//! rotation and frame regardless of the frame rate that led there.

use cgmath::{Deg, Rotation3, Vector3};
use instant::Duration;

use crate::data_structures::instance::Instance;

/// The parts of an effect an animation is allowed to touch.
///
/// `transform` holds the effect's build-time transform on entry, so
/// behaviors compose with it instead of replacing it.
#[derive(Debug)]
pub struct AnimationTarget<'a> {
    pub light_color: &'a mut Vector3<f32>,
    pub transform: &'a mut Instance,
    pub frame: &'a mut u32,
}

pub trait Behavior {
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>);
}

impl<F> Behavior for F
where
    F: Fn(Duration, &mut AnimationTarget<'_>),
{
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>) {
        self(time, target)
    }
}

/// Sinusoidal brightness: `((sin(t * k) + 1) * a + b) * tint` with `t` in
/// milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub k: f32,
    pub a: f32,
    pub b: f32,
    pub tint: Vector3<f32>,
}

impl Pulse {
    pub fn new(k: f32, a: f32, b: f32, tint: Vector3<f32>) -> Self {
        Self { k, a, b, tint }
    }

    pub fn luminance(&self, time: Duration) -> f32 {
        let t = time.as_secs_f64() * 1000.0;
        ((t * self.k as f64).sin() as f32 + 1.0) * self.a + self.b
    }

    pub fn light_color(&self, time: Duration) -> Vector3<f32> {
        self.tint * self.luminance(time)
    }
}

impl Behavior for Pulse {
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>) {
        *target.light_color = self.light_color(time);
    }
}

/// Continuous rotation around `axis` at `degrees_per_second`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    pub axis: Vector3<f32>,
    pub degrees_per_second: f32,
}

impl Spin {
    pub fn around_y(degrees_per_second: f32) -> Self {
        Self {
            axis: Vector3::unit_y(),
            degrees_per_second,
        }
    }

    pub fn angle(&self, time: Duration) -> Deg<f32> {
        let degrees = (time.as_secs_f64() * self.degrees_per_second as f64) % 360.0;
        Deg(degrees as f32)
    }
}

impl Behavior for Spin {
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>) {
        target.transform.rotation =
            target.transform.rotation * cgmath::Quaternion::from_axis_angle(self.axis, self.angle(time));
    }
}

/// Steps through `frames` animation frames at `fps`, looping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCycle {
    pub frames: u32,
    pub fps: u32,
}

impl FrameCycle {
    pub fn frame(&self, time: Duration) -> u32 {
        if self.frames == 0 {
            return 0;
        }
        let elapsed_frames = time.as_millis() * self.fps as u128 / 1000;
        (elapsed_frames % self.frames as u128) as u32
    }
}

impl Behavior for FrameCycle {
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>) {
        *target.frame = self.frame(time);
    }
}

/// Runs several behaviors in order on the same target.
pub struct Chain(pub Vec<Box<dyn Behavior>>);

impl Behavior for Chain {
    fn animate(&self, time: Duration, target: &mut AnimationTarget<'_>) {
        for behavior in &self.0 {
            behavior.animate(time, target);
        }
    }
}
