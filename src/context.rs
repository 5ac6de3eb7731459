//! Per-frame context handed to every effect.
//!
//! The [`Context`] carries the clock (total game time and last delta) and
//! the camera used for visibility. It is read-only for effects; the frame
//! loop advances it and callers reconfigure it through
//! [`crate::flow::EffectFlow::configure`].

use cgmath::{Deg, InnerSpace, Rad, Vector3};
use instant::Duration;

use crate::resources::Bounds;

/// Generic frustum/distance visibility check.
pub trait CullTest {
    /// `bounds` is already in world space; `position` is the effect origin.
    fn is_out_of_view(&self, position: Vector3<f32>, bounds: &Bounds) -> bool;
}

/// Game clock as seen by effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTime {
    /// Total game time since the flow started.
    pub total: Duration,
    /// Time between the previous frame and this one.
    pub delta: Duration,
    pub frame: u64,
}

impl FrameTime {
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.total += dt;
        self.delta = dt;
        self.frame += 1;
    }
}

/// Perspective camera reduced to what culling needs.
///
/// The frustum is approximated by a cone around `forward` whose half angle
/// covers the wider of the vertical and horizontal field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vector3<f32>, forward: Vector3<f32>) -> Self {
        Self {
            position,
            forward,
            ..Default::default()
        }
    }

    fn half_angle(&self) -> Rad<f32> {
        let half_y: Rad<f32> = (self.fovy / 2.0).into();
        let half_x = Rad((half_y.0.tan() * self.aspect).atan());
        if half_x > half_y { half_x } else { half_y }
    }
}

impl Default for Camera {
    // right/left, height, forward/backward like the engine's default camera
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 30.0, 20.0),
            forward: Vector3::new(0.0, -0.866, -0.5),
            fovy: Deg(45.0),
            aspect: 16.0 / 9.0,
            far: 500.0,
        }
    }
}

impl CullTest for Camera {
    fn is_out_of_view(&self, _position: Vector3<f32>, bounds: &Bounds) -> bool {
        let to_center = bounds.center - self.position;
        let distance = to_center.magnitude();
        if distance - bounds.radius > self.far {
            return true;
        }
        // The camera sits inside the sphere
        if distance <= bounds.radius || self.forward.magnitude2() == 0.0 {
            return false;
        }
        let slack = Rad((bounds.radius / distance).asin());
        self.forward.angle(to_center) > self.half_angle() + slack
    }
}

pub struct Context {
    pub time: FrameTime,
    pub camera: Camera,
    cull_override: Option<Box<dyn CullTest>>,
}

impl Context {
    pub fn new(camera: Camera) -> Self {
        Self {
            time: FrameTime::default(),
            camera,
            cull_override: None,
        }
    }

    /// Replaces the camera cull test, e.g. with an occlusion-aware one.
    pub fn set_cull_test(&mut self, cull: Box<dyn CullTest>) {
        self.cull_override = Some(cull);
    }

    pub fn reset_cull_test(&mut self) {
        self.cull_override = None;
    }

    pub fn cull_test(&self) -> &dyn CullTest {
        match &self.cull_override {
            Some(cull) => cull.as_ref(),
            None => &self.camera,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("time", &self.time)
            .field("camera", &self.camera)
            .field("custom_cull", &self.cull_override.is_some())
            .finish()
    }
}
