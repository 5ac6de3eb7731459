//! Ready-made effects.
//!
//! Each preset hardcodes its asset path and recipe and only takes a world
//! position. Spawn them through [`crate::flow::EffectFlow::spawn`] and
//! [`crate::flow::EffectFlow::spawn_composite`], or load them by hand.

use cgmath::Vector3;
use instant::Duration;

use crate::{
    data_structures::{
        composite::{ChildSpec, CompositeBuilder},
        entity::{DrawHooks, EffectBuilder},
        recipe::{BlendMode, DepthMode, MeshBlend, RenderRecipe, VisibilityPolicy},
    },
    resources::animation::{Chain, FrameCycle, Pulse, Spin},
};

pub const FLARE_TEXTURE: &str = "effects/flare01.jpg";
pub const FIRE_MODEL: &str = "effects/fire.obj";
pub const LIGHT_AURA_MODEL: &str = "effects/light_aura.obj";
pub const THUNDER_TEXTURE: &str = "effects/thunder.png";

/// Pulse of the flare light colour. `t` is in milliseconds.
pub const FLARE_PULSE: Pulse = Pulse {
    k: 0.039,
    a: 0.2,
    b: 0.6,
    tint: Vector3 {
        x: 0.7,
        y: 0.7,
        z: 0.7,
    },
};

/// Over-bright, slightly blue flicker of the thunder sprite.
pub const THUNDER_PULSE: Pulse = Pulse {
    k: 0.5,
    a: 0.6,
    b: 0.8,
    tint: Vector3 {
        x: 1.0,
        y: 1.0,
        z: 1.2,
    },
};

pub const LEVEL_UP_LIFETIME: Duration = Duration::from_millis(3500);
pub const LEVEL_UP_FLARES: usize = 30;
pub const LEVEL_UP_AURA_OFFSET: Vector3<f32> = Vector3 {
    x: 0.0,
    y: 0.5,
    z: 0.0,
};
pub const LEVEL_UP_FLARE_OFFSET: Vector3<f32> = Vector3 {
    x: 0.0,
    y: 2.0,
    z: 0.0,
};

const FIRE_FRAMES: FrameCycle = FrameCycle { frames: 16, fps: 24 };

/// Pulsing additive sprite.
pub fn flare(position: Vector3<f32>) -> EffectBuilder {
    EffectBuilder::new("flare", FLARE_TEXTURE, position)
        .recipe(RenderRecipe::additive().with_light(FLARE_PULSE.light_color(Duration::ZERO)))
        .behavior(FLARE_PULSE)
}

/// Frame-cycled additive flame model.
pub fn fire(position: Vector3<f32>) -> EffectBuilder {
    EffectBuilder::new("fire", FIRE_MODEL, position)
        .recipe(RenderRecipe::additive().with_light(Vector3::new(1.0, 0.6, 0.2)))
        .behavior(FIRE_FRAMES)
}

/// Spinning aura: alpha-blended base plus an additive glow over the same mesh.
pub fn light_aura(position: Vector3<f32>) -> EffectBuilder {
    EffectBuilder::new("light_aura", LIGHT_AURA_MODEL, position)
        .recipe(
            RenderRecipe::alpha_blended()
                .with_light(Vector3::new(1.0, 0.95, 0.6))
                .with_mesh_blend(MeshBlend {
                    channel: 1,
                    state: BlendMode::Additive,
                    intensity: 0.6,
                }),
        )
        .visibility(VisibilityPolicy::AlwaysVisible)
        .behavior(Spin::around_y(45.0))
}

/// Over-bright flicker composited on top of the scene.
pub fn thunder(position: Vector3<f32>) -> EffectBuilder {
    EffectBuilder::new("thunder", THUNDER_TEXTURE, position)
        .recipe(
            RenderRecipe::additive()
                .with_depth(DepthMode::Custom {
                    write_enabled: false,
                    test_enabled: false,
                })
                .with_light(THUNDER_PULSE.light_color(Duration::ZERO)),
        )
        .visibility(VisibilityPolicy::AlwaysVisible)
        .hooks(DrawHooks::DrawAfter)
        .behavior(Chain(vec![
            Box::new(THUNDER_PULSE),
            Box::new(FrameCycle { frames: 4, fps: 20 }),
        ]))
        .scale(3.0)
}

/// Aura anchor plus a ring of flares above it, gone after 3.5 seconds.
pub fn level_up(position: Vector3<f32>) -> CompositeBuilder {
    CompositeBuilder::new(
        "level_up",
        position,
        LEVEL_UP_LIFETIME,
        ChildSpec::new(LEVEL_UP_AURA_OFFSET, light_aura),
    )
    .secondaries(ChildSpec::new(LEVEL_UP_FLARE_OFFSET, flare), LEVEL_UP_FLARES)
}
