//! flow-fx
//!
//! Transient visual effects (flares, fire, light auras, thunder, composite
//! bursts) for instancing-oriented wgpu engines, native and WASM. Each
//! effect is a short-lived scene entity with a fixed render recipe, a
//! visibility policy and an optional time-driven behavior. The crate decides
//! what is drawn, in which pass and with which state; the host renderer
//! owns the device and pipelines.
//!
//! High-level modules
//! - `context`: game clock, camera and the cull test handed to effects
//! - `data_structures`: recipes, render state, entities, composites, scene
//! - `effects`: ready-made effect presets
//! - `error`: the error taxonomy of effect loading
//! - `flow`: the frame loop (update, removal sweep, draw, draw after)
//! - `resources`: asset loaders, decoders and animation behaviors
//! - `render`: draw composition and pass batching
//!

pub mod context;
pub mod data_structures;
pub mod effects;
pub mod error;
pub mod flow;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use context::{Camera, Context, CullTest};
pub use data_structures::{
    composite::{CompositeBuilder, CompositeEffect},
    entity::{DrawHooks, EffectBuilder, EffectEntity, EntityId, SceneEntity},
    recipe::{BlendMode, DepthMode, RenderRecipe, VisibilityPolicy},
    scene_graph::Scene,
};
pub use error::{EffectError, Result};
pub use flow::{EffectFlow, FrameStats};
pub use render::{DrawCall, Pass, Render, Renderer};
pub use resources::{Asset, AssetLoader, FileLoader, MemoryLoader};
