//! Effect entities.
//!
//! An effect starts life as an [`EffectBuilder`]: a name, a fixed asset path,
//! a [`RenderRecipe`], a [`VisibilityPolicy`] and optionally a [`Behavior`].
//! Loading the builder yields an [`EffectEntity`], the only form a scene
//! accepts. A half-loaded effect cannot be expressed.
//!
//! Every scene member implements [`SceneEntity`], the capability interface
//! the frame loop drives: update, visibility, the two draw hooks and the
//! pending-removal flag.

use std::{
    any::Any,
    fmt::{self, Debug},
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use cgmath::Vector3;
use instant::Duration;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        recipe::{RenderRecipe, VisibilityPolicy},
        render_state::{Layer, RenderState},
    },
    error::Result,
    render::{DrawCall, Render},
    resources::{
        Asset, AssetLoader, Bounds,
        animation::{AnimationTarget, Behavior},
    },
};

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a scene member. Unique for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which draw hooks an entity takes part in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawHooks {
    #[default]
    Draw,
    /// Draws in the after pass only; `draw` is a no-op.
    DrawAfter,
    Both,
}

impl DrawHooks {
    pub fn uses_draw(self) -> bool {
        matches!(self, DrawHooks::Draw | DrawHooks::Both)
    }

    pub fn uses_draw_after(self) -> bool {
        matches!(self, DrawHooks::DrawAfter | DrawHooks::Both)
    }
}

/// Capability interface of everything living in a [`crate::data_structures::scene_graph::Scene`].
///
/// Update and draw are infallible. An entity only ever mutates its own
/// fields; leaving the scene is requested through
/// [`is_pending_removal`](Self::is_pending_removal), which the scene checks
/// after the update pass.
pub trait SceneEntity: Any {
    fn id(&self) -> EntityId;

    fn name(&self) -> &str;

    fn transform(&self) -> &Instance;

    fn update(&mut self, ctx: &Context, dt: Duration);

    /// Result of the last visibility evaluation.
    fn is_visible(&self) -> bool;

    fn hooks(&self) -> DrawHooks {
        DrawHooks::Draw
    }

    fn draw(&self, ctx: &Context) -> Render<'_>;

    fn draw_after(&self, _ctx: &Context) -> Render<'_> {
        Render::None
    }

    fn is_pending_removal(&self) -> bool {
        false
    }

    /// Called once by the scene right before the entity is dropped.
    fn on_removed(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

impl Debug for dyn SceneEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEntity")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// An effect that has not been loaded yet.
pub struct EffectBuilder {
    name: &'static str,
    asset_path: &'static str,
    transform: Instance,
    recipe: RenderRecipe,
    visibility: VisibilityPolicy,
    hooks: DrawHooks,
    behavior: Option<Box<dyn Behavior>>,
}

impl EffectBuilder {
    pub fn new(name: &'static str, asset_path: &'static str, position: Vector3<f32>) -> Self {
        Self {
            name,
            asset_path,
            transform: Instance::from(position),
            recipe: RenderRecipe::default(),
            visibility: VisibilityPolicy::default(),
            hooks: DrawHooks::default(),
            behavior: None,
        }
    }

    pub fn recipe(mut self, recipe: RenderRecipe) -> Self {
        self.recipe = recipe;
        self
    }

    pub fn visibility(mut self, visibility: VisibilityPolicy) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn hooks(mut self, hooks: DrawHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.transform = self.transform.with_scale(scale);
        self
    }

    pub fn transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn asset_path(&self) -> &'static str {
        self.asset_path
    }

    /// Acquires the asset and applies the recipe to a fresh render state.
    ///
    /// On failure the builder is consumed and nothing is left behind.
    pub async fn load<L: AssetLoader + ?Sized>(self, loader: &L) -> Result<EffectEntity> {
        let asset = loader.prepare(self.asset_path).await?;
        let state = RenderState::from_recipe(&self.recipe);
        let id = EntityId::next();
        log::debug!("loaded effect {} {} from {}", self.name, id, self.asset_path);
        Ok(EffectEntity {
            id,
            name: self.name,
            asset_path: self.asset_path,
            local_bounds: asset.bounds(),
            asset,
            base: self.transform,
            transform: self.transform,
            recipe: self.recipe,
            visibility: self.visibility,
            hooks: self.hooks,
            behavior: self.behavior,
            state,
            frame: 0,
            in_view: true,
        })
    }
}

impl Debug for EffectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBuilder")
            .field("name", &self.name)
            .field("asset_path", &self.asset_path)
            .field("recipe", &self.recipe)
            .field("visibility", &self.visibility)
            .field("hooks", &self.hooks)
            .field("animated", &self.behavior.is_some())
            .finish()
    }
}

/// A loaded effect, ready to live in a scene.
pub struct EffectEntity {
    id: EntityId,
    name: &'static str,
    asset_path: &'static str,
    asset: Arc<Asset>,
    local_bounds: Bounds,
    /// Transform given at build time; behaviors start from it every update.
    base: Instance,
    transform: Instance,
    recipe: RenderRecipe,
    visibility: VisibilityPolicy,
    hooks: DrawHooks,
    behavior: Option<Box<dyn Behavior>>,
    state: RenderState,
    frame: u32,
    in_view: bool,
}

impl EffectEntity {
    pub fn asset_path(&self) -> &'static str {
        self.asset_path
    }

    pub fn asset(&self) -> &Arc<Asset> {
        &self.asset
    }

    pub fn recipe(&self) -> &RenderRecipe {
        &self.recipe
    }

    pub fn visibility(&self) -> VisibilityPolicy {
        self.visibility
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Bounding sphere in world space.
    pub fn bounds(&self) -> Bounds {
        self.local_bounds.transformed(&self.transform)
    }

    fn animate(&mut self, time: Duration) {
        let Some(behavior) = &self.behavior else {
            return;
        };
        let mut light_color = self.recipe.light_color();
        self.transform = self.base;
        behavior.animate(
            time,
            &mut AnimationTarget {
                light_color: &mut light_color,
                transform: &mut self.transform,
                frame: &mut self.frame,
            },
        );
        if light_color != self.recipe.light_color() {
            self.recipe.set_light_color(light_color);
            self.state.set_light_color(light_color);
        }
    }

    fn call(&self, layer: Layer) -> DrawCall<'_> {
        DrawCall {
            entity: self.id,
            layer,
            asset: &self.asset,
            state: &self.state,
            blend: self.state.blend_for(layer),
            uniform: self.state.uniform(layer),
            instance: self.transform.to_raw(),
            position: self.transform.position,
            frame: self.frame,
        }
    }

    fn render(&self) -> Render<'_> {
        let primary = if self.state.is_opaque() {
            Render::Opaque(self.call(Layer::Primary))
        } else {
            Render::Transparent(self.call(Layer::Primary))
        };
        match self.state.secondary {
            Some(secondary) => Render::Composed(vec![
                primary,
                Render::Transparent(self.call(Layer::Secondary {
                    channel: secondary.channel,
                })),
            ]),
            None => primary,
        }
    }
}

impl SceneEntity for EffectEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn transform(&self) -> &Instance {
        &self.transform
    }

    fn update(&mut self, ctx: &Context, _dt: Duration) {
        self.animate(ctx.time.total);
        self.in_view = match self.visibility {
            VisibilityPolicy::AlwaysVisible => true,
            VisibilityPolicy::Automatic => {
                !ctx.cull_test().is_out_of_view(self.transform.position, &self.bounds())
            }
        };
    }

    fn is_visible(&self) -> bool {
        self.in_view
    }

    fn hooks(&self) -> DrawHooks {
        self.hooks
    }

    fn draw(&self, _ctx: &Context) -> Render<'_> {
        if self.hooks.uses_draw() {
            self.render()
        } else {
            Render::None
        }
    }

    fn draw_after(&self, _ctx: &Context) -> Render<'_> {
        if self.hooks.uses_draw_after() {
            self.render()
        } else {
            Render::None
        }
    }

    fn on_removed(&mut self) {
        log::debug!("effect {} {} removed", self.name, self.id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Debug for EffectEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectEntity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("asset_path", &self.asset_path)
            .field("position", &self.transform.position)
            .field("visibility", &self.visibility)
            .field("in_view", &self.in_view)
            .finish()
    }
}
