//! Frame loop for effects.
//!
//! [`EffectFlow`] owns the [`Scene`] and the [`Context`] and drives the
//! per-frame cycle. Spawning is the only place that suspends; a frame itself
//! is synchronous and infallible.
//!
//! # Lifecycle Flow
//!
//! Every frame follows this pattern:
//! 1. Advance the game clock by `dt`
//! 2. Update every entity in scene order (animation, visibility, lifetimes)
//! 3. Sweep entities that requested removal, together with what they own
//! 4. Collect `draw` and `draw_after` of every visible entity into batches
//! 5. Submit opaque, transparent (back to front), then after calls to the
//!    [`Renderer`]

use instant::{Duration, Instant};

use crate::{
    context::Context,
    data_structures::{
        composite::CompositeBuilder,
        entity::{EffectBuilder, EntityId},
        scene_graph::Scene,
    },
    error::Result,
    render::{FrameBatches, Renderer},
    resources::AssetLoader,
};

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub updated: usize,
    pub removed: usize,
    /// Entities that produced at least one draw call.
    pub drawn: usize,
    pub culled: usize,
    pub draw_calls: usize,
}

#[derive(Debug, Default)]
pub struct EffectFlow {
    scene: Scene,
    ctx: Context,
    last_tick: Option<Instant>,
}

impl EffectFlow {
    pub fn new(ctx: Context) -> Self {
        Self {
            scene: Scene::new(),
            ctx,
            last_tick: None,
        }
    }

    /// Changes the context at runtime, e.g. to move the camera or install a
    /// custom cull test.
    pub fn configure(&mut self, configure: impl FnOnce(&mut Context)) {
        configure(&mut self.ctx);
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Loads `builder` and inserts it. Nothing is inserted on failure.
    pub async fn spawn<L: AssetLoader + ?Sized>(
        &mut self,
        builder: EffectBuilder,
        loader: &L,
    ) -> Result<EntityId> {
        let effect = builder.load(loader).await?;
        Ok(self.scene.add(effect))
    }

    /// Loads a composite; its children enter the scene while it spawns and
    /// the composite itself follows once all of them are in.
    pub async fn spawn_composite<L: AssetLoader + ?Sized>(
        &mut self,
        builder: CompositeBuilder,
        loader: &L,
    ) -> Result<EntityId> {
        let composite = builder.load(loader, &mut self.scene).await?;
        Ok(self.scene.add(composite))
    }

    /// Runs one frame with an explicit `dt`.
    pub fn frame(&mut self, dt: Duration, renderer: &mut dyn Renderer) -> FrameStats {
        self.ctx.time.advance(dt);

        let updated = self.scene.update_all(&self.ctx, dt);
        let removed = self.scene.sweep().len();

        let mut batches = FrameBatches::new();
        let mut drawn = 0;
        let mut culled = 0;
        for entity in self.scene.iter() {
            if !entity.is_visible() {
                culled += 1;
                continue;
            }
            let main = entity.draw(&self.ctx);
            let after = entity.draw_after(&self.ctx);
            if main.is_none() && after.is_none() {
                continue;
            }
            drawn += 1;
            batches.push_main(main);
            batches.push_after(after);
        }
        batches.sort_transparent(self.ctx.camera.position);
        let draw_calls = batches.submit(renderer);

        let stats = FrameStats {
            updated,
            removed,
            drawn,
            culled,
            draw_calls,
        };
        log::trace!("frame {}: {:?}", self.ctx.time.frame, stats);
        stats
    }

    /// Runs one frame, measuring `dt` since the previous tick. The first
    /// tick has a zero `dt`.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> FrameStats {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        self.frame(dt, renderer)
    }
}

/// Installs `env_logger` natively (honouring `RUST_LOG`) or `console_log`
/// on wasm32. Calling it twice is harmless.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("logger already initialised: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("logger already initialised: {}", e);
        };
    }
}
