//! Composite effects: a timed group of child effects.
//!
//! Spawning happens in [`CompositeBuilder::load`]. Children are loaded one
//! after another and enter the scene, owned by the composite, as soon as
//! their own load completes. The resulting [`CompositeEffect`] draws nothing
//! itself; it counts down its lifetime and then asks to be removed, which
//! takes every child along in the same sweep.

use std::{any::Any, iter};

use cgmath::Vector3;
use instant::Duration;

use crate::{
    context::Context,
    data_structures::{
        entity::{EffectBuilder, EntityId, SceneEntity},
        instance::Instance,
        scene_graph::Scene,
    },
    error::{EffectError, Result},
    render::Render,
    resources::AssetLoader,
};

/// One kind of child: where it sits relative to the composite and how to
/// build it at that world position.
#[derive(Clone, Copy, Debug)]
pub struct ChildSpec {
    pub offset: Vector3<f32>,
    pub build: fn(Vector3<f32>) -> EffectBuilder,
}

impl ChildSpec {
    pub fn new(offset: Vector3<f32>, build: fn(Vector3<f32>) -> EffectBuilder) -> Self {
        Self { offset, build }
    }
}

/// Lifecycle of a composite after spawning.
///
/// Spawning itself is the [`CompositeBuilder`]; a `CompositeEffect` only
/// exists once every child is in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeState {
    Active,
    /// Lifetime ran out; removal is pending.
    Expiring,
    Removed,
}

#[derive(Debug)]
pub struct CompositeBuilder {
    name: &'static str,
    position: Vector3<f32>,
    lifetime: Duration,
    anchor: ChildSpec,
    secondary: Option<ChildSpec>,
    secondary_count: usize,
}

impl CompositeBuilder {
    pub fn new(
        name: &'static str,
        position: Vector3<f32>,
        lifetime: Duration,
        anchor: ChildSpec,
    ) -> Self {
        Self {
            name,
            position,
            lifetime,
            anchor,
            secondary: None,
            secondary_count: 0,
        }
    }

    /// Spawns `count` copies of `spec` after the anchor.
    pub fn secondaries(mut self, spec: ChildSpec, count: usize) -> Self {
        self.secondary = Some(spec);
        self.secondary_count = count;
        self
    }

    pub fn child_count(&self) -> usize {
        1 + self.secondary.map_or(0, |_| self.secondary_count)
    }

    /// Loads the anchor, then every secondary, inserting each into `scene`.
    ///
    /// When a child fails, later children are never constructed and the ones
    /// already inserted are removed again. The failure comes back as
    /// [`EffectError::SpawnSequence`].
    pub async fn load<L: AssetLoader + ?Sized>(
        self,
        loader: &L,
        scene: &mut Scene,
    ) -> Result<CompositeEffect> {
        let id = EntityId::next();
        let origin = Instance::from(self.position);
        let specs = iter::once(&self.anchor).chain(
            self.secondary
                .iter()
                .flat_map(|spec| iter::repeat_n(spec, self.secondary_count)),
        );

        let mut children = Vec::with_capacity(self.child_count());
        for (index, spec) in specs.enumerate() {
            let position = (&origin * &Instance::from(spec.offset)).position;
            let builder = (spec.build)(position);
            let child = builder.name();
            match builder.load(loader).await {
                Ok(entity) => children.push(scene.add_owned(id, entity)),
                Err(source) => {
                    let rolled_back: usize = children.iter().map(|c| scene.remove(*c)).sum();
                    log::warn!(
                        "composite {} {}: child #{} ({}) failed, rolled back {} entities",
                        self.name,
                        id,
                        index,
                        child,
                        rolled_back
                    );
                    return Err(EffectError::SpawnSequence {
                        effect: self.name,
                        index,
                        child,
                        source: Box::new(source),
                    });
                }
            }
        }

        log::debug!(
            "composite {} {} spawned {} children, lifetime {:?}",
            self.name,
            id,
            children.len(),
            self.lifetime
        );
        Ok(CompositeEffect {
            id,
            name: self.name,
            transform: origin,
            lifetime: self.lifetime,
            remaining: self.lifetime,
            children,
            state: CompositeState::Active,
        })
    }
}

#[derive(Debug)]
pub struct CompositeEffect {
    id: EntityId,
    name: &'static str,
    transform: Instance,
    lifetime: Duration,
    remaining: Duration,
    children: Vec<EntityId>,
    state: CompositeState,
}

impl CompositeEffect {
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Every child spawned, anchor first, then the secondaries in spawn
    /// order. Ids stay listed after a child is removed from the scene by
    /// hand; use [`CompositeEffect::live_children`] for the current ones.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Spawned children still owned by this composite in `scene`, in spawn
    /// order.
    pub fn live_children(&self, scene: &Scene) -> Vec<EntityId> {
        self.children
            .iter()
            .copied()
            .filter(|child| scene.owner_of(*child) == Some(self.id))
            .collect()
    }

    pub fn state(&self) -> CompositeState {
        self.state
    }
}

impl SceneEntity for CompositeEffect {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn transform(&self) -> &Instance {
        &self.transform
    }

    fn update(&mut self, _ctx: &Context, dt: Duration) {
        if self.state != CompositeState::Active {
            return;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            log::debug!("composite {} {} expired", self.name, self.id);
            self.state = CompositeState::Expiring;
        }
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn draw(&self, _ctx: &Context) -> Render<'_> {
        Render::None
    }

    fn is_pending_removal(&self) -> bool {
        self.state == CompositeState::Expiring
    }

    fn on_removed(&mut self) {
        self.state = CompositeState::Removed;
        self.children.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite(lifetime: Duration) -> CompositeEffect {
        CompositeEffect {
            id: EntityId::next(),
            name: "test",
            transform: Instance::new(),
            lifetime,
            remaining: lifetime,
            children: Vec::new(),
            state: CompositeState::Active,
        }
    }

    #[test]
    fn lifetime_only_decreases_and_expires_exactly() {
        let ctx = Context::default();
        let mut effect = composite(Duration::from_millis(300));
        effect.update(&ctx, Duration::from_millis(100));
        effect.update(&ctx, Duration::from_millis(100));
        assert_eq!(effect.remaining(), Duration::from_millis(100));
        assert!(!effect.is_pending_removal());
        effect.update(&ctx, Duration::from_millis(100));
        assert_eq!(effect.state(), CompositeState::Expiring);
        assert!(effect.is_pending_removal());

        effect.update(&ctx, Duration::from_secs(5));
        assert_eq!(effect.remaining(), Duration::ZERO);
        effect.on_removed();
        assert_eq!(effect.state(), CompositeState::Removed);
        assert!(!effect.is_pending_removal());
    }

    #[test]
    fn overshooting_the_lifetime_saturates() {
        let mut effect = composite(Duration::from_millis(50));
        effect.update(&Context::default(), Duration::from_millis(80));
        assert_eq!(effect.remaining(), Duration::ZERO);
        assert!(effect.is_pending_removal());
    }
}
