//! The active entity set.
//!
//! A [`Scene`] keeps its members in insertion order, which is also the order
//! of the Update and Draw passes. Every entry may name an owner; removing an
//! entity removes everything it owns, transitively, in the same call.
//!
//! Entities never remove themselves directly. They raise
//! [`SceneEntity::is_pending_removal`] during Update and the frame loop calls
//! [`Scene::sweep`] once the Update pass is over.

use instant::Duration;

use crate::{
    context::Context,
    data_structures::entity::{EntityId, SceneEntity},
};

struct Entry {
    owner: Option<EntityId>,
    entity: Box<dyn SceneEntity>,
}

#[derive(Default)]
pub struct Scene {
    entries: Vec<Entry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: impl SceneEntity) -> EntityId {
        self.insert(None, Box::new(entity))
    }

    /// Adds `entity` as a child of `owner`. The owner does not need to be in
    /// the scene yet.
    pub fn add_owned(&mut self, owner: EntityId, entity: impl SceneEntity) -> EntityId {
        self.insert(Some(owner), Box::new(entity))
    }

    pub fn add_boxed(&mut self, entity: Box<dyn SceneEntity>) -> EntityId {
        self.insert(None, entity)
    }

    fn insert(&mut self, owner: Option<EntityId>, entity: Box<dyn SceneEntity>) -> EntityId {
        let id = entity.id();
        log::trace!("scene: add {} {} (owner {:?})", entity.name(), id, owner);
        self.entries.push(Entry { owner, entity });
        id
    }

    /// Removes `id` and everything it owns. Returns how many entries left.
    pub fn remove(&mut self, id: EntityId) -> usize {
        self.remove_cascade(id).len()
    }

    fn remove_cascade(&mut self, id: EntityId) -> Vec<EntityId> {
        let mut doomed = vec![id];
        let mut next = 0;
        while next < doomed.len() {
            let parent = doomed[next];
            let owned: Vec<EntityId> = self
                .entries
                .iter()
                .filter(|entry| entry.owner == Some(parent))
                .map(|entry| entry.entity.id())
                .filter(|child| !doomed.contains(child))
                .collect();
            doomed.extend(owned);
            next += 1;
        }

        let mut removed = Vec::new();
        self.entries.retain_mut(|entry| {
            let id = entry.entity.id();
            if !doomed.contains(&id) {
                return true;
            }
            entry.entity.on_removed();
            removed.push(id);
            false
        });
        removed
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.iter().any(|entry| entry.entity.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member ids in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.iter().map(|entry| entry.entity.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SceneEntity> {
        self.entries.iter().map(|entry| entry.entity.as_ref())
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn SceneEntity> {
        self.iter().find(|entity| entity.id() == id)
    }

    /// Looks up `id` and downcasts it to a concrete entity type.
    pub fn get_as<T: SceneEntity>(&self, id: EntityId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn owner_of(&self, id: EntityId) -> Option<EntityId> {
        self.entries
            .iter()
            .find(|entry| entry.entity.id() == id)
            .and_then(|entry| entry.owner)
    }

    /// Direct children of `owner` in insertion order.
    pub fn owned_by(&self, owner: EntityId) -> Vec<EntityId> {
        self.entries
            .iter()
            .filter(|entry| entry.owner == Some(owner))
            .map(|entry| entry.entity.id())
            .collect()
    }

    /// Runs the Update pass in scene order. Returns the number of updates.
    pub fn update_all(&mut self, ctx: &Context, dt: Duration) -> usize {
        for entry in &mut self.entries {
            entry.entity.update(ctx, dt);
        }
        self.entries.len()
    }

    /// Drops every entity that requested removal, cascading to what it owns.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let pending: Vec<EntityId> = self
            .entries
            .iter()
            .filter(|entry| entry.entity.is_pending_removal())
            .map(|entry| entry.entity.id())
            .collect();

        let mut removed = Vec::new();
        for id in pending {
            // Already gone when an earlier pending owner took it along
            if removed.contains(&id) {
                continue;
            }
            let gone = self.remove_cascade(id);
            log::debug!("scene: {} expired, {} entries removed", id, gone.len());
            removed.extend(gone);
        }
        removed
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| (entry.entity.id(), entry.entity.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use crate::{data_structures::instance::Instance, render::Render};

    use super::*;

    struct Marker {
        id: EntityId,
        transform: Instance,
        expire: bool,
        removed: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl Marker {
        fn new(removed: &std::rc::Rc<std::cell::Cell<u32>>) -> Self {
            Self {
                id: EntityId::next(),
                transform: Instance::new(),
                expire: false,
                removed: removed.clone(),
            }
        }
    }

    impl SceneEntity for Marker {
        fn id(&self) -> EntityId {
            self.id
        }
        fn name(&self) -> &str {
            "marker"
        }
        fn transform(&self) -> &Instance {
            &self.transform
        }
        fn update(&mut self, _ctx: &Context, _dt: Duration) {}
        fn is_visible(&self) -> bool {
            true
        }
        fn draw(&self, _ctx: &Context) -> Render<'_> {
            Render::None
        }
        fn is_pending_removal(&self) -> bool {
            self.expire
        }
        fn on_removed(&mut self) {
            self.removed.set(self.removed.get() + 1);
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn removal_cascades_through_owners() {
        let removed = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut scene = Scene::new();
        let root = scene.add(Marker::new(&removed));
        let child = scene.add_owned(root, Marker::new(&removed));
        let grandchild = scene.add_owned(child, Marker::new(&removed));
        let bystander = scene.add(Marker::new(&removed));

        assert_eq!(scene.owned_by(root), vec![child]);
        assert_eq!(scene.owner_of(grandchild), Some(child));
        assert_eq!(scene.remove(root), 3);
        assert_eq!(scene.ids(), vec![bystander]);
        assert_eq!(removed.get(), 3);
        assert_eq!(scene.remove(root), 0);
    }

    #[test]
    fn sweep_only_takes_pending_entries() {
        let removed = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut scene = Scene::new();
        let mut doomed = Marker::new(&removed);
        doomed.expire = true;
        let doomed = scene.add(doomed);
        let child = scene.add_owned(doomed, Marker::new(&removed));
        let keep = scene.add(Marker::new(&removed));

        let gone = scene.sweep();
        assert_eq!(gone, vec![doomed, child]);
        assert!(scene.contains(keep));
        assert_eq!(scene.len(), 1);
        assert!(scene.get_as::<Marker>(keep).is_some());
    }
}
