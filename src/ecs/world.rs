//! World and object management
//!
//! The [`ObjectManager`] owns entity storage, update/render order and the
//! pending-start queue. The [`World`] wraps it and adds the name index and
//! per-frame dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::component::{Component, ComponentSlot, FrameContext, RenderContext};
use super::entity::{Entity, EntityId};
use crate::assets::AssetRegistry;
use crate::input::Input;
use crate::renderer::RenderSurface;

/// Storage slot; the generation is bumped every time the slot is vacated
#[derive(Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Entity storage with ordering and a pending-start queue
#[derive(Debug, Default)]
pub struct ObjectManager {
    slots: Vec<Slot>,
    /// Indices of vacant slots
    free: Vec<u32>,
    /// Update/render order
    order: Vec<EntityId>,
    /// Entities whose components have not started yet
    pending_start: Vec<EntityId>,
}

impl ObjectManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty entity
    pub fn create_object(&mut self) -> EntityId {
        self.register(Entity::new())
    }

    /// Adopt an externally constructed entity
    pub fn register(&mut self, entity: Entity) -> EntityId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entity: Some(entity),
                });
                EntityId::new(index, 0)
            }
        };

        self.order.push(id);
        self.pending_start.push(id);
        id
    }

    /// Remove an entity from storage, order and the pending-start queue
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let entity = slot.entity.take()?;

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.order.retain(|e| *e != id);
        self.pending_start.retain(|e| *e != id);
        Some(entity)
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_mut())
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Swap with the previous entity in order. No-op at the front.
    pub fn move_up(&mut self, id: EntityId) -> bool {
        match self.order.iter().position(|e| *e == id) {
            Some(pos) if pos > 0 => {
                self.order.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap with the next entity in order. No-op at the back.
    pub fn move_down(&mut self, id: EntityId) -> bool {
        match self.order.iter().position(|e| *e == id) {
            Some(pos) if pos + 1 < self.order.len() => {
                self.order.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Live entities in update/render order
    #[must_use]
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Entities still waiting for their start hooks
    #[must_use]
    pub fn pending_start(&self) -> &[EntityId] {
        &self.pending_start
    }

    fn take_pending(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending_start)
    }

    /// Remove every entity, returning them in order
    pub fn drain(&mut self) -> Vec<Entity> {
        let order = std::mem::take(&mut self.order);
        let entities = order
            .into_iter()
            .filter_map(|id| self.slots.get_mut(id.index() as usize)?.entity.take())
            .collect();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.is_none() && !self.free.contains(&(index as u32)) {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.pending_start.clear();
        entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Container of a scene's entities
#[derive(Debug, Default)]
pub struct World {
    objects: ObjectManager,
    /// Name index; the last entity given a name wins
    names: FxHashMap<String, EntityId>,
}

impl World {
    /// Create a new empty world
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anonymous entity
    pub fn create_object(&mut self) -> EntityId {
        self.objects.create_object()
    }

    /// Adopt an externally constructed entity, indexing its name if it has one
    pub fn register(&mut self, entity: Entity) -> EntityId {
        let name = entity.name.clone();
        let id = self.objects.register(entity);
        if let Some(name) = name {
            self.index_name(name, id);
        }
        id
    }

    /// Remove an entity, shutting down its components.
    ///
    /// Other entities holding its id observe it as gone on next lookup.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(mut entity) = self.objects.remove(id) else {
            return false;
        };

        if let Some(name) = entity.name.as_deref()
            && self.names.get(name) == Some(&id)
        {
            self.names.remove(name);
        }
        entity.components.shutdown_all();
        true
    }

    /// Set or clear an entity's name.
    ///
    /// A name already used by another entity is silently taken over.
    pub fn set_name(&mut self, id: EntityId, name: Option<String>) -> bool {
        let Some(entity) = self.objects.get_mut(id) else {
            return false;
        };

        let old = std::mem::replace(&mut entity.name, name.clone());
        if let Some(old) = old
            && self.names.get(&old) == Some(&id)
        {
            self.names.remove(&old);
        }
        if let Some(name) = name {
            self.index_name(name, id);
        }
        true
    }

    fn index_name(&mut self, name: String, id: EntityId) {
        if let Some(previous) = self.names.insert(name.clone(), id)
            && previous != id
        {
            log::debug!("Entity name '{name}' moved from {previous} to {id}");
        }
    }

    /// Resolve a name through the index
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.objects.get_mut(id)
    }

    /// Check if an id still refers to a live entity
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.objects.contains(id)
    }

    /// Attach a component to an entity
    pub fn attach<T: Component>(&mut self, id: EntityId, component: T) -> Option<Rc<RefCell<T>>> {
        let entity = self.objects.get_mut(id)?;
        Some(entity.components.attach(component))
    }

    /// Attach an already wrapped component
    pub fn attach_slot(&mut self, id: EntityId, slot: ComponentSlot) -> bool {
        match self.objects.get_mut(id) {
            Some(entity) => {
                entity.components.attach_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Typed component lookup
    #[must_use]
    pub fn component<T: Component>(&self, id: EntityId) -> Option<Rc<RefCell<T>>> {
        self.objects.get(id)?.components.get::<T>()
    }

    pub fn move_up(&mut self, id: EntityId) -> bool {
        self.objects.move_up(id)
    }

    pub fn move_down(&mut self, id: EntityId) -> bool {
        self.objects.move_down(id)
    }

    /// Live entities in update/render order
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        self.objects.order()
    }

    /// Underlying object manager
    #[must_use]
    pub fn objects(&self) -> &ObjectManager {
        &self.objects
    }

    /// Run `start` on every component of newly added entities.
    ///
    /// Runs once per frame before [`Self::tick`], so every sibling has been
    /// initialized before any tick sees it.
    pub fn start_pending(&mut self, input: &Input) {
        let pending = self.objects.take_pending();
        for id in pending {
            self.dispatch(id, |component, world| {
                component.start(&mut FrameContext {
                    owner: id,
                    world,
                    input,
                    dt: 0.0,
                });
            });
        }
    }

    /// Start pending entities, then tick every entity in order
    pub fn tick(&mut self, input: &Input, dt: f32) {
        self.start_pending(input);

        for id in self.objects.order().to_vec() {
            self.dispatch(id, |component, world| {
                component.tick(&mut FrameContext {
                    owner: id,
                    world,
                    input,
                    dt,
                });
            });
        }
    }

    /// Render every entity in order
    pub fn render(&self, assets: &AssetRegistry, surface: &mut dyn RenderSurface) {
        for &id in self.objects.order() {
            self.dispatch(id, |component, world| {
                component.render(&mut RenderContext {
                    owner: id,
                    world,
                    assets,
                    surface: &mut *surface,
                });
            });
        }
    }

    fn dispatch(&self, id: EntityId, mut hook: impl FnMut(&mut dyn Component, &World)) {
        let Some(entity) = self.objects.get(id) else {
            return;
        };

        for handle in entity.components.handles() {
            match handle.try_borrow_mut() {
                Ok(mut component) => hook(&mut *component, self),
                Err(_) => log::warn!("Component on {id} is already borrowed; skipping hook"),
            }
        }
    }

    /// Remove every entity, shutting down all components
    pub fn clear(&mut self) {
        for mut entity in self.objects.drain() {
            entity.components.shutdown_all();
        }
        self.names.clear();
    }

    /// Get the number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the world is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records hook calls into a shared log
    struct Probe {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Probe {
        fn type_name(&self) -> &'static str {
            "Probe"
        }

        fn start(&mut self, _ctx: &mut FrameContext<'_>) {
            self.log.borrow_mut().push(format!("start:{}", self.label));
        }

        fn tick(&mut self, _ctx: &mut FrameContext<'_>) {
            self.log.borrow_mut().push(format!("tick:{}", self.label));
        }

        fn shutdown(&mut self) {
            self.log.borrow_mut().push(format!("shutdown:{}", self.label));
        }
    }

    /// Holds a weak reference to another entity
    struct Follower {
        target: EntityId,
        seen_alive: Rc<Cell<bool>>,
    }

    impl Component for Follower {
        fn type_name(&self) -> &'static str {
            "Follower"
        }

        fn tick(&mut self, ctx: &mut FrameContext<'_>) {
            self.seen_alive.set(ctx.world.get(self.target).is_some());
        }
    }

    fn probe(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Probe {
        Probe {
            label,
            log: Rc::clone(log),
        }
    }

    #[test]
    fn test_create_and_remove() {
        let mut world = World::new();
        let a = world.create_object();
        let b = world.create_object();
        assert_eq!(world.len(), 2);
        assert_eq!(world.entities(), &[a, b]);

        assert!(world.remove(a));
        assert!(!world.contains(a));
        assert!(!world.remove(a));
        assert_eq!(world.entities(), &[b]);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut world = World::new();
        let a = world.create_object();
        world.remove(a);
        let b = world.create_object();

        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());
    }

    #[test]
    fn test_start_runs_once_before_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let id = world.create_object();
        world.attach(id, probe("a", &log));

        let input = Input::new();
        world.tick(&input, 0.016);
        world.tick(&input, 0.016);

        assert_eq!(*log.borrow(), vec!["start:a", "tick:a", "tick:a"]);
        assert!(world.objects().pending_start().is_empty());
    }

    #[test]
    fn test_removed_before_start_never_starts() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let id = world.create_object();
        world.attach(id, probe("gone", &log));
        world.remove(id);

        world.tick(&Input::new(), 0.016);
        assert_eq!(*log.borrow(), vec!["shutdown:gone"]);
    }

    #[test]
    fn test_weak_reference_observes_removal() {
        let mut world = World::new();
        let target = world.create_object();
        let holder = world.create_object();
        let seen_alive = Rc::new(Cell::new(false));
        world.attach(
            holder,
            Follower {
                target,
                seen_alive: Rc::clone(&seen_alive),
            },
        );

        let input = Input::new();
        world.tick(&input, 0.016);
        assert!(seen_alive.get());

        world.remove(target);
        // Reuse the slot so a raw index would now point at something else
        world.create_object();
        world.tick(&input, 0.016);
        assert!(!seen_alive.get());
    }

    #[test]
    fn test_name_collision_last_wins() {
        let mut world = World::new();
        let first = world.create_object();
        let second = world.create_object();

        world.set_name(first, Some("boss".into()));
        world.set_name(second, Some("boss".into()));

        assert_eq!(world.find_by_name("boss"), Some(second));
        assert!(world.contains(first));
        assert_eq!(world.get(first).unwrap().name(), Some("boss"));

        // Clearing the earlier entity's name leaves the index alone
        world.set_name(first, None);
        assert_eq!(world.find_by_name("boss"), Some(second));

        world.set_name(second, None);
        assert_eq!(world.find_by_name("boss"), None);
    }

    #[test]
    fn test_remove_unregisters_name() {
        let mut world = World::new();
        let id = world.register(Entity::named("door"));
        assert_eq!(world.find_by_name("door"), Some(id));

        world.remove(id);
        assert_eq!(world.find_by_name("door"), None);
    }

    #[test]
    fn test_move_up_down() {
        let mut world = World::new();
        let a = world.create_object();
        let b = world.create_object();
        let c = world.create_object();

        assert!(!world.move_up(a));
        assert!(world.move_down(a));
        assert_eq!(world.entities(), &[b, a, c]);
        assert!(world.move_up(c));
        assert_eq!(world.entities(), &[b, c, a]);
        assert!(!world.move_down(a));
    }

    #[test]
    fn test_clear_shuts_down_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let a = world.register(Entity::named("a"));
        world.attach(a, probe("a", &log));
        let b = world.create_object();
        world.attach(b, probe("b", &log));

        world.clear();
        assert!(world.is_empty());
        assert!(world.find_by_name("a").is_none());
        assert!(!world.contains(a));
        assert_eq!(*log.borrow(), vec!["shutdown:a", "shutdown:b"]);

        // Slots are reusable with new generations
        let c = world.create_object();
        assert_ne!(c, a);
        assert_ne!(c, b);
    }
}
