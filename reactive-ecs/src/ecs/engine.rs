// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! The engine: entity registry, family cache and system pipeline
//!
//! The engine listens to every registered entity and broadcasts component
//! changes to all live families, so node lists handed out by
//! [`Engine::get_node_list`] are always current. Systems run in ascending
//! priority order on every [`Engine::update`].

use crate::config::EngineConfig;
use crate::ecs::family::{AnyFamily, Family};
use crate::ecs::scheduler::{Scheduler, SystemRef};
use crate::ecs::signal::{Signal, SlotId};
use crate::ecs::snapshot::WorldSnapshot;
use crate::ecs::{Entity, EntityId, Node, NodeList, System, SystemId};
use log::{debug, trace, warn};
use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Subscriptions the engine holds on one registered entity
struct Registration {
    entity: Entity,
    component_added: SlotId,
    component_removed: SlotId,
    child_added: SlotId,
    child_removed: SlotId,
    destroyed: Option<SlotId>,
}

impl Registration {
    fn disconnect(&self) {
        self.entity.component_added().disconnect(self.component_added);
        self.entity.component_removed().disconnect(self.component_removed);
        self.entity.child_added().disconnect(self.child_added);
        self.entity.child_removed().disconnect(self.child_removed);
        if let Some(slot) = self.destroyed {
            self.entity.destroyed().disconnect(slot);
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    entities: RefCell<HashMap<EntityId, Registration>>,
    families: RefCell<HashMap<TypeId, Rc<dyn AnyFamily>>>,
    scheduler: RefCell<Scheduler>,
    updating: Cell<bool>,
    retiring: RefCell<Vec<SystemRef>>,
    update_complete: Signal<f64>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        for registration in self.entities.get_mut().values() {
            registration.disconnect();
        }
    }
}

/// Top-level registry composing entities, families and systems
///
/// `Engine` is a shared handle: clones refer to the same engine. Systems
/// receive the engine in their lifecycle hooks and should keep node lists
/// rather than the engine itself.
///
/// # Examples
///
/// ```
/// use reactive_ecs::define_node;
/// use reactive_ecs::ecs::{Component, Engine, Entity};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// define_node! {
///     struct HealthNode {
///         health: Health,
///     }
/// }
///
/// let engine = Engine::new();
/// let nodes = engine.get_node_list::<HealthNode>();
///
/// let entity = Entity::new();
/// engine.add_entity(&entity);
/// assert!(nodes.is_empty());
///
/// entity.add_component(Health(3));
/// assert_eq!(nodes.len(), 1);
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let capacity = config.entity_capacity;
        Engine {
            inner: Rc::new(EngineInner {
                config,
                entities: RefCell::new(HashMap::with_capacity(capacity)),
                families: RefCell::new(HashMap::new()),
                scheduler: RefCell::new(Scheduler::new()),
                updating: Cell::new(false),
                retiring: RefCell::new(Vec::new()),
                update_complete: Signal::new(),
            }),
        }
    }

    fn upgrade(weak: &Weak<EngineInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Engine { inner })
    }

    /// The configuration the engine was created with
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ---- entities ----

    /// Register an entity and, eagerly, its whole subtree
    ///
    /// Registering an entity twice is a no-op. Destroyed entities are
    /// refused. Returns true if the entity was newly registered.
    pub fn add_entity(&self, entity: &Entity) -> bool {
        if self.has_entity(entity) {
            return false;
        }

        if entity.is_destroyed() {
            warn!("refusing to register destroyed {}", entity.id());
            return false;
        }

        let registration = self.subscribe(entity);
        self.inner
            .entities
            .borrow_mut()
            .insert(entity.id(), registration);
        trace!("registered {}", entity.id());

        for family in self.families() {
            family.add_entity(entity);
        }

        for child in entity.children() {
            self.add_entity(&child);
        }
        true
    }

    /// Unregister an entity and its whole subtree
    ///
    /// Unknown entities are ignored. Returns true if the entity was
    /// registered.
    pub fn remove_entity(&self, entity: &Entity) -> bool {
        let registration = self.inner.entities.borrow_mut().remove(&entity.id());

        match registration {
            Some(registration) => {
                registration.disconnect();
                trace!("unregistered {}", entity.id());

                for family in self.families() {
                    family.remove_entity(entity);
                }

                for child in entity.children() {
                    self.remove_entity(&child);
                }
                true
            }
            None => false,
        }
    }

    /// Unregister every entity
    pub fn remove_all_entities(&self) {
        for entity in self.entities() {
            self.remove_entity(&entity);
        }
    }

    /// Check whether an entity is registered
    pub fn has_entity(&self, entity: &Entity) -> bool {
        self.inner.entities.borrow().contains_key(&entity.id())
    }

    /// Get the number of registered entities, descendants included
    pub fn entity_count(&self) -> usize {
        self.inner.entities.borrow().len()
    }

    /// Registered entities ordered by id
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .inner
            .entities
            .borrow()
            .values()
            .map(|registration| registration.entity.clone())
            .collect();
        entities.sort_by_key(Entity::id);
        entities
    }

    fn subscribe(&self, entity: &Entity) -> Registration {
        let weak = Rc::downgrade(&self.inner);

        let component_added = entity.component_added().connect({
            let weak = weak.clone();
            move |event| {
                if let Some(engine) = Engine::upgrade(&weak) {
                    for family in engine.families() {
                        family.component_added_to_entity(&event.entity);
                    }
                }
            }
        });

        let component_removed = entity.component_removed().connect({
            let weak = weak.clone();
            move |event| {
                if let Some(engine) = Engine::upgrade(&weak) {
                    for family in engine.families() {
                        family.component_removed_from_entity(&event.entity);
                    }
                }
            }
        });

        let child_added = entity.child_added().connect({
            let weak = weak.clone();
            move |event| {
                if let Some(engine) = Engine::upgrade(&weak) {
                    engine.add_entity(&event.child);
                }
            }
        });

        let child_removed = entity.child_removed().connect({
            let weak = weak.clone();
            move |event| {
                if let Some(engine) = Engine::upgrade(&weak) {
                    engine.remove_entity(&event.child);
                }
            }
        });

        let destroyed = self.inner.config.auto_remove_destroyed.then(|| {
            entity.destroyed().connect(move |event| {
                if let Some(engine) = Engine::upgrade(&weak) {
                    engine.remove_entity(&event.entity);
                }
            })
        });

        Registration {
            entity: entity.clone(),
            component_added,
            component_removed,
            child_added,
            child_removed,
            destroyed,
        }
    }

    // ---- families ----

    fn families(&self) -> Vec<Rc<dyn AnyFamily>> {
        self.inner.families.borrow().values().cloned().collect()
    }

    /// Get the live node list for the node type `N`
    ///
    /// The first request creates the family and offers it every registered
    /// entity. Later requests return the same list.
    pub fn get_node_list<N: Node>(&self) -> NodeList<N> {
        let key = TypeId::of::<N>();

        if let Some(family) = self.inner.families.borrow().get(&key) {
            if let Some(family) = family.as_any().downcast_ref::<Family<N>>() {
                return family.node_list();
            }
        }

        let family = Family::<N>::new();
        self.inner
            .families
            .borrow_mut()
            .insert(key, Rc::new(family.clone()));
        debug!("created family for {}", std::any::type_name::<N>());

        for entity in self.entities() {
            family.add_entity(&entity);
        }
        family.node_list()
    }

    /// Discard the family for the node type `N`
    ///
    /// Its node list is emptied without node-removed events. Returns false
    /// if no family existed.
    pub fn release_node_list<N: Node>(&self) -> bool {
        let family = self.inner.families.borrow_mut().remove(&TypeId::of::<N>());

        match family {
            Some(family) => {
                family.clean();
                debug!("released family for {}", family.descriptor());
                true
            }
            None => false,
        }
    }

    /// Get the number of live families
    pub fn family_count(&self) -> usize {
        self.inner.families.borrow().len()
    }

    // ---- systems ----

    /// Register a system at a priority
    ///
    /// The system's [`System::add_to_engine`] hook runs before it is
    /// scheduled. Lower priorities run first; equal priorities run in
    /// registration order.
    pub fn add_system<S: System>(&self, system: S, priority: i32) -> SystemId {
        let system = Rc::new(RefCell::new(system));
        system.borrow_mut().add_to_engine(self);

        let mut scheduler = self.inner.scheduler.borrow_mut();
        let id = scheduler.add_system(system, priority);
        debug!(
            "added {} '{}' at priority {}",
            id,
            scheduler.name(id).unwrap_or_default(),
            priority
        );
        id
    }

    /// Unregister a system, running its [`System::remove_from_engine`] hook
    ///
    /// A system removing itself from inside its own update has the hook run
    /// once the tick finishes. Returns false for unknown ids.
    pub fn remove_system(&self, id: SystemId) -> bool {
        let removed = self.inner.scheduler.borrow_mut().remove_system(id);

        let system = match removed {
            Some(system) => system,
            None => {
                warn!("cannot remove {}: not registered", id);
                return false;
            }
        };

        let busy = match system.try_borrow_mut() {
            Ok(mut system) => {
                system.remove_from_engine(self);
                false
            }
            Err(_) => true,
        };

        if busy {
            self.inner.retiring.borrow_mut().push(system);
        }
        debug!("removed {}", id);
        true
    }

    /// Unregister every system
    pub fn remove_all_systems(&self) {
        let ids = self.inner.scheduler.borrow().ids();
        for id in ids {
            self.remove_system(id);
        }
    }

    /// Get the first registered system of type `S`
    pub fn get_system<S: System>(&self) -> Option<Rc<RefCell<S>>> {
        self.inner.scheduler.borrow().find::<S>()
    }

    /// Change the priority of a registered system
    ///
    /// Takes effect from the next tick. Returns false for unknown ids.
    pub fn set_system_priority(&self, id: SystemId, priority: i32) -> bool {
        self.inner.scheduler.borrow_mut().set_priority(id, priority)
    }

    /// Get the priority of a registered system
    pub fn system_priority(&self, id: SystemId) -> Option<i32> {
        self.inner.scheduler.borrow().priority(id)
    }

    /// Check whether a system is registered
    pub fn has_system(&self, id: SystemId) -> bool {
        self.inner.scheduler.borrow().contains(id)
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.inner.scheduler.borrow().system_count()
    }

    // ---- ticking ----

    /// Run one tick
    ///
    /// Every system registered when the tick starts is updated once, in
    /// priority order, unless it is removed before its turn. Systems added
    /// during the tick first run on the next one. The update-complete
    /// signal fires after the last system. Calling `update` from inside a
    /// tick is ignored.
    pub fn update(&self, time: f64) {
        if self.inner.updating.replace(true) {
            warn!("ignoring nested engine update");
            return;
        }

        let order = self.inner.scheduler.borrow().ordered();
        for (id, system) in order {
            if !self.has_system(id) {
                continue;
            }

            match system.try_borrow_mut() {
                Ok(mut system) => system.update(time),
                Err(_) => warn!("{} is already borrowed, skipping its update", id),
            };
        }

        self.inner.updating.set(false);
        self.retire_systems();
        self.inner.update_complete.dispatch(&time);
    }

    fn retire_systems(&self) {
        let retiring = std::mem::take(&mut *self.inner.retiring.borrow_mut());

        for system in retiring {
            match system.try_borrow_mut() {
                Ok(mut system) => system.remove_from_engine(self),
                Err(_) => warn!("dropping a removed system that is still borrowed"),
            };
        }
    }

    /// Check whether a tick is in progress
    pub fn is_updating(&self) -> bool {
        self.inner.updating.get()
    }

    /// Fired after every tick with the tick's time value
    pub fn update_complete(&self) -> &Signal<f64> {
        &self.inner.update_complete
    }

    /// Flat dump of every registered entity, ordered by id
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            entities: self.entities().iter().map(Entity::snapshot).collect(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("entities", &self.entity_count())
            .field("families", &self.family_count())
            .field("systems", &self.system_count())
            .field("updating", &self.is_updating())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Component;

    struct Position(f64, f64);
    impl Component for Position {}

    struct Motion(f64);
    impl Component for Motion {}

    struct Tag;
    impl Component for Tag {}

    crate::define_node! {
        struct MovementNode {
            motion: Motion,
            position: Position,
        }
    }

    crate::define_node! {
        struct TagNode {
            tag: Tag,
        }
    }

    type Log = Rc<RefCell<Vec<i32>>>;

    struct Recorder {
        label: i32,
        log: Log,
    }

    impl System for Recorder {
        fn update(&mut self, _time: f64) {
            self.log.borrow_mut().push(self.label);
        }
    }

    fn recorder(label: i32, log: &Log) -> Recorder {
        Recorder {
            label,
            log: log.clone(),
        }
    }

    #[test]
    fn test_add_entity_is_idempotent() {
        let engine = Engine::new();
        let entity = Entity::new();

        assert!(engine.add_entity(&entity));
        assert!(!engine.add_entity(&entity));
        assert_eq!(engine.entity_count(), 1);

        assert!(engine.remove_entity(&entity));
        assert!(!engine.remove_entity(&entity));
        assert_eq!(engine.entity_count(), 0);
    }

    #[test]
    fn test_subtree_registration() {
        let engine = Engine::new();
        let child = Entity::new();
        let grandchild = Entity::new();
        child.add_child(&grandchild);
        let root = Entity::new().with_child(&child);

        engine.add_entity(&root);
        assert_eq!(engine.entity_count(), 3);

        let late = Entity::new();
        root.add_child(&late);
        assert!(engine.has_entity(&late));

        root.remove_child(&child);
        assert!(!engine.has_entity(&child));
        assert!(!engine.has_entity(&grandchild));
        assert_eq!(engine.entity_count(), 2);
    }

    #[test]
    fn test_movement_node_scenario() {
        let engine = Engine::new();
        let a = Entity::new()
            .with_component(Position(0.0, 0.0))
            .with_component(Motion(10.0));

        engine.add_entity(&a);
        let nodes = engine.get_node_list::<MovementNode>();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.first().unwrap().entity(), &a);
        assert_eq!(nodes.first().unwrap().motion.borrow().0, 10.0);

        a.remove_component::<Motion>();
        assert!(nodes.is_empty());

        a.add_component(Motion(2.0));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_get_node_list_is_memoized() {
        let engine = Engine::new();
        engine.add_entity(&Entity::new().with_component(Tag));

        let first = engine.get_node_list::<TagNode>();
        let second = engine.get_node_list::<TagNode>();

        assert!(first.ptr_eq(&second));
        assert_eq!(second.len(), 1);
        assert_eq!(engine.family_count(), 1);
    }

    #[test]
    fn test_release_node_list() {
        let engine = Engine::new();
        engine.add_entity(&Entity::new().with_component(Tag));

        let old = engine.get_node_list::<TagNode>();
        assert!(engine.release_node_list::<TagNode>());
        assert!(!engine.release_node_list::<TagNode>());
        assert!(old.is_empty());
        assert_eq!(engine.family_count(), 0);

        let fresh = engine.get_node_list::<TagNode>();
        assert!(!fresh.ptr_eq(&old));
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_unregistered_entities_are_not_tracked() {
        let engine = Engine::new();
        let nodes = engine.get_node_list::<TagNode>();
        let entity = Entity::new();

        engine.add_entity(&entity);
        engine.remove_entity(&entity);
        entity.add_component(Tag);

        assert!(nodes.is_empty());
    }

    #[test]
    fn test_update_runs_in_priority_order() {
        let engine = Engine::new();
        let log = Log::default();

        engine.add_system(recorder(3, &log), 3);
        engine.add_system(recorder(1, &log), 1);
        engine.add_system(recorder(2, &log), 2);
        engine.update(16.0);

        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_later_registered_lower_priority_runs_first() {
        let engine = Engine::new();
        let log = Log::default();

        engine.add_system(recorder(5, &log), 5);
        engine.add_system(recorder(1, &log), 1);
        engine.update(16.0);

        assert_eq!(*log.borrow(), vec![1, 5]);
    }

    #[test]
    fn test_set_system_priority() {
        let engine = Engine::new();
        let log = Log::default();

        let a = engine.add_system(recorder(10, &log), 0);
        engine.add_system(recorder(20, &log), 1);
        engine.set_system_priority(a, 2);
        engine.update(1.0);

        assert_eq!(*log.borrow(), vec![20, 10]);
        assert_eq!(engine.system_priority(a), Some(2));
    }

    struct Lifecycle {
        events: Rc<RefCell<Vec<&'static str>>>,
        nodes: Option<NodeList<TagNode>>,
    }

    impl System for Lifecycle {
        fn add_to_engine(&mut self, engine: &Engine) {
            self.events.borrow_mut().push("added");
            self.nodes = Some(engine.get_node_list::<TagNode>());
        }

        fn remove_from_engine(&mut self, _engine: &Engine) {
            self.events.borrow_mut().push("removed");
            self.nodes = None;
        }

        fn update(&mut self, _time: f64) {
            self.events.borrow_mut().push("update");
        }
    }

    #[test]
    fn test_system_lifecycle_hooks() {
        let engine = Engine::new();
        let events = Rc::new(RefCell::new(Vec::new()));

        let id = engine.add_system(
            Lifecycle {
                events: events.clone(),
                nodes: None,
            },
            0,
        );
        assert_eq!(engine.family_count(), 1);

        let system = engine.get_system::<Lifecycle>().unwrap();
        assert!(system.borrow().nodes.is_some());
        drop(system);

        engine.update(1.0);
        assert!(engine.remove_system(id));
        assert!(!engine.remove_system(id));
        engine.update(1.0);

        assert_eq!(*events.borrow(), vec!["added", "update", "removed"]);
        assert_eq!(engine.system_count(), 0);
    }

    struct SelfRemoving {
        engine: Engine,
        id: Option<SystemId>,
        removed: Rc<Cell<bool>>,
    }

    impl System for SelfRemoving {
        fn remove_from_engine(&mut self, _engine: &Engine) {
            self.removed.set(true);
        }

        fn update(&mut self, _time: f64) {
            if let Some(id) = self.id.take() {
                self.engine.remove_system(id);
                assert!(!self.removed.get());
            }
        }
    }

    #[test]
    fn test_system_removing_itself_during_update() {
        let engine = Engine::new();
        let removed = Rc::new(Cell::new(false));
        let log = Log::default();

        let id = engine.add_system(
            SelfRemoving {
                engine: engine.clone(),
                id: None,
                removed: removed.clone(),
            },
            0,
        );
        engine.get_system::<SelfRemoving>().unwrap().borrow_mut().id = Some(id);
        engine.add_system(recorder(1, &log), 1);

        engine.update(1.0);

        assert!(removed.get());
        assert_eq!(engine.system_count(), 1);
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn test_update_complete_fires_after_systems() {
        let engine = Engine::new();
        let log = Log::default();
        engine.add_system(recorder(1, &log), 0);

        let sink = log.clone();
        let watcher = engine.clone();
        engine.update_complete().connect(move |time| {
            assert!(!watcher.is_updating());
            sink.borrow_mut().push(*time as i32 * 100);
        });

        engine.update(2.0);
        assert_eq!(*log.borrow(), vec![1, 200]);
        engine.update_complete().clear();
    }

    #[test]
    fn test_destroy_unregisters_subtree() {
        let engine = Engine::new();
        let child = Entity::new().with_component(Tag);
        let root = Entity::new().with_child(&child);
        engine.add_entity(&root);
        let nodes = engine.get_node_list::<TagNode>();
        assert_eq!(nodes.len(), 1);

        root.destroy();

        assert_eq!(engine.entity_count(), 0);
        assert!(nodes.is_empty());
        assert!(!engine.add_entity(&root));
    }

    #[test]
    fn test_destroy_without_auto_remove() {
        let engine = Engine::with_config(EngineConfig::default().with_auto_remove_destroyed(false));
        let entity = Entity::new();
        engine.add_entity(&entity);

        entity.destroy();
        assert!(engine.has_entity(&entity));

        engine.remove_entity(&entity);
        assert_eq!(engine.entity_count(), 0);
    }

    #[test]
    fn test_remove_all() {
        let engine = Engine::new();
        let log = Log::default();
        for _ in 0..4 {
            engine.add_entity(&Entity::new().with_component(Tag));
        }
        engine.add_system(recorder(0, &log), 0);
        let nodes = engine.get_node_list::<TagNode>();

        engine.remove_all_entities();
        engine.remove_all_systems();

        assert!(nodes.is_empty());
        assert_eq!(engine.entity_count(), 0);
        assert_eq!(engine.system_count(), 0);
    }

    #[test]
    fn test_snapshot_orders_by_id() {
        let engine = Engine::new();
        let older = Entity::new();
        let newer = Entity::new();
        engine.add_entity(&newer);
        engine.add_entity(&older);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.entities.len(), 2);
        assert_eq!(snapshot.entities[0].id, older.id());
    }
}
