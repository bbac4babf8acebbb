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
//! Entity management
//!
//! An [`Entity`] is a cheaply clonable handle to an identity that owns a set
//! of components and a position in a parent/child tree. Every mutation is
//! announced synchronously on the entity's event channels, which is how the
//! [`Engine`](crate::ecs::Engine) and its families stay current.

use crate::ecs::component::{AnyComponent, Component, ComponentKind, ComponentRef};
use crate::ecs::signal::Signal;
use crate::ecs::snapshot::EntitySnapshot;
use crate::error::EcsError;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity
///
/// Ids are process-unique, assigned in increasing order at construction and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Create a new EntityId from a raw u64 value
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    fn next() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Payload of [`Entity::component_added`]
#[derive(Debug, Clone)]
pub struct ComponentAdded {
    /// The entity that received the component
    pub entity: Entity,
    /// The stored instance
    pub component: AnyComponent,
}

/// Payload of [`Entity::component_removed`]
#[derive(Debug, Clone)]
pub struct ComponentRemoved {
    /// The entity that lost the component
    pub entity: Entity,
    /// The instance that was removed
    pub component: AnyComponent,
}

/// Payload of [`Entity::child_added`]
#[derive(Debug, Clone)]
pub struct ChildAdded {
    /// The parent entity
    pub entity: Entity,
    /// The newly attached child
    pub child: Entity,
}

/// Payload of [`Entity::child_removed`]
#[derive(Debug, Clone)]
pub struct ChildRemoved {
    /// The parent entity
    pub entity: Entity,
    /// The detached child
    pub child: Entity,
}

/// Payload of [`Entity::destroyed`]
#[derive(Debug, Clone)]
pub struct Destroyed {
    /// The destroyed entity
    pub entity: Entity,
}

/// Order in which [`Entity::walk`] visits a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Depth-first, parent before children
    #[default]
    Pre,
    /// Depth-first, children before parent
    Post,
    /// Level by level
    Breadth,
}

impl FromStr for Traversal {
    type Err = EcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" => Ok(Traversal::Pre),
            "post" => Ok(Traversal::Post),
            "breadth" => Ok(Traversal::Breadth),
            other => Err(EcsError::UnknownTraversal {
                name: other.to_string(),
            }),
        }
    }
}

struct EntityInner {
    id: EntityId,
    components: RefCell<HashMap<TypeId, AnyComponent>>,
    parent: RefCell<Option<Weak<EntityInner>>>,
    children: RefCell<Vec<Entity>>,
    destroyed: Cell<bool>,
    component_added: Signal<ComponentAdded>,
    component_removed: Signal<ComponentRemoved>,
    child_added: Signal<ChildAdded>,
    child_removed: Signal<ChildRemoved>,
    on_destroyed: Signal<Destroyed>,
}

/// Handle to an entity
///
/// Cloning the handle shares the entity. Equality and hashing use the
/// entity's [`EntityId`]. Parents own their children; a child only keeps a
/// weak back-reference to its parent.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::{Component, Entity};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// let entity = Entity::new();
/// entity.add_component(Health(10));
///
/// assert!(entity.has_component::<Health>());
/// assert_eq!(entity.get_component::<Health>().unwrap().borrow().0, 10);
///
/// entity.remove_component::<Health>();
/// assert!(!entity.has_component::<Health>());
/// ```
#[derive(Clone)]
pub struct Entity(Rc<EntityInner>);

impl Entity {
    /// Create a standalone entity with a fresh id
    pub fn new() -> Self {
        Entity(Rc::new(EntityInner {
            id: EntityId::next(),
            components: RefCell::new(HashMap::new()),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
            component_added: Signal::new(),
            component_removed: Signal::new(),
            child_added: Signal::new(),
            child_removed: Signal::new(),
            on_destroyed: Signal::new(),
        }))
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.0.id
    }

    /// Builder-style [`Entity::add_component`]
    pub fn with_component<T: Component>(self, component: T) -> Self {
        self.add_component(component);
        self
    }

    /// Builder-style [`Entity::add_child`]
    pub fn with_child(self, child: &Entity) -> Self {
        self.add_child(child);
        self
    }

    /// Attach a component, replacing any instance of the same kind
    ///
    /// A replaced instance is first removed, with its component-removed
    /// event, before the new instance is stored and announced. Handlers of
    /// the component-added event see the new instance in place.
    pub fn add_component<T: Component>(&self, component: T) -> &Self {
        let kind = ComponentKind::of::<T>();
        if self.has_kind(kind) {
            self.remove_kind(kind);
        }

        let stored = AnyComponent::from_ref(Rc::new(RefCell::new(component)));
        self.0
            .components
            .borrow_mut()
            .insert(kind.type_id(), stored.clone());

        trace!("{} gained {}", self.id(), kind);
        self.0.component_added.dispatch(&ComponentAdded {
            entity: self.clone(),
            component: stored,
        });
        self
    }

    /// Remove the component of type `T`, if present
    pub fn remove_component<T: Component>(&self) -> &Self {
        self.remove_kind(ComponentKind::of::<T>())
    }

    /// Remove the component with the same kind as `component`, if present
    pub fn remove_any(&self, component: &AnyComponent) -> &Self {
        self.remove_kind(component.kind())
    }

    /// Remove the component of the given kind, if present
    ///
    /// Fires the component-removed event only when something was removed.
    pub fn remove_kind(&self, kind: ComponentKind) -> &Self {
        let removed = self.0.components.borrow_mut().remove(&kind.type_id());

        if let Some(component) = removed {
            trace!("{} lost {}", self.id(), kind);
            self.0.component_removed.dispatch(&ComponentRemoved {
                entity: self.clone(),
                component,
            });
        }
        self
    }

    /// Check whether a component of type `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        self.has_kind(ComponentKind::of::<T>())
    }

    /// Check whether a component of the given kind is attached
    pub fn has_kind(&self, kind: ComponentKind) -> bool {
        self.0.components.borrow().contains_key(&kind.type_id())
    }

    /// Get the component of type `T`
    pub fn get_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.get_kind(ComponentKind::of::<T>())
            .and_then(|component| component.downcast::<T>())
    }

    /// Get the type-erased component of the given kind
    pub fn get_kind(&self, kind: ComponentKind) -> Option<AnyComponent> {
        self.0.components.borrow().get(&kind.type_id()).cloned()
    }

    /// Kinds of all attached components, in no particular order
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.0
            .components
            .borrow()
            .values()
            .map(AnyComponent::kind)
            .collect()
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.0.components.borrow().len()
    }

    /// Get the parent, if this entity is attached to one that is still alive
    pub fn parent(&self) -> Option<Entity> {
        self.0
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Entity)
    }

    /// Snapshot of the children, in attachment order
    pub fn children(&self) -> Vec<Entity> {
        self.0.children.borrow().clone()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Check whether `child` is a direct child of this entity
    pub fn has_child(&self, child: &Entity) -> bool {
        self.0.children.borrow().iter().any(|c| c.id() == child.id())
    }

    /// Check whether `other` appears anywhere on this entity's parent chain
    pub fn has_ancestor(&self, other: &Entity) -> bool {
        let mut current = self.parent();
        while let Some(parent) = current {
            if parent.id() == other.id() {
                return true;
            }
            current = parent.parent();
        }
        false
    }

    /// Attach a child entity
    ///
    /// No-op if `child` is already a child. A child still attached to
    /// another parent is detached from it first. Attaching the entity to
    /// itself or to one of its descendants is refused.
    pub fn add_child(&self, child: &Entity) -> &Self {
        if self.has_child(child) {
            return self;
        }

        if child.id() == self.id() || self.has_ancestor(child) {
            warn!("refusing to attach {} under {}: would create a cycle", child.id(), self.id());
            return self;
        }

        if let Some(previous) = child.parent() {
            previous.remove_child(child);
        }

        *child.0.parent.borrow_mut() = Some(Rc::downgrade(&self.0));
        self.0.children.borrow_mut().push(child.clone());

        self.0.child_added.dispatch(&ChildAdded {
            entity: self.clone(),
            child: child.clone(),
        });
        self
    }

    /// Detach a child entity
    ///
    /// The child-removed event fires only if the children sequence changed.
    /// The child's parent pointer is cleared whenever it points at this
    /// entity, even if the child was no longer listed.
    pub fn remove_child(&self, child: &Entity) -> &Self {
        let removed = {
            let mut children = self.0.children.borrow_mut();
            let before = children.len();
            children.retain(|c| c.id() != child.id());
            before != children.len()
        };

        if child.parent().map_or(false, |parent| parent.id() == self.id()) {
            *child.0.parent.borrow_mut() = None;
        }

        if removed {
            self.0.child_removed.dispatch(&ChildRemoved {
                entity: self.clone(),
                child: child.clone(),
            });
        }
        self
    }

    /// Collect the component of type `T` from every direct child that has one
    pub fn get_child_components<T: Component>(&self) -> Vec<ComponentRef<T>> {
        self.children()
            .iter()
            .filter_map(Entity::get_component::<T>)
            .collect()
    }

    /// Visit this entity and its descendants
    ///
    /// The visitor returns `false` to stop the walk early. Returns `false`
    /// if the walk was stopped.
    pub fn walk<F>(&self, traversal: Traversal, mut visitor: F) -> bool
    where
        F: FnMut(&Entity) -> bool,
    {
        match traversal {
            Traversal::Pre => walk_pre(self, &mut visitor),
            Traversal::Post => walk_post(self, &mut visitor),
            Traversal::Breadth => {
                let mut queue = VecDeque::new();
                queue.push_back(self.clone());
                while let Some(entity) = queue.pop_front() {
                    if !visitor(&entity) {
                        return false;
                    }
                    queue.extend(entity.children());
                }
                true
            }
        }
    }

    /// Find the first entity of the subtree, in walk order, that matches
    pub fn first<P>(&self, traversal: Traversal, mut predicate: P) -> Option<Entity>
    where
        P: FnMut(&Entity) -> bool,
    {
        let mut found = None;
        self.walk(traversal, |entity| {
            if predicate(entity) {
                found = Some(entity.clone());
                return false;
            }
            true
        });
        found
    }

    /// Collect every entity of the subtree, in walk order, that matches
    pub fn all<P>(&self, traversal: Traversal, mut predicate: P) -> Vec<Entity>
    where
        P: FnMut(&Entity) -> bool,
    {
        let mut matches = Vec::new();
        self.walk(traversal, |entity| {
            if predicate(entity) {
                matches.push(entity.clone());
            }
            true
        });
        matches
    }

    /// Ancestors from the root down to and including this entity
    pub fn path(&self) -> Vec<Entity> {
        let mut path = vec![self.clone()];
        let mut current = self.parent();
        while let Some(entity) = current {
            current = entity.parent();
            path.push(entity);
        }
        path.reverse();
        path
    }

    /// Destroy this entity and its whole subtree
    ///
    /// Detaches from the parent, destroys every child (each child finishes
    /// its own subtree first), then fires the destroyed event. Calling this
    /// on an already destroyed entity does nothing.
    pub fn destroy(&self) {
        if self.0.destroyed.replace(true) {
            return;
        }

        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }

        for child in self.children() {
            child.destroy();
        }

        trace!("{} destroyed", self.id());
        self.0.on_destroyed.dispatch(&Destroyed {
            entity: self.clone(),
        });
    }

    /// Check whether [`Entity::destroy`] has been called
    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Flat dump of the id and component data
    ///
    /// Components are keyed by short type name. Types whose short names
    /// collide fall back to their full path.
    pub fn snapshot(&self) -> EntitySnapshot {
        let components = self.0.components.borrow();

        let mut short_names: HashMap<&str, usize> = HashMap::new();
        for component in components.values() {
            *short_names.entry(component.kind().short_name()).or_default() += 1;
        }

        let components = components
            .values()
            .map(|component| {
                let kind = component.kind();
                let key = if short_names[kind.short_name()] > 1 {
                    debug!("{} has several components named {}", self.id(), kind.short_name());
                    kind.name()
                } else {
                    kind.short_name()
                };
                let value = component.snapshot().unwrap_or(serde_json::Value::Null);
                (key.to_string(), value)
            })
            .collect();

        EntitySnapshot {
            id: self.id(),
            components,
        }
    }

    /// Fired after a component is stored
    pub fn component_added(&self) -> &Signal<ComponentAdded> {
        &self.0.component_added
    }

    /// Fired after a component is removed
    pub fn component_removed(&self) -> &Signal<ComponentRemoved> {
        &self.0.component_removed
    }

    /// Fired after a child is attached
    pub fn child_added(&self) -> &Signal<ChildAdded> {
        &self.0.child_added
    }

    /// Fired after a child is detached
    pub fn child_removed(&self) -> &Signal<ChildRemoved> {
        &self.0.child_removed
    }

    /// Fired once, at the end of [`Entity::destroy`]
    pub fn destroyed(&self) -> &Signal<Destroyed> {
        &self.0.on_destroyed
    }
}

fn walk_pre<F: FnMut(&Entity) -> bool>(entity: &Entity, visitor: &mut F) -> bool {
    if !visitor(entity) {
        return false;
    }
    entity.children().iter().all(|child| walk_pre(child, &mut *visitor))
}

fn walk_post<F: FnMut(&Entity) -> bool>(entity: &Entity, visitor: &mut F) -> bool {
    entity.children().iter().all(|child| walk_post(child, &mut *visitor)) && visitor(entity)
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id().raw())
            .field("components", &self.component_kinds())
            .field("children", &self.child_count())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id(), f)
    }
}
