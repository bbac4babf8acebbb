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
//! Families: live membership tracking for one node descriptor
//!
//! A [`Family`] answers "which entities currently hold every component the
//! node type `N` requires?" incrementally. It never re-scans on its own:
//! membership changes only in response to entity and component events
//! forwarded by the engine, plus its own subscription to the component-removed
//! channel of every tracked entity.

use crate::ecs::signal::SlotId;
use crate::ecs::{ComponentKind, Entity, EntityId, Node, NodeList};
use log::trace;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

struct Tracked<N> {
    entity: Entity,
    node: Rc<N>,
    slot: SlotId,
}

struct FamilyInner<N: Node> {
    required: Vec<ComponentKind>,
    entities: RefCell<HashMap<EntityId, Tracked<N>>>,
    nodes: NodeList<N>,
}

impl<N: Node> Drop for FamilyInner<N> {
    fn drop(&mut self) {
        for tracked in self.entities.get_mut().values() {
            tracked.entity.component_removed().disconnect(tracked.slot);
        }
    }
}

/// Membership tracker for the node type `N`
///
/// Cloning shares the family.
pub struct Family<N: Node> {
    inner: Rc<FamilyInner<N>>,
}

impl<N: Node> Family<N> {
    /// Create an empty family
    pub fn new() -> Self {
        let mut required = N::required();
        let mut seen = Vec::with_capacity(required.len());
        required.retain(|kind| {
            if seen.contains(kind) {
                false
            } else {
                seen.push(*kind);
                true
            }
        });

        Family {
            inner: Rc::new(FamilyInner {
                required,
                entities: RefCell::new(HashMap::new()),
                nodes: NodeList::new(),
            }),
        }
    }

    fn from_weak(weak: &Weak<FamilyInner<N>>) -> Option<Self> {
        weak.upgrade().map(|inner| Family { inner })
    }

    /// The live node list of this family
    pub fn node_list(&self) -> NodeList<N> {
        self.inner.nodes.clone()
    }

    /// The distinct component kinds required for membership
    pub fn required(&self) -> &[ComponentKind] {
        &self.inner.required
    }

    /// Check whether `entity` holds every required kind
    pub fn matches(&self, entity: &Entity) -> bool {
        self.inner.required.iter().all(|kind| entity.has_kind(*kind))
    }

    /// Check whether `entity` currently has a node in this family
    pub fn is_tracking(&self, entity: &Entity) -> bool {
        self.inner.entities.borrow().contains_key(&entity.id())
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.inner.entities.borrow().len()
    }

    /// Check whether no entity is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start tracking `entity` if it is untracked and matches
    ///
    /// Returns true if a node was created.
    pub fn add_if_match(&self, entity: &Entity) -> bool {
        if self.is_tracking(entity) || !self.matches(entity) {
            return false;
        }

        let node = match N::from_entity(entity) {
            Some(node) => Rc::new(node),
            None => return false,
        };

        let weak = Rc::downgrade(&self.inner);
        let slot = entity.component_removed().connect(move |event| {
            if let Some(family) = Family::from_weak(&weak) {
                family.component_removed_from_entity(&event.entity);
            }
        });

        self.inner.entities.borrow_mut().insert(
            entity.id(),
            Tracked {
                entity: entity.clone(),
                node: node.clone(),
                slot,
            },
        );

        trace!("{} joined {}", entity.id(), std::any::type_name::<N>());
        self.inner.nodes.add(node);
        true
    }

    /// Stop tracking `entity`, whether or not it still matches
    ///
    /// Returns true if the entity was tracked.
    pub fn remove_if_match(&self, entity: &Entity) -> bool {
        let tracked = self.inner.entities.borrow_mut().remove(&entity.id());

        match tracked {
            Some(tracked) => {
                tracked.entity.component_removed().disconnect(tracked.slot);
                trace!("{} left {}", entity.id(), std::any::type_name::<N>());
                self.inner.nodes.remove(entity.id());
                true
            }
            None => false,
        }
    }

    /// React to a newly registered entity
    pub fn add_entity(&self, entity: &Entity) {
        self.add_if_match(entity);
    }

    /// React to an entity leaving the engine
    pub fn remove_entity(&self, entity: &Entity) {
        self.remove_if_match(entity);
    }

    /// React to a component added to `entity`
    pub fn component_added_to_entity(&self, entity: &Entity) {
        self.add_if_match(entity);
    }

    /// React to a component removed from `entity`
    ///
    /// Only drops the node if the entity no longer matches, so removing a
    /// component this family does not require keeps the node.
    pub fn component_removed_from_entity(&self, entity: &Entity) {
        if self.is_tracking(entity) && !self.matches(entity) {
            self.remove_if_match(entity);
        }
    }

    /// Forget every tracked entity without node-removed events
    pub fn clean(&self) {
        let tracked: Vec<Tracked<N>> = self
            .inner
            .entities
            .borrow_mut()
            .drain()
            .map(|(_, tracked)| tracked)
            .collect();

        for tracked in &tracked {
            tracked.entity.component_removed().disconnect(tracked.slot);
        }
        self.inner.nodes.clear_silently();
    }

    /// Get the node tracked for an entity
    pub fn node(&self, id: EntityId) -> Option<Rc<N>> {
        self.inner
            .entities
            .borrow()
            .get(&id)
            .map(|tracked| tracked.node.clone())
    }
}

impl<N: Node> Default for Family<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Clone for Family<N> {
    fn clone(&self) -> Self {
        Family {
            inner: self.inner.clone(),
        }
    }
}

impl<N: Node> fmt::Debug for Family<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("node", &std::any::type_name::<N>())
            .field("required", &self.inner.required)
            .field("tracked", &self.len())
            .finish()
    }
}

/// Type-erased family interface used by the engine to broadcast events
pub(crate) trait AnyFamily {
    fn add_entity(&self, entity: &Entity);
    fn remove_entity(&self, entity: &Entity);
    fn component_added_to_entity(&self, entity: &Entity);
    fn component_removed_from_entity(&self, entity: &Entity);
    fn clean(&self);
    fn descriptor(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<N: Node> AnyFamily for Family<N> {
    fn add_entity(&self, entity: &Entity) {
        Family::add_entity(self, entity);
    }

    fn remove_entity(&self, entity: &Entity) {
        Family::remove_entity(self, entity);
    }

    fn component_added_to_entity(&self, entity: &Entity) {
        Family::component_added_to_entity(self, entity);
    }

    fn component_removed_from_entity(&self, entity: &Entity) {
        Family::component_removed_from_entity(self, entity);
    }

    fn clean(&self) {
        Family::clean(self);
    }

    fn descriptor(&self) -> &'static str {
        std::any::type_name::<N>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
