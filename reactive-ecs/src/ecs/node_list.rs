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
//! Observable node collections
//!
//! A [`NodeList`] is the live result of a family: the set of nodes whose
//! entities currently match the family's descriptor. Systems keep a clone of
//! the list and iterate it every tick.
//!
//! # Memory Layout
//!
//! Nodes live in a slot vector. Removing a node empties its slot instead of
//! shifting the following ones, so an iterator that is part-way through the
//! list keeps its position:
//!
//! ```text
//! slots:  [A] [B] [ ] [D]   <- C removed while iterating
//! cursor:          ^
//! ```
//!
//! Empty slots are compacted once they outnumber the live nodes and no
//! iterator is alive, so a run of removals costs amortized O(1) each.

use crate::ecs::signal::Signal;
use crate::ecs::{Entity, EntityId, Node};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct NodeListInner<N: Node> {
    slots: RefCell<Vec<Option<Rc<N>>>>,
    index: RefCell<HashMap<EntityId, usize>>,
    iterators: Cell<usize>,
    tombstones: Cell<usize>,
    node_added: Signal<Rc<N>>,
    node_removed: Signal<Rc<N>>,
}

impl<N: Node> NodeListInner<N> {
    fn should_compact(&self) -> bool {
        self.iterators.get() == 0 && self.tombstones.get() * 2 > self.slots.borrow().len()
    }

    fn compact(&self) {
        let mut slots = self.slots.borrow_mut();
        slots.retain(Option::is_some);

        let mut index = self.index.borrow_mut();
        index.clear();
        for (position, node) in slots.iter().enumerate() {
            if let Some(node) = node {
                index.insert(node.entity().id(), position);
            }
        }
        self.tombstones.set(0);
    }
}

/// Observable set of nodes, iterated in insertion order
///
/// Cloning the list shares it. Membership is keyed by entity: a list holds
/// at most one node per entity.
pub struct NodeList<N: Node> {
    inner: Rc<NodeListInner<N>>,
}

impl<N: Node> NodeList<N> {
    pub(crate) fn new() -> Self {
        NodeList {
            inner: Rc::new(NodeListInner {
                slots: RefCell::new(Vec::new()),
                index: RefCell::new(HashMap::new()),
                iterators: Cell::new(0),
                tombstones: Cell::new(0),
                node_added: Signal::new(),
                node_removed: Signal::new(),
            }),
        }
    }

    /// Insert a node, firing `node_added`
    ///
    /// Returns false, without an event, if the entity already has a node.
    pub(crate) fn add(&self, node: Rc<N>) -> bool {
        let id = node.entity().id();
        {
            let mut index = self.inner.index.borrow_mut();
            if index.contains_key(&id) {
                return false;
            }
            let mut slots = self.inner.slots.borrow_mut();
            index.insert(id, slots.len());
            slots.push(Some(node.clone()));
        }

        self.inner.node_added.dispatch(&node);
        true
    }

    /// Remove the node of an entity, firing `node_removed`
    ///
    /// The slot is left empty; other nodes keep their positions until the
    /// next compaction.
    pub(crate) fn remove(&self, id: EntityId) -> Option<Rc<N>> {
        let removed = {
            let position = self.inner.index.borrow_mut().remove(&id)?;
            let node = self.inner.slots.borrow_mut()[position].take();
            self.inner.tombstones.set(self.inner.tombstones.get() + 1);
            if self.inner.should_compact() {
                self.inner.compact();
            }
            node
        };

        if let Some(node) = &removed {
            self.inner.node_removed.dispatch(node);
        }
        removed
    }

    /// Drop every node without firing `node_removed`
    pub(crate) fn clear_silently(&self) {
        self.inner.index.borrow_mut().clear();
        let mut slots = self.inner.slots.borrow_mut();
        if self.inner.iterators.get() == 0 {
            slots.clear();
            self.inner.tombstones.set(0);
        } else {
            slots.iter_mut().for_each(|slot| *slot = None);
            self.inner.tombstones.set(slots.len());
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.inner.index.borrow().len()
    }

    /// Check whether the list has no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether the entity currently has a node in this list
    pub fn contains(&self, entity: &Entity) -> bool {
        self.inner.index.borrow().contains_key(&entity.id())
    }

    /// Get the node wrapping the given entity
    pub fn get(&self, id: EntityId) -> Option<Rc<N>> {
        let position = *self.inner.index.borrow().get(&id)?;
        self.inner.slots.borrow().get(position).cloned().flatten()
    }

    /// Get the oldest node still in the list
    pub fn first(&self) -> Option<Rc<N>> {
        self.iter().next()
    }

    /// Iterate the nodes in insertion order
    ///
    /// The list may be mutated while the iterator is alive. Nodes removed
    /// before the cursor reaches them are skipped, and nodes added during
    /// iteration are visited at the end.
    pub fn iter(&self) -> NodeIter<N> {
        self.inner.iterators.set(self.inner.iterators.get() + 1);
        NodeIter {
            list: self.inner.clone(),
            cursor: 0,
        }
    }

    /// Copy the current nodes into a vector
    pub fn to_vec(&self) -> Vec<Rc<N>> {
        self.inner.slots.borrow().iter().flatten().cloned().collect()
    }

    /// Fired after a node joins the list
    pub fn node_added(&self) -> &Signal<Rc<N>> {
        &self.inner.node_added
    }

    /// Fired after a node leaves the list
    pub fn node_removed(&self) -> &Signal<Rc<N>> {
        &self.inner.node_removed
    }

    /// Check whether two handles refer to the same list
    pub fn ptr_eq(&self, other: &NodeList<N>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<N: Node> Clone for NodeList<N> {
    fn clone(&self) -> Self {
        NodeList {
            inner: self.inner.clone(),
        }
    }
}

impl<N: Node> fmt::Debug for NodeList<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList")
            .field("node", &std::any::type_name::<N>())
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, N: Node> IntoIterator for &'a NodeList<N> {
    type Item = Rc<N>;
    type IntoIter = NodeIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`NodeList`] that tolerates concurrent membership changes
pub struct NodeIter<N: Node> {
    list: Rc<NodeListInner<N>>,
    cursor: usize,
}

impl<N: Node> Iterator for NodeIter<N> {
    type Item = Rc<N>;

    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.list.slots.borrow();
        while self.cursor < slots.len() {
            let slot = slots[self.cursor].clone();
            self.cursor += 1;
            if slot.is_some() {
                return slot;
            }
        }
        None
    }
}

impl<N: Node> Drop for NodeIter<N> {
    fn drop(&mut self) {
        let remaining = self.list.iterators.get().saturating_sub(1);
        self.list.iterators.set(remaining);
        if self.list.should_compact() {
            self.list.compact();
        }
    }
}
