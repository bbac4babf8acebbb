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
//! Priority ordered system registry
//!
//! The scheduler keeps systems sorted by priority, lowest first. Systems
//! sharing a priority keep their registration order.

use crate::ecs::{System, SystemId};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a registered system
pub(crate) type SystemRef = Rc<RefCell<dyn System>>;

struct ScheduledSystem {
    id: SystemId,
    priority: i32,
    seq: u64,
    name: String,
    system: SystemRef,
    concrete: Rc<dyn Any>,
}

/// Registry of systems ordered by `(priority, registration order)`
pub(crate) struct Scheduler {
    systems: Vec<ScheduledSystem>,
    next_id: u64,
    next_seq: u64,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Insert a system at its priority
    pub fn add_system<S: System>(&mut self, system: Rc<RefCell<S>>, priority: i32) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;

        let name = system.borrow().name().to_string();
        let concrete: Rc<dyn Any> = system.clone();
        let scheduled = ScheduledSystem {
            id,
            priority,
            seq: self.next_seq,
            name,
            system,
            concrete,
        };
        self.next_seq += 1;

        let position = self
            .systems
            .partition_point(|s| (s.priority, s.seq) <= (priority, scheduled.seq));
        self.systems.insert(position, scheduled);
        id
    }

    /// Remove a system, returning its handle
    pub fn remove_system(&mut self, id: SystemId) -> Option<SystemRef> {
        let position = self.systems.iter().position(|s| s.id == id)?;
        Some(self.systems.remove(position).system)
    }

    /// Change the priority of a system and re-sort
    ///
    /// The system keeps its original registration order among equal
    /// priorities.
    pub fn set_priority(&mut self, id: SystemId, priority: i32) -> bool {
        match self.systems.iter_mut().find(|s| s.id == id) {
            Some(scheduled) => {
                scheduled.priority = priority;
                self.systems.sort_by_key(|s| (s.priority, s.seq));
                true
            }
            None => false,
        }
    }

    /// Get the priority of a system
    pub fn priority(&self, id: SystemId) -> Option<i32> {
        self.systems.iter().find(|s| s.id == id).map(|s| s.priority)
    }

    /// Get the debug name of a system
    pub fn name(&self, id: SystemId) -> Option<&str> {
        self.systems
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    /// Check whether a system is registered
    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.iter().any(|s| s.id == id)
    }

    /// Find the first registered system of type `S`
    pub fn find<S: System>(&self) -> Option<Rc<RefCell<S>>> {
        self.systems
            .iter()
            .find_map(|s| s.concrete.clone().downcast::<RefCell<S>>().ok())
    }

    /// Snapshot of the execution order
    pub fn ordered(&self) -> Vec<(SystemId, SystemRef)> {
        self.systems
            .iter()
            .map(|s| (s.id, s.system.clone()))
            .collect()
    }

    /// Ids in execution order
    pub fn ids(&self) -> Vec<SystemId> {
        self.systems.iter().map(|s| s.id).collect()
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
