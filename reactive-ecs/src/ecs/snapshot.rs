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
//! Flat world snapshots
//!
//! Snapshots are a one-way, flat dump of entity ids and their component data.
//! They carry no hierarchy and are not meant to be loaded back.

use crate::ecs::EntityId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat dump of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Identity of the entity
    pub id: EntityId,
    /// Component data keyed by short component type name
    ///
    /// Types sharing a short name are keyed by their full path instead.
    ///
    /// Components that do not support snapshots map to `null`.
    pub components: BTreeMap<String, serde_json::Value>,
}

/// Flat dump of every entity registered with an engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Entities ordered by id
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Encode the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find the snapshot of a given entity
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|snapshot| snapshot.id == id)
    }
}
