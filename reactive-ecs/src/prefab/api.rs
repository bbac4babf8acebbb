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
//! Prefab API traits and build context
//!
//! A prefab is a named recipe producing a ready-made entity, possibly with
//! children built from other prefabs.
//!
//! # Contracts
//!
//! Prefabs must:
//! - Return a fresh entity from every build
//! - Declare every prefab they build through the context as a dependency
//! - Leave registration to the caller: a built entity is not yet live

use crate::ecs::{Engine, Entity};
use crate::error::{EcsError, Result};
use crate::prefab::PrefabRegistry;

/// Version of the prefab API
///
/// Prefabs report the version they were written against and the registry
/// refuses incompatible ones. Format: MAJOR.MINOR.PATCH.
pub const PREFAB_API_VERSION: &str = "0.1.0";

/// Context handed to [`Prefab::build`]
///
/// Gives access to the target engine and lets a prefab build its declared
/// dependencies, for instance to attach them as children.
pub struct PrefabContext<'a> {
    engine: &'a Engine,
    registry: &'a PrefabRegistry,
    prefab: &'a str,
    dependencies: Vec<&'a str>,
}

impl<'a> PrefabContext<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        registry: &'a PrefabRegistry,
        prefab: &'a dyn Prefab,
    ) -> Self {
        PrefabContext {
            engine,
            registry,
            prefab: prefab.name(),
            dependencies: prefab.dependencies(),
        }
    }

    /// The engine the entity is being built for
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// Name of the prefab being built
    pub fn prefab_name(&self) -> &str {
        self.prefab
    }

    /// Build one of the current prefab's declared dependencies
    ///
    /// # Errors
    ///
    /// Fails with [`EcsError::MissingPrefabDependency`] if `name` is not a
    /// declared dependency, or with whatever the dependency's build fails
    /// with.
    pub fn build(&self, name: &str) -> Result<Entity> {
        if !self.dependencies.iter().any(|dep| *dep == name) {
            return Err(EcsError::MissingPrefabDependency {
                name: self.prefab.to_string(),
                dependency: name.to_string(),
            });
        }
        self.registry.build_resolved(name, self.engine)
    }
}

/// Named entity factory
///
/// # Example
///
/// ```
/// use reactive_ecs::ecs::components::Position;
/// use reactive_ecs::ecs::Entity;
/// use reactive_ecs::prefab::{Prefab, PrefabContext};
///
/// struct Crate;
///
/// impl Prefab for Crate {
///     fn name(&self) -> &str { "crate" }
///     fn version(&self) -> &str { "1.0.0" }
///
///     fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
///         Ok(Entity::new().with_component(Position::new(300.0, 280.0)))
///     }
/// }
/// ```
pub trait Prefab {
    /// Get the name of this prefab
    ///
    /// Must be unique within a registry.
    fn name(&self) -> &str;

    /// Get the version of this prefab
    fn version(&self) -> &str;

    /// Get the prefab API version this prefab was written against
    fn api_version(&self) -> &str {
        PREFAB_API_VERSION
    }

    /// Names of the prefabs this one builds through its context
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Build a new entity
    ///
    /// # Errors
    ///
    /// Returns a description of the failure.
    fn build(&self, context: &PrefabContext) -> std::result::Result<Entity, String>;
}
