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
//! Prefabs: named entity factories
//!
//! A [`Prefab`] builds a ready-made entity. Prefabs are collected in a
//! [`PrefabRegistry`], which validates their API version, orders them by
//! dependency and spawns them into an [`Engine`](crate::ecs::Engine).
//!
//! ```
//! use reactive_ecs::ecs::components::{Motion, Position};
//! use reactive_ecs::ecs::{Engine, Entity};
//! use reactive_ecs::prefab::{Prefab, PrefabContext, PrefabRegistry};
//!
//! struct Turret;
//!
//! impl Prefab for Turret {
//!     fn name(&self) -> &str { "turret" }
//!     fn version(&self) -> &str { "1.0.0" }
//!
//!     fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
//!         Ok(Entity::new().with_component(Position::new(0.0, -4.0)))
//!     }
//! }
//!
//! struct Fighter;
//!
//! impl Prefab for Fighter {
//!     fn name(&self) -> &str { "fighter" }
//!     fn version(&self) -> &str { "1.0.0" }
//!     fn dependencies(&self) -> Vec<&str> { vec!["turret"] }
//!
//!     fn build(&self, context: &PrefabContext) -> Result<Entity, String> {
//!         let turret = context.build("turret").map_err(|e| e.to_string())?;
//!         Ok(Entity::new()
//!             .with_component(Position::new(100.0, 100.0))
//!             .with_component(Motion::new(5.0))
//!             .with_child(&turret))
//!     }
//! }
//!
//! let mut registry = PrefabRegistry::new();
//! registry.register(Box::new(Turret)).unwrap();
//! registry.register(Box::new(Fighter)).unwrap();
//! registry.resolve().unwrap();
//!
//! let engine = Engine::new();
//! let fighter = registry.spawn("fighter", &engine).unwrap();
//! assert_eq!(fighter.child_count(), 1);
//! assert_eq!(engine.entity_count(), 2);
//! ```

/// Prefab traits and build context
pub mod api;

/// Prefab registry and dependency resolution
pub mod registry;

pub use api::{Prefab, PrefabContext, PREFAB_API_VERSION};
pub use registry::PrefabRegistry;
