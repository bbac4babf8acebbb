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
//! # Reactive ECS
//!
//! A single-threaded, reactive Entity Component System runtime.
//!
//! ## Features
//!
//! - **Entities**: Components keyed by type, parent/child trees, synchronous event channels
//! - **Node Lists**: Live collections of entities matching a component set, kept current incrementally
//! - **Systems**: Priority ordered per-tick behavior over node lists
//! - **Prefabs**: Named entity factories with dependency resolution
//! - **Snapshots**: Flat JSON dumps of the registered world
//!
//! ## Example
//!
//! ```rust
//! use reactive_ecs::ecs::components::{Motion, Position};
//! use reactive_ecs::ecs::systems::{MovementNode, MovementSystem};
//! use reactive_ecs::ecs::{Engine, Entity};
//!
//! let engine = Engine::new();
//! engine.add_system(MovementSystem::new(800.0, 600.0), 3);
//!
//! let ship = Entity::new()
//!     .with_component(Position::new(0.0, 0.0))
//!     .with_component(Motion::new(10.0));
//! engine.add_entity(&ship);
//!
//! let movers = engine.get_node_list::<MovementNode>();
//! assert_eq!(movers.len(), 1);
//!
//! ship.remove_component::<Motion>();
//! assert!(movers.is_empty());
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Engine configuration
pub mod config;

/// Crate error type
pub mod error;

/// Named entity factories
pub mod prefab;

pub use config::EngineConfig;
pub use ecs::{Engine, Entity, System};
pub use error::{EcsError, Result};
