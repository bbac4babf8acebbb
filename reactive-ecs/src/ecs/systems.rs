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
//! Standard systems
//!
//! [`MovementSystem`] integrates [`Motion`] into [`Position`] for every
//! entity matching [`MovementNode`], wrapping coordinates around the edges
//! of a rectangular world.

use crate::ecs::components::{Motion, Position};
use crate::ecs::{Engine, NodeList, System};

crate::define_node! {
    /// Entities that move: they hold both a [`Motion`] and a [`Position`]
    pub struct MovementNode {
        /// Velocity applied every tick
        motion: Motion,
        /// Position updated every tick
        position: Position,
    }
}

/// Moves every [`MovementNode`] by its per-axis velocity
///
/// Coordinates wrap into `[0, world_width]` and `[0, world_height]`.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::components::{Motion, Position};
/// use reactive_ecs::ecs::systems::MovementSystem;
/// use reactive_ecs::ecs::{Engine, Entity};
///
/// let engine = Engine::new();
/// engine.add_system(MovementSystem::new(100.0, 100.0), 3);
///
/// let mut motion = Motion::new(10.0);
/// motion.steer(0.0, 1.0);
/// let ship = Entity::new()
///     .with_component(Position::new(95.0, 0.0))
///     .with_component(motion);
/// engine.add_entity(&ship);
///
/// engine.update(1.0);
/// assert_eq!(ship.get_component::<Position>().unwrap().borrow().x, 5.0);
/// ```
#[derive(Debug)]
pub struct MovementSystem {
    world_width: f64,
    world_height: f64,
    nodes: Option<NodeList<MovementNode>>,
}

impl MovementSystem {
    /// Create a new movement system for a world of the given size
    pub fn new(world_width: f64, world_height: f64) -> Self {
        MovementSystem {
            world_width,
            world_height,
            nodes: None,
        }
    }

    /// Get the world width
    pub fn world_width(&self) -> f64 {
        self.world_width
    }

    /// Get the world height
    pub fn world_height(&self) -> f64 {
        self.world_height
    }

    /// Number of nodes the system currently moves
    pub fn node_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, NodeList::len)
    }
}

impl System for MovementSystem {
    fn add_to_engine(&mut self, engine: &Engine) {
        self.nodes = Some(engine.get_node_list::<MovementNode>());
    }

    fn remove_from_engine(&mut self, _engine: &Engine) {
        self.nodes = None;
    }

    fn update(&mut self, time: f64) {
        let nodes = match &self.nodes {
            Some(nodes) => nodes,
            None => return,
        };

        for node in nodes {
            let motion = *node.motion.borrow();
            let mut position = node.position.borrow_mut();
            position.x = wrap(position.x + motion.velocity_x * time, self.world_width);
            position.y = wrap(position.y + motion.velocity_y * time, self.world_height);
        }
    }

    fn name(&self) -> &str {
        "MovementSystem"
    }
}

/// Wrap a coordinate into `[0, max]`
///
/// Values already inside the range, `max` included, are left untouched.
/// A non-positive `max` disables wrapping.
pub fn wrap(value: f64, max: f64) -> f64 {
    if max <= 0.0 || (0.0..=max).contains(&value) {
        value
    } else {
        value.rem_euclid(max)
    }
}
