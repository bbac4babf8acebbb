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
//! Movement example
//!
//! Builds a few ships from prefabs, steers them with a custom system and
//! lets the standard movement system wrap them around the world edges.
//!
//! Run with `RUST_LOG=debug` to see engine logging.

use reactive_ecs::ecs::components::{Motion, Position};
use reactive_ecs::ecs::systems::{MovementNode, MovementSystem};
use reactive_ecs::ecs::{Engine, Entity, NodeList, System};
use reactive_ecs::prefab::{Prefab, PrefabContext, PrefabRegistry};
use reactive_ecs::EngineConfig;

const WORLD_WIDTH: f64 = 800.0;
const WORLD_HEIGHT: f64 = 600.0;

struct Ship;

impl Prefab for Ship {
    fn name(&self) -> &str {
        "ship"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
        Ok(Entity::new()
            .with_component(Position::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0))
            .with_component(Motion::new(120.0)))
    }
}

/// Turns every ship a little each tick and keeps it at full throttle
struct Autopilot {
    turn_rate: f64,
    nodes: Option<NodeList<MovementNode>>,
}

impl System for Autopilot {
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
            let mut position = node.position.borrow_mut();
            position.rotation = (position.rotation + self.turn_rate * time) % 360.0;
            node.motion.borrow_mut().steer(position.rotation, 1.0);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = Engine::with_config(EngineConfig::from_env()?);
    engine.add_system(Autopilot { turn_rate: 45.0, nodes: None }, 1);
    engine.add_system(MovementSystem::new(WORLD_WIDTH, WORLD_HEIGHT), 3);

    let mut prefabs = PrefabRegistry::new();
    prefabs.register(Box::new(Ship))?;
    prefabs.resolve()?;

    let ships: Vec<Entity> = (0..3)
        .map(|_| prefabs.spawn("ship", &engine))
        .collect::<Result<_, _>>()?;

    for (i, ship) in ships.iter().enumerate() {
        if let Some(position) = ship.get_component::<Position>() {
            position.borrow_mut().rotation = i as f64 * 120.0;
        }
    }

    let frame = 1.0 / 60.0;
    for tick in 0..=180 {
        engine.update(frame);

        if tick % 60 == 0 {
            println!("t = {:.1}s", tick as f64 * frame);
            for ship in &ships {
                if let Some(position) = ship.get_component::<Position>() {
                    let position = position.borrow();
                    println!(
                        "  {}: ({:7.2}, {:7.2}) heading {:6.2}",
                        ship.id(),
                        position.x,
                        position.y,
                        position.rotation
                    );
                }
            }
        }
    }

    ships[0].destroy();
    println!(
        "after destroying {}: {} entities registered",
        ships[0].id(),
        engine.entity_count()
    );

    println!("{}", engine.snapshot().to_json()?);
    Ok(())
}
