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
//! Hierarchy example
//!
//! Shows parent/child trees: world positions resolved through rotating
//! parents, subtree walks and recursive destruction.

use reactive_ecs::ecs::components::{Pivot, Position};
use reactive_ecs::ecs::{Component, Engine, Entity, Traversal};

struct Name(&'static str);
impl Component for Name {}

fn name_of(entity: &Entity) -> &'static str {
    entity
        .get_component::<Name>()
        .map(|name| name.borrow().0)
        .unwrap_or("?")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = Engine::new();

    let left_gun = Entity::new()
        .with_component(Name("left gun"))
        .with_component(Position::new(-10.0, 0.0));
    let right_gun = Entity::new()
        .with_component(Name("right gun"))
        .with_component(Position::new(10.0, 0.0));
    let turret = Entity::new()
        .with_component(Name("turret"))
        .with_component(Position::with_rotation(0.0, -20.0, 90.0))
        .with_child(&left_gun)
        .with_child(&right_gun);
    let ship = Entity::new()
        .with_component(Name("ship"))
        .with_component(Position::with_rotation(400.0, 300.0, 45.0))
        .with_component(Pivot::new(0.0, 0.0))
        .with_child(&turret);

    engine.add_entity(&ship);
    println!("registered {} entities", engine.entity_count());

    let traversal = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pre".to_string())
        .parse::<Traversal>()?;

    ship.walk(traversal, |entity| {
        if let Some(world) = Position::resolve_world(entity) {
            println!(
                "{:>10}: ({:8.2}, {:8.2}) rotation {:6.2}",
                name_of(entity),
                world.x,
                world.y,
                world.rotation
            );
        }
        true
    });

    turret.destroyed().connect(|event| {
        println!("{} destroyed", name_of(&event.entity));
    });
    turret.destroy();

    println!(
        "ship has {} children, {} entities registered",
        ship.child_count(),
        engine.entity_count()
    );
    Ok(())
}
