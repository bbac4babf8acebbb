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
//! Node list membership driven through the engine
//!
//! An entity belongs to a node list exactly while it holds every component
//! the node type requires.

use reactive_ecs::define_node;
use reactive_ecs::ecs::components::{Motion, Pivot, Position};
use reactive_ecs::ecs::systems::MovementNode;
use reactive_ecs::ecs::{Engine, Entity, Node};
use std::cell::Cell;
use std::rc::Rc;

define_node! {
    struct AnchorNode {
        position: Position,
        pivot: Pivot,
    }
}

define_node! {
    /// Same kinds as MovementNode, declared in the opposite order
    struct ReversedMovementNode {
        position: Position,
        motion: Motion,
    }
}

fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    (count, move || sink.set(sink.get() + 1))
}

#[test]
fn test_membership_follows_components() {
    let engine = Engine::new();
    let nodes = engine.get_node_list::<MovementNode>();
    let entity = Entity::new();
    engine.add_entity(&entity);

    entity.add_component(Position::new(0.0, 0.0));
    assert!(nodes.is_empty());

    entity.add_component(Motion::new(1.0));
    assert_eq!(nodes.len(), 1);

    entity.remove_component::<Position>();
    assert!(nodes.is_empty());

    entity.add_component(Position::new(1.0, 1.0));
    entity.add_component(Pivot::new(0.0, 0.0));
    assert_eq!(nodes.len(), 1);
    assert!(nodes.contains(&entity));
}

#[test]
fn test_unrelated_component_does_not_churn_nodes() {
    let engine = Engine::new();
    let entity = Entity::new()
        .with_component(Position::new(0.0, 0.0))
        .with_component(Motion::new(1.0))
        .with_component(Pivot::new(1.0, 1.0));
    engine.add_entity(&entity);

    let nodes = engine.get_node_list::<MovementNode>();
    let (removed, on_removed) = counter();
    nodes.node_removed().connect(move |_| on_removed());

    entity.remove_component::<Pivot>();

    assert_eq!(removed.get(), 0);
    assert_eq!(nodes.len(), 1);
}

#[test]
fn test_replacing_component_refreshes_node() {
    let engine = Engine::new();
    let entity = Entity::new()
        .with_component(Position::new(0.0, 0.0))
        .with_component(Motion::new(1.0));
    engine.add_entity(&entity);
    let nodes = engine.get_node_list::<MovementNode>();

    entity.add_component(Motion::new(9.0));

    assert_eq!(nodes.len(), 1);
    let node = nodes.get(entity.id()).unwrap();
    assert_eq!(node.motion.borrow().velocity, 9.0);
}

#[test]
fn test_backfill_happens_once() {
    let engine = Engine::new();
    for i in 0..5 {
        let entity = Entity::new().with_component(Position::new(i as f64, 0.0));
        if i % 2 == 0 {
            entity.add_component(Pivot::new(0.0, 0.0));
        }
        engine.add_entity(&entity);
    }

    let first = engine.get_node_list::<AnchorNode>();
    let second = engine.get_node_list::<AnchorNode>();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert!(first.ptr_eq(&second));
}

#[test]
fn test_declaration_order_gives_independent_lists() {
    let engine = Engine::new();
    engine.add_entity(
        &Entity::new()
            .with_component(Position::new(0.0, 0.0))
            .with_component(Motion::new(1.0)),
    );

    let forward = engine.get_node_list::<MovementNode>();
    let reversed = engine.get_node_list::<ReversedMovementNode>();

    assert_eq!(forward.len(), 1);
    assert_eq!(reversed.len(), 1);
    assert_eq!(engine.family_count(), 2);
    assert_eq!(MovementNode::required().len(), ReversedMovementNode::required().len());
}

#[test]
fn test_children_join_node_lists() {
    let engine = Engine::new();
    let nodes = engine.get_node_list::<AnchorNode>();

    let turret = Entity::new()
        .with_component(Position::new(0.0, 1.0))
        .with_component(Pivot::new(0.0, 0.0));
    let ship = Entity::new().with_child(&turret);
    engine.add_entity(&ship);
    assert_eq!(nodes.len(), 1);

    ship.remove_child(&turret);
    assert!(nodes.is_empty());
    assert!(!engine.has_entity(&turret));
}

#[test]
fn test_node_events() {
    let engine = Engine::new();
    let nodes = engine.get_node_list::<MovementNode>();
    let (added, on_added) = counter();
    let (removed, on_removed) = counter();
    nodes.node_added().connect(move |_| on_added());
    nodes.node_removed().connect(move |_| on_removed());

    let entity = Entity::new()
        .with_component(Position::new(0.0, 0.0))
        .with_component(Motion::new(1.0));
    engine.add_entity(&entity);
    engine.add_entity(&entity);
    engine.remove_entity(&entity);

    assert_eq!(added.get(), 1);
    assert_eq!(removed.get(), 1);
}

#[test]
fn test_removing_components_while_iterating() {
    let engine = Engine::new();
    let entities: Vec<Entity> = (0..6)
        .map(|i| {
            Entity::new()
                .with_component(Position::new(i as f64, 0.0))
                .with_component(Motion::new(1.0))
        })
        .collect();
    for entity in &entities {
        engine.add_entity(entity);
    }

    let nodes = engine.get_node_list::<MovementNode>();
    let mut visited = 0;
    for node in &nodes {
        visited += 1;
        node.entity().remove_component::<Motion>();
    }

    assert_eq!(visited, 6);
    assert!(nodes.is_empty());
    assert_eq!(nodes.iter().count(), 0);
}

#[test]
fn test_mass_component_removal_keeps_remaining_nodes() {
    let engine = Engine::new();
    let nodes = engine.get_node_list::<MovementNode>();
    let entities: Vec<_> = (0..2000)
        .map(|_| {
            let entity = Entity::new()
                .with_component(Position::new(0.0, 0.0))
                .with_component(Motion::new(1.0));
            engine.add_entity(&entity);
            entity
        })
        .collect();
    assert_eq!(nodes.len(), entities.len());

    for (i, entity) in entities.iter().enumerate() {
        entity.remove_component::<Motion>();
        assert!(!nodes.contains(entity));
        if let Some(next) = entities.get(i + 1) {
            assert_eq!(nodes.get(next.id()).unwrap().entity(), next);
        }
    }

    assert!(nodes.is_empty());
    assert_eq!(nodes.iter().count(), 0);
    assert_eq!(engine.entity_count(), entities.len());
}
