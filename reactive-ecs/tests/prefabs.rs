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
//! Prefab registration, resolution and spawning

use reactive_ecs::ecs::components::{Motion, Pivot, Position};
use reactive_ecs::ecs::systems::MovementNode;
use reactive_ecs::ecs::{Engine, Entity};
use reactive_ecs::prefab::{Prefab, PrefabContext, PrefabRegistry, PREFAB_API_VERSION};
use reactive_ecs::EcsError;

struct Background;

impl Prefab for Background {
    fn name(&self) -> &str {
        "background"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
        Ok(Entity::new().with_component(Position::new(0.0, 0.0)))
    }
}

struct Gun;

impl Prefab for Gun {
    fn name(&self) -> &str {
        "gun"
    }

    fn version(&self) -> &str {
        "1.2.0"
    }

    fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
        Ok(Entity::new().with_component(Position::with_rotation(0.0, -12.0, 0.0)))
    }
}

struct Fighter {
    guns: usize,
}

impl Prefab for Fighter {
    fn name(&self) -> &str {
        "fighter"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn dependencies(&self) -> Vec<&str> {
        vec!["gun"]
    }

    fn build(&self, context: &PrefabContext) -> Result<Entity, String> {
        let fighter = Entity::new()
            .with_component(Position::new(400.0, 300.0))
            .with_component(Motion::new(150.0))
            .with_component(Pivot::new(16.0, 16.0));

        for _ in 0..self.guns {
            let gun = context.build("gun").map_err(|e| e.to_string())?;
            fighter.add_child(&gun);
        }
        Ok(fighter)
    }
}

/// Tries to build a prefab it never declared
struct Sneaky;

impl Prefab for Sneaky {
    fn name(&self) -> &str {
        "sneaky"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn build(&self, context: &PrefabContext) -> Result<Entity, String> {
        context.build("gun").map_err(|e| e.to_string())
    }
}

struct Future;

impl Prefab for Future {
    fn name(&self) -> &str {
        "future"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn api_version(&self) -> &str {
        "9.0.0"
    }

    fn build(&self, _context: &PrefabContext) -> Result<Entity, String> {
        Err("unreachable".to_string())
    }
}

fn registry() -> PrefabRegistry {
    let mut registry = PrefabRegistry::new();
    registry.register(Box::new(Fighter { guns: 2 })).unwrap();
    registry.register(Box::new(Gun)).unwrap();
    registry.register(Box::new(Background)).unwrap();
    registry
}

#[test]
fn test_resolve_orders_dependencies_first() {
    let mut registry = registry();
    registry.resolve().unwrap();

    let order = registry.load_order();
    let gun = order.iter().position(|name| name == "gun").unwrap();
    let fighter = order.iter().position(|name| name == "fighter").unwrap();
    assert!(gun < fighter);
    assert_eq!(order.len(), 3);
}

#[test]
fn test_spawn_registers_whole_subtree() {
    let registry = registry();
    let engine = Engine::new();
    let movers = engine.get_node_list::<MovementNode>();

    let fighter = registry.spawn("fighter", &engine).unwrap();

    assert_eq!(fighter.child_count(), 2);
    assert_eq!(engine.entity_count(), 3);
    assert_eq!(movers.len(), 1);
}

#[test]
fn test_build_does_not_register() {
    let registry = registry();
    let engine = Engine::new();

    let background = registry.build("background", &engine).unwrap();

    assert!(background.has_component::<Position>());
    assert_eq!(engine.entity_count(), 0);
}

#[test]
fn test_every_build_is_fresh() {
    let registry = registry();
    let engine = Engine::new();

    let first = registry.spawn("gun", &engine).unwrap();
    let second = registry.spawn("gun", &engine).unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.entity_count(), 2);
}

#[test]
fn test_undeclared_dependency_fails_build() {
    let mut registry = registry();
    registry.register(Box::new(Sneaky)).unwrap();

    let err = registry.spawn("sneaky", &Engine::new()).unwrap_err();
    match err {
        EcsError::PrefabBuild { name, reason } => {
            assert_eq!(name, "sneaky");
            assert!(reason.contains("gun"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_incompatible_prefab_rejected() {
    let mut registry = PrefabRegistry::new();
    let err = registry.register(Box::new(Future)).unwrap_err();

    assert!(matches!(
        err,
        EcsError::IncompatiblePrefab { ref engine, .. } if engine == PREFAB_API_VERSION
    ));
    assert!(!registry.contains("future"));
}

#[test]
fn test_registry_lookup() {
    let registry = registry();

    assert_eq!(registry.prefab_count(), 3);
    assert_eq!(registry.get("gun").unwrap().version(), "1.2.0");
    assert!(registry.get("cannon").is_none());
}
