//! Reactive Entity Component System core
//!
//! This module provides the ECS runtime:
//! - Entities holding components and forming parent/child trees
//! - Node descriptors and the families that track matching entities
//! - Observable node lists iterated by systems
//! - The engine driving priority ordered system updates

mod component;
mod engine;
mod entity;
mod family;
mod node;
mod node_list;
mod scheduler;
mod signal;
mod snapshot;
mod system;

/// Standard 2D components
pub mod components;

/// Standard systems built on the components
pub mod systems;

pub use component::{AnyComponent, Component, ComponentKind, ComponentRef};
pub use engine::Engine;
pub use entity::{
    ChildAdded, ChildRemoved, ComponentAdded, ComponentRemoved, Destroyed, Entity, EntityId,
    Traversal,
};
pub use family::Family;
pub use node::Node;
pub use node_list::{NodeIter, NodeList};
pub use signal::{Signal, SlotId};
pub use snapshot::{EntitySnapshot, WorldSnapshot};
pub use system::{System, SystemId};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Motion, Position};
    use crate::ecs::systems::MovementNode;

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.entity_count(), 0);
        assert_eq!(engine.system_count(), 0);
    }

    #[test]
    fn test_entity_registration() {
        let engine = Engine::new();
        let entity = Entity::new()
            .with_component(Position::new(0.0, 0.0))
            .with_component(Motion::new(10.0));

        engine.add_entity(&entity);
        assert_eq!(engine.entity_count(), 1);
        assert_eq!(engine.get_node_list::<MovementNode>().len(), 1);
    }
}
