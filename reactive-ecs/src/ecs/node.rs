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
//! Node descriptors
//!
//! A node type declares the exact set of component kinds an entity must hold
//! and wraps one matching entity with typed access to those components.
//! Families use the descriptor to decide membership.

use crate::ecs::{ComponentKind, Entity};

/// Typed view over an entity that holds a fixed set of components
///
/// Each node type is its own descriptor: two node types requiring the same
/// kinds are still tracked by independent families.
///
/// Most node types are declared with [`define_node!`](crate::define_node).
pub trait Node: Sized + 'static {
    /// The component kinds an entity must hold to be wrapped by this node
    fn required() -> Vec<ComponentKind>;

    /// Wrap a matching entity
    ///
    /// Returns `None` if a required component is missing.
    fn from_entity(entity: &Entity) -> Option<Self>;

    /// The wrapped entity
    fn entity(&self) -> &Entity;

    /// Check whether `entity` currently holds every required kind
    ///
    /// Extra components beyond the requirement do not matter.
    fn matches(entity: &Entity) -> bool {
        Self::required().iter().all(|kind| entity.has_kind(*kind))
    }
}

/// Declare a node type with one typed component handle per required kind
///
/// The generated struct keeps the wrapped entity and exposes each component
/// as a public [`ComponentRef`](crate::ecs::ComponentRef) field. Required
/// kinds are listed in field order.
///
/// # Examples
///
/// ```
/// use reactive_ecs::define_node;
/// use reactive_ecs::ecs::{Component, Entity, Node};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// struct Armor(u32);
/// impl Component for Armor {}
///
/// define_node! {
///     /// Entities that can take damage
///     pub struct DamageNode {
///         health: Health,
///         armor: Armor,
///     }
/// }
///
/// let entity = Entity::new().with_component(Health(10)).with_component(Armor(2));
/// let node = DamageNode::from_entity(&entity).unwrap();
/// assert_eq!(node.health.borrow().0, 10);
/// assert_eq!(DamageNode::required().len(), 2);
/// ```
#[macro_export]
macro_rules! define_node {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $component:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            entity: $crate::ecs::Entity,
            $(
                $(#[$field_meta])*
                pub $field: $crate::ecs::ComponentRef<$component>,
            )*
        }

        impl $crate::ecs::Node for $name {
            fn required() -> ::std::vec::Vec<$crate::ecs::ComponentKind> {
                ::std::vec![$($crate::ecs::ComponentKind::of::<$component>()),*]
            }

            fn from_entity(entity: &$crate::ecs::Entity) -> ::std::option::Option<Self> {
                ::std::option::Option::Some($name {
                    entity: ::std::clone::Clone::clone(entity),
                    $($field: entity.get_component::<$component>()?,)*
                })
            }

            fn entity(&self) -> &$crate::ecs::Entity {
                &self.entity
            }
        }
    };
}
