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
//! Component kinds and type-erased component storage
//!
//! Components are plain data attached to entities. An entity holds at most
//! one instance per component kind; the kind is the component's Rust type,
//! identified at runtime through its [`TypeId`].

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Shared, mutable handle to a component instance stored on an entity
pub type ComponentRef<T> = Rc<RefCell<T>>;

/// Trait that all components must implement
///
/// Components should be plain data structures without behavior. Override
/// [`Component::to_snapshot`] to include the component's data in entity
/// snapshots.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::Component;
///
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: Any {
    /// Serialise this component for a flat snapshot
    ///
    /// Returns `None` for components that do not take part in snapshots.
    fn to_snapshot(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Runtime identifier of a component kind
///
/// Equality and hashing only consider the underlying [`TypeId`]; the name
/// is kept for diagnostics and snapshots.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Get the kind of component type `T`
    pub fn of<T: Component>() -> Self {
        ComponentKind {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Get the type ID backing this kind
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the type name without its module path
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.short_name())
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Object-safe view over a `RefCell<T>` holding a component
trait ComponentCell {
    fn kind(&self) -> ComponentKind;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
    fn snapshot(&self) -> Option<serde_json::Value>;
}

impl<T: Component> ComponentCell for RefCell<T> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<T>()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn snapshot(&self) -> Option<serde_json::Value> {
        // A component mutably borrowed elsewhere is reported as absent data.
        self.try_borrow().ok().and_then(|component| component.to_snapshot())
    }
}

/// A type-erased component instance
///
/// Carried by component events and used internally as the storage cell of
/// an entity. Cloning shares the same instance.
#[derive(Clone)]
pub struct AnyComponent(Rc<dyn ComponentCell>);

impl AnyComponent {
    pub(crate) fn from_ref<T: Component>(component: ComponentRef<T>) -> Self {
        AnyComponent(component)
    }

    /// Get the kind of the wrapped component
    pub fn kind(&self) -> ComponentKind {
        self.0.kind()
    }

    /// Check whether the wrapped component is of type `T`
    pub fn is<T: Component>(&self) -> bool {
        self.kind() == ComponentKind::of::<T>()
    }

    /// Recover the typed handle if the wrapped component is of type `T`
    pub fn downcast<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.0.clone().into_any().downcast::<RefCell<T>>().ok()
    }

    /// Check whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &AnyComponent) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const u8,
            Rc::as_ptr(&other.0) as *const u8,
        )
    }

    /// Serialise the wrapped component, if it supports snapshots
    pub fn snapshot(&self) -> Option<serde_json::Value> {
        self.0.snapshot()
    }
}

impl fmt::Debug for AnyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyComponent").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    impl Component for Health {
        fn to_snapshot(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!(self.0))
        }
    }

    struct Marker;

    impl Component for Marker {}

    #[test]
    fn test_kind_identity() {
        assert_eq!(ComponentKind::of::<Health>(), ComponentKind::of::<Health>());
        assert_ne!(ComponentKind::of::<Health>(), ComponentKind::of::<Marker>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(ComponentKind::of::<Health>().short_name(), "Health");
        assert_eq!(ComponentKind::of::<Marker>().to_string(), "Marker");
    }

    #[test]
    fn test_downcast() {
        let health = Rc::new(RefCell::new(Health(10)));
        let erased = AnyComponent::from_ref(health.clone());

        assert!(erased.is::<Health>());
        assert!(!erased.is::<Marker>());
        assert!(erased.downcast::<Marker>().is_none());

        let typed = erased.downcast::<Health>().unwrap();
        assert!(Rc::ptr_eq(&typed, &health));
    }

    #[test]
    fn test_ptr_eq() {
        let a = AnyComponent::from_ref(Rc::new(RefCell::new(Health(1))));
        let b = AnyComponent::from_ref(Rc::new(RefCell::new(Health(1))));
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_snapshot() {
        let health = AnyComponent::from_ref(Rc::new(RefCell::new(Health(7))));
        let marker = AnyComponent::from_ref(Rc::new(RefCell::new(Marker)));

        assert_eq!(health.snapshot(), Some(serde_json::json!(7)));
        assert_eq!(marker.snapshot(), None);
    }
}
