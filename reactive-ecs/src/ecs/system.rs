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
//! System contract
//!
//! Systems hold the per-tick behavior of an application. They acquire their
//! node lists when added to an engine and iterate them on every update.

use crate::ecs::Engine;
use std::any::Any;
use std::fmt;

/// Handle identifying a registered system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(pub(crate) u64);

impl SystemId {
    /// Get the raw id value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System({})", self.0)
    }
}

/// Trait for units of behavior driven by [`Engine::update`]
///
/// Only `update` is required. The lifecycle hooks default to doing nothing.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::{Engine, System};
///
/// struct Clock {
///     elapsed: f64,
/// }
///
/// impl System for Clock {
///     fn update(&mut self, time: f64) {
///         self.elapsed += time;
///     }
/// }
///
/// let engine = Engine::new();
/// engine.add_system(Clock { elapsed: 0.0 }, 0);
/// engine.update(0.5);
/// engine.update(0.25);
///
/// let clock = engine.get_system::<Clock>().unwrap();
/// assert_eq!(clock.borrow().elapsed, 0.75);
/// ```
pub trait System: Any {
    /// Called once when the system is added, before it is scheduled
    ///
    /// This is where a system usually requests its node lists.
    fn add_to_engine(&mut self, _engine: &Engine) {}

    /// Called once when the system is removed
    fn remove_from_engine(&mut self, _engine: &Engine) {}

    /// Advance the system by `time`
    fn update(&mut self, time: f64);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
