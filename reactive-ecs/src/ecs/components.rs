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
//! Standard 2D components
//!
//! Plain data for entities living on a plane: a position with rotation, a
//! speed with its resolved per-axis velocity, and an optional pivot around
//! which an entity rotates its children. All three take part in snapshots.

use crate::ecs::{Component, Entity};
use serde::{Deserialize, Serialize};

/// Position and rotation in the parent's coordinate space
///
/// `rotation` is in degrees. Entities without a parent live in world space.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::components::Position;
///
/// let pos = Position::with_rotation(1.0, 2.0, 90.0);
/// assert_eq!(pos.x, 1.0);
/// assert!((pos.rotation_in_rad() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
    /// Rotation in degrees
    pub rotation: f64,
}

impl Position {
    /// Create a new position with no rotation
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y, rotation: 0.0 }
    }

    /// Create a new position with a rotation in degrees
    pub fn with_rotation(x: f64, y: f64, rotation: f64) -> Self {
        Position { x, y, rotation }
    }

    /// Rotation converted to radians
    pub fn rotation_in_rad(&self) -> f64 {
        self.rotation.to_radians()
    }

    /// Resolve the world-space position of an entity
    ///
    /// Folds the parent chain from leaf to root. At each parent the
    /// accumulated point is rotated by the parent's rotation around the
    /// parent's [`Pivot`] (origin if it has none), translated by the parent
    /// position, and the rotations are summed. The fold stops at the first
    /// ancestor without a position. Returns `None` if the entity itself has
    /// no position.
    pub fn resolve_world(entity: &Entity) -> Option<Position> {
        let mut result = *entity.get_component::<Position>()?.borrow();
        let mut current = entity.parent();

        while let Some(parent) = current {
            let origin = match parent.get_component::<Position>() {
                Some(position) => *position.borrow(),
                None => break,
            };
            let pivot = parent
                .get_component::<Pivot>()
                .map(|pivot| *pivot.borrow())
                .unwrap_or_default();

            let (sin, cos) = origin.rotation_in_rad().sin_cos();
            let dx = result.x - pivot.x;
            let dy = result.y - pivot.y;

            result.x = origin.x + dx * cos - dy * sin;
            result.y = origin.y + dx * sin + dy * cos;
            result.rotation += origin.rotation;

            current = parent.parent();
        }

        Some(result)
    }
}

impl Component for Position {
    fn to_snapshot(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

/// Speed and its resolved per-axis velocity
///
/// `velocity` is the scalar speed. `velocity_x` and `velocity_y` are what
/// movement actually applies, usually derived with [`Motion::steer`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    /// Scalar speed
    pub velocity: f64,
    /// Horizontal velocity
    pub velocity_x: f64,
    /// Vertical velocity
    pub velocity_y: f64,
}

impl Motion {
    /// Create a motion with a speed and no heading yet
    pub fn new(velocity: f64) -> Self {
        Motion {
            velocity,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    /// Point the velocity along `rotation` degrees, scaled by `throttle`
    ///
    /// A throttle of `1.0` moves at full speed, `0.0` stops and negative
    /// values reverse.
    pub fn steer(&mut self, rotation: f64, throttle: f64) {
        let (sin, cos) = rotation.to_radians().sin_cos();
        let speed = self.velocity * throttle;
        self.velocity_x = speed * cos;
        self.velocity_y = speed * sin;
    }

    /// Zero the per-axis velocity
    pub fn stop(&mut self) {
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
    }
}

impl Component for Motion {
    fn to_snapshot(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

/// Point, in local coordinates, that children rotate around
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pivot {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl Pivot {
    /// Create a new pivot
    pub fn new(x: f64, y: f64) -> Self {
        Pivot { x, y }
    }
}

impl Component for Pivot {
    fn to_snapshot(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}
