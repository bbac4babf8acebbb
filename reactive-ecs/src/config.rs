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
//! Engine configuration
//!
//! Configuration is plain data with builder-style setters. It can also be
//! read from the process environment:
//!
//! - `REACTIVE_ECS_AUTO_REMOVE_DESTROYED`: `true|false|1|0|yes|no|on|off`
//! - `REACTIVE_ECS_ENTITY_CAPACITY`: unsigned integer
//!
//! Missing keys keep their defaults.

use crate::error::{EcsError, Result};

/// Environment key for [`EngineConfig::auto_remove_destroyed`]
pub const AUTO_REMOVE_DESTROYED_ENV: &str = "REACTIVE_ECS_AUTO_REMOVE_DESTROYED";

/// Environment key for [`EngineConfig::entity_capacity`]
pub const ENTITY_CAPACITY_ENV: &str = "REACTIVE_ECS_ENTITY_CAPACITY";

/// Settings for an [`Engine`](crate::ecs::Engine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Unregister entities automatically when they are destroyed
    pub auto_remove_destroyed: bool,
    /// Number of entities to reserve room for up front
    pub entity_capacity: usize,
}

impl EngineConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether destroyed entities are unregistered automatically
    pub fn with_auto_remove_destroyed(mut self, enabled: bool) -> Self {
        self.auto_remove_destroyed = enabled;
        self
    }

    /// Set the initial entity capacity
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(AUTO_REMOVE_DESTROYED_ENV) {
            config.auto_remove_destroyed = parse_bool(AUTO_REMOVE_DESTROYED_ENV, &value)?;
        }

        if let Some(value) = lookup(ENTITY_CAPACITY_ENV) {
            config.entity_capacity = value.trim().parse().map_err(|_| EcsError::InvalidConfig {
                key: ENTITY_CAPACITY_ENV.to_string(),
                value: value.clone(),
            })?;
        }

        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            auto_remove_destroyed: true,
            entity_capacity: 0,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EcsError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
