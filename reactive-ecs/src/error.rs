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
//! Crate error type
//!
//! Core ECS operations never fail: misuse such as removing an absent
//! component is a silent no-op. Errors only surface from configuration,
//! traversal strategy parsing, the prefab registry and snapshot encoding.

use thiserror::Error;

/// Errors raised by the supporting utilities of the crate
#[derive(Debug, Error)]
pub enum EcsError {
    /// A tree walk strategy name was not recognised.
    #[error("unknown traversal strategy '{name}', expected one of: pre, post, breadth")]
    UnknownTraversal {
        /// The rejected name
        name: String,
    },

    /// A configuration value could not be parsed.
    #[error("invalid value '{value}' for configuration key {key}")]
    InvalidConfig {
        /// The configuration key
        key: String,
        /// The rejected value
        value: String,
    },

    /// A prefab with the same name is already registered.
    #[error("prefab '{name}' is already registered")]
    DuplicatePrefab {
        /// Name of the prefab
        name: String,
    },

    /// A prefab targets a prefab API version this crate does not provide.
    #[error("prefab '{name}' requires API version {version}, but engine provides {engine}")]
    IncompatiblePrefab {
        /// Name of the prefab
        name: String,
        /// API version the prefab was written against
        version: String,
        /// API version provided by the crate
        engine: String,
    },

    /// No prefab is registered under the name.
    #[error("prefab '{name}' not found")]
    UnknownPrefab {
        /// Name that was looked up
        name: String,
    },

    /// A prefab depends on a prefab that is not registered.
    #[error("prefab '{name}' depends on '{dependency}' which is not registered")]
    MissingPrefabDependency {
        /// Name of the dependent prefab
        name: String,
        /// Name of the missing dependency
        dependency: String,
    },

    /// The prefab dependency graph contains a cycle.
    #[error("circular dependency detected in prefab graph")]
    CircularPrefabDependency,

    /// A prefab failed to build its entity.
    #[error("prefab '{name}' failed to build: {reason}")]
    PrefabBuild {
        /// Name of the prefab
        name: String,
        /// Failure reported by the prefab
        reason: String,
    },

    /// A snapshot could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T, E = EcsError> = std::result::Result<T, E>;
