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
//! Prefab registry
//!
//! The registry stores prefabs by name and:
//! - Rejects duplicates and incompatible API versions at registration
//! - Checks that every declared dependency is registered
//! - Orders prefabs by dependency and detects cycles

use crate::ecs::{Engine, Entity};
use crate::error::{EcsError, Result};
use crate::prefab::api::{Prefab, PrefabContext, PREFAB_API_VERSION};
use log::{debug, trace, warn};
use semver::Version;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Registry of named prefabs
pub struct PrefabRegistry {
    /// Registered prefabs indexed by name
    prefabs: HashMap<String, Box<dyn Prefab>>,
    /// Dependency order, dependencies first
    load_order: Vec<String>,
    /// Whether the dependency graph was checked since the last change
    resolved: bool,
}

impl PrefabRegistry {
    /// Create a new prefab registry
    pub fn new() -> Self {
        PrefabRegistry {
            prefabs: HashMap::new(),
            load_order: Vec::new(),
            resolved: false,
        }
    }

    /// Register a prefab
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicatePrefab`] if the name is taken
    /// - [`EcsError::IncompatiblePrefab`] if its API version does not match
    pub fn register(&mut self, prefab: Box<dyn Prefab>) -> Result<()> {
        let name = prefab.name().to_string();

        if self.prefabs.contains_key(&name) {
            return Err(EcsError::DuplicatePrefab { name });
        }

        let api_version = prefab.api_version();
        if !is_version_compatible(api_version, PREFAB_API_VERSION) {
            return Err(EcsError::IncompatiblePrefab {
                name,
                version: api_version.to_string(),
                engine: PREFAB_API_VERSION.to_string(),
            });
        }

        debug!("registered prefab '{}' v{}", name, prefab.version());
        self.prefabs.insert(name, prefab);
        self.resolved = false;
        Ok(())
    }

    /// Remove a prefab by name
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Prefab>> {
        let removed = self.prefabs.remove(name);
        if removed.is_some() {
            self.resolved = false;
        }
        removed
    }

    /// Check dependencies and compute the load order
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingPrefabDependency`] for unregistered dependencies
    /// - [`EcsError::CircularPrefabDependency`] if the graph has a cycle
    pub fn resolve(&mut self) -> Result<()> {
        self.load_order = self.dependency_order()?;
        self.resolved = true;
        Ok(())
    }

    fn dependency_order(&self) -> Result<Vec<String>> {
        let mut dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, prefab) in &self.prefabs {
            let deps: Vec<String> = prefab
                .dependencies()
                .iter()
                .map(|s| s.to_string())
                .collect();

            for dep in &deps {
                if !self.prefabs.contains_key(dep) {
                    return Err(EcsError::MissingPrefabDependency {
                        name: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            dependencies.insert(name.clone(), deps);
        }

        topological_sort(&dependencies)
    }

    /// Build an entity from a prefab without registering it
    ///
    /// Resolves the registry first if it changed since the last resolve.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnknownPrefab`] if no prefab has that name
    /// - Any error from [`PrefabRegistry::resolve`]
    /// - [`EcsError::PrefabBuild`] if the prefab fails
    pub fn build(&self, name: &str, engine: &Engine) -> Result<Entity> {
        if !self.resolved {
            self.dependency_order()?;
        }
        self.build_resolved(name, engine)
    }

    pub(crate) fn build_resolved(&self, name: &str, engine: &Engine) -> Result<Entity> {
        let prefab = match self.prefabs.get(name) {
            Some(prefab) => prefab.as_ref(),
            None => {
                warn!("prefab '{}' not found", name);
                return Err(EcsError::UnknownPrefab {
                    name: name.to_string(),
                });
            }
        };

        let context = PrefabContext::new(engine, self, prefab);
        let entity = prefab.build(&context).map_err(|reason| EcsError::PrefabBuild {
            name: name.to_string(),
            reason,
        })?;

        trace!("built {} from prefab '{}'", entity.id(), name);
        Ok(entity)
    }

    /// Build an entity from a prefab and register it with the engine
    ///
    /// # Errors
    ///
    /// Same as [`PrefabRegistry::build`].
    pub fn spawn(&self, name: &str, engine: &Engine) -> Result<Entity> {
        let entity = self.build(name, engine)?;
        engine.add_entity(&entity);
        Ok(entity)
    }

    /// Get a prefab by name
    pub fn get(&self, name: &str) -> Option<&dyn Prefab> {
        self.prefabs.get(name).map(|p| p.as_ref())
    }

    /// Check whether a prefab is registered
    pub fn contains(&self, name: &str) -> bool {
        self.prefabs.contains_key(name)
    }

    /// Get the number of registered prefabs
    pub fn prefab_count(&self) -> usize {
        self.prefabs.len()
    }

    /// Check whether the registry was resolved since its last change
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Get the dependency order computed by the last resolve
    ///
    /// Dependencies come before their dependents. Empty until resolved.
    pub fn load_order(&self) -> &[String] {
        if self.resolved {
            &self.load_order
        } else {
            &[]
        }
    }
}

impl Default for PrefabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a prefab API version is compatible with the crate
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For major version 0, minor versions must match
/// - For major version >= 1, the prefab minor version can be lower
/// - Patch version is ignored
fn is_version_compatible(prefab_version: &str, engine_version: &str) -> bool {
    let (prefab_ver, engine_ver) =
        match (Version::parse(prefab_version), Version::parse(engine_version)) {
            (Ok(prefab), Ok(engine)) => (prefab, engine),
            _ => return false,
        };

    if prefab_ver.major != engine_ver.major {
        return false;
    }

    if prefab_ver.major != 0 {
        prefab_ver.minor <= engine_ver.minor
    } else {
        prefab_ver.minor == engine_ver.minor
    }
}

/// Kahn's algorithm over the dependency graph
///
/// Ready prefabs are taken in name order so the result is deterministic.
fn topological_sort(dependencies: &BTreeMap<String, Vec<String>>) -> Result<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (name, deps) in dependencies {
        in_degree.insert(name, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(name);
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut sorted = Vec::with_capacity(dependencies.len());

    while let Some(name) = queue.pop_front() {
        sorted.push(name.to_string());

        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if sorted.len() != dependencies.len() {
        return Err(EcsError::CircularPrefabDependency);
    }

    Ok(sorted)
}
