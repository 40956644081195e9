//! Named custom feature mappings.
//!
//! A mapping is code, not state: persisted models only record the mapping name
//! and the host supplies a [`MappingRegistry`] to bind the implementation again
//! at load time.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ModelError;

mod flight_code;
pub use flight_code::FlightCodeMapping;

/// Derived numeric feature produced by a [`FeatureMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeature {
    pub special_feature: f32,
}

impl DerivedFeature {
    pub fn from_flag(flag: bool) -> Self {
        Self {
            special_feature: if flag { 1.0 } else { 0.0 },
        }
    }
}

/// Pure per-row feature computation keyed by a stable name.
pub trait FeatureMapper: Send + Sync {
    /// Registry name stored in persisted models.
    fn name(&self) -> &str;

    /// One-time setup, invoked by the registry when the mapper is registered.
    fn prepare(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Compute the derived feature for a flight code.
    ///
    /// `None` is an input-contract violation and must be rejected.
    fn map(&self, flight_code: Option<&str>) -> Result<DerivedFeature, ModelError>;
}

/// Host-populated lookup of mapping implementations by name.
#[derive(Clone, Default)]
pub struct MappingRegistry {
    mappers: BTreeMap<String, Arc<dyn FeatureMapper>>,
}

impl MappingRegistry {
    /// Registry with no mappings; loading any model against it fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in [`FlightCodeMapping`].
    pub fn with_builtin() -> Result<Self, ModelError> {
        let mut registry = Self::empty();
        registry.register(Arc::new(FlightCodeMapping))?;
        Ok(registry)
    }

    /// Prepare and store a mapper under its own name.
    pub fn register(&mut self, mapper: Arc<dyn FeatureMapper>) -> Result<(), ModelError> {
        let name = mapper.name().to_string();
        if self.mappers.contains_key(&name) {
            return Err(ModelError::DuplicateMapping { name });
        }
        mapper.prepare()?;
        tracing::debug!("Registered custom mapping {name}");
        self.mappers.insert(name, mapper);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn FeatureMapper>, ModelError> {
        self.mappers
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownCustomMapping {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
