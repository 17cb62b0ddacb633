#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Geometry provider backed by built-in maps and TOML floor-plan catalogs.

mod builtin;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use firebot_core::{FloorPlan, GeometryProvider, MapId, Rect};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub use builtin::BUILTIN_MAPS;

/// Catalog format version understood by [`FloorPlanCatalog`].
pub const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// Failures raised while loading a floor-plan catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read floor-plan catalog at {path}")]
    Io {
        /// Location of the catalog.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog is not valid TOML or does not match the schema.
    #[error("failed to parse floor-plan catalog")]
    Parse(#[from] toml::de::Error),
    /// The catalog declares a format version this crate does not read.
    #[error("unsupported floor-plan catalog version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the catalog.
        found: u32,
        /// Version this crate reads.
        expected: u32,
    },
    /// Two entries share an identifier.
    #[error("floor-plan catalog contains duplicate map `{0}`")]
    DuplicateMap(MapId),
    /// A map has a zero or negative extent.
    #[error("map `{0}` has empty bounds")]
    EmptyBounds(MapId),
    /// A map has a bound or obstacle with a non-finite coordinate.
    #[error("map `{0}` has non-finite geometry")]
    NonFiniteGeometry(MapId),
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    version: u32,
    #[serde(default)]
    maps: Vec<MapEntry>,
}

#[derive(Debug, Deserialize)]
struct MapEntry {
    id: String,
    bounds: Rect,
    #[serde(default)]
    obstacles: Vec<Rect>,
}

/// Floor plans indexed by identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloorPlanCatalog {
    plans: BTreeMap<MapId, FloorPlan>,
}

impl FloorPlanCatalog {
    /// Creates a catalog holding no maps.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the kitchen, living room and office maps.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            plans: builtin::builtin_plans()
                .into_iter()
                .map(|plan| (plan.id.clone(), plan))
                .collect(),
        }
    }

    /// Parses a catalog document.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(contents)?;
        if document.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: document.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }

        let mut catalog = Self::empty();
        for entry in document.maps {
            let id = MapId::new(entry.id);
            if !entry.bounds.is_finite() || !entry.obstacles.iter().all(Rect::is_finite) {
                return Err(CatalogError::NonFiniteGeometry(id));
            }
            if entry.bounds.width() <= 0.0 || entry.bounds.height() <= 0.0 {
                return Err(CatalogError::EmptyBounds(id));
            }
            if catalog.plans.contains_key(&id) {
                return Err(CatalogError::DuplicateMap(id));
            }
            let _ = catalog.plans.insert(
                id.clone(),
                FloorPlan {
                    id,
                    bounds: entry.bounds,
                    obstacles: entry.obstacles,
                },
            );
        }
        Ok(catalog)
    }

    /// Reads and parses a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Adds every map of `other`, replacing maps that share an identifier.
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        for (id, plan) in other.plans {
            if self.plans.insert(id.clone(), plan).is_some() {
                debug!(map = %id, "catalog entry overrides an existing map");
            }
        }
        self
    }

    /// Floor plan registered under `map`.
    #[must_use]
    pub fn plan(&self, map: &MapId) -> Option<&FloorPlan> {
        self.plans.get(map)
    }

    /// Number of maps in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Reports whether the catalog holds no maps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl GeometryProvider for FloorPlanCatalog {
    fn obstacles(&self, map: &MapId) -> Option<Vec<Rect>> {
        self.plan(map).map(|plan| plan.obstacles.clone())
    }

    fn bounds(&self, map: &MapId) -> Option<Rect> {
        self.plan(map).map(|plan| plan.bounds)
    }

    fn map_ids(&self) -> Vec<MapId> {
        self.plans.keys().cloned().collect()
    }
}
