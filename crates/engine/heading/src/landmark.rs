//! Landmark catalog and scene coordinate frame
//!
//! The catalog and the coordinate convention belong to the scene layer.
//! This module only reads them to work out where a landmark lies on the
//! compass.

use std::collections::BTreeMap;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::math;

/// Landmark coordinate field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One landmark as exported from the scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkEntry {
    /// Display label
    #[serde(rename = "displayJP", default)]
    pub label: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    /// Marker radius in scene units
    #[serde(default)]
    pub radius: Option<f64>,
    /// Marker height above ground
    #[serde(default)]
    pub height_offset: Option<f64>,
}

impl LandmarkEntry {
    /// Create an entry on the scene plane (`x`, `y` as exported)
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Value of a coordinate field; absent fields read as zero
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
        .unwrap_or(0.0)
    }
}

/// Which landmark fields feed the scene's X and Z axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordMap {
    /// Field used for scene X (`x` when unset)
    pub x_key: Option<Axis>,
    /// Field used for scene Z (`z`, falling back to `y`, when unset)
    pub z_key: Option<Axis>,
    pub invert_x: bool,
    pub invert_z: bool,
}

impl CoordMap {
    /// Mapping used by the navigation screen: exported `y` is scene Z, flipped
    pub fn navigation() -> Self {
        Self {
            x_key: Some(Axis::X),
            z_key: Some(Axis::Y),
            invert_x: false,
            invert_z: true,
        }
    }

    /// Scene-plane position of a landmark under this mapping
    pub fn project(&self, entry: &LandmarkEntry) -> DVec2 {
        let base_x = match self.x_key {
            Some(axis) => entry.axis(axis),
            None => entry.x.unwrap_or(0.0),
        };
        let base_z = match self.z_key {
            Some(axis) => entry.axis(axis),
            None => entry.z.or(entry.y).unwrap_or(0.0),
        };

        DVec2::new(
            if self.invert_x { -base_x } else { base_x },
            if self.invert_z { -base_z } else { base_z },
        )
    }
}

/// Per-axis scene scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarScale {
    pub sx: f64,
    pub sz: f64,
}

impl Default for PlanarScale {
    fn default() -> Self {
        Self { sx: 1.0, sz: 1.0 }
    }
}

/// Everything needed to turn a landmark into a compass bearing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkFrame {
    pub coord_map: CoordMap,
    pub scale: PlanarScale,
    /// Scene yaw rotation in radians
    pub yaw_rad: f64,
}

impl LandmarkFrame {
    /// Frame used by the navigation screen
    pub fn navigation() -> Self {
        Self {
            coord_map: CoordMap::navigation(),
            ..Default::default()
        }
    }

    /// Scaled scene-plane position of a landmark
    pub fn project(&self, entry: &LandmarkEntry) -> DVec2 {
        self.coord_map.project(entry) * DVec2::new(self.scale.sx, self.scale.sz)
    }

    /// Compass bearing of a landmark, in `[0, 360)`
    pub fn bearing(&self, entry: &LandmarkEntry) -> f64 {
        math::planar_bearing(self.project(entry), self.yaw_rad)
    }
}

/// Read-only set of landmarks keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkCatalog {
    entries: BTreeMap<String, LandmarkEntry>,
}

impl LandmarkCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the scene's landmark JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the scene's landmark JSON from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builder-style insert, for catalogs assembled in code
    pub fn with(mut self, key: impl Into<String>, entry: LandmarkEntry) -> Self {
        self.entries.insert(key.into(), entry);
        self
    }

    /// Look up a landmark
    pub fn get(&self, key: &str) -> Option<&LandmarkEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All landmarks in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LandmarkEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `(key, label)` pairs for a landmark picker
    pub fn options(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(key, entry)| {
                let label = if entry.label.is_empty() {
                    key.to_string()
                } else {
                    entry.label.clone()
                };
                (key.to_string(), label)
            })
            .collect()
    }
}
