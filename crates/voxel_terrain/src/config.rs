//! Terrain configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::MAX_LOD;
use crate::error::{Result, TerrainError};
use crate::octree::CollapseRule;
use crate::types::MaterialId;

/// Root configuration for a terrain store.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
  /// Directory holding `compiled-batch-*.optoctrees` files.
  pub data_dir: PathBuf,
  /// Level of detail of the dense grids (resolution `32 >> lod`).
  pub lod: u32,
  /// World size in octrees, per axis. `None` = unbounded.
  pub world_extent: WorldExtent,
  /// Pruning rule used when grids are written back into octrees.
  pub collapse_rule: CollapseRule,
  /// Brush defaults.
  pub brush: BrushConfig,
}

/// World size in octrees. Batches at the far edge hold fewer octrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorldExtent {
  pub x: Option<i32>,
  pub y: Option<i32>,
  pub z: Option<i32>,
}

/// Brush defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
  /// Brush radius in voxels.
  pub radius: f32,
  /// Blend factor of Smooth toward the neighbourhood mean (0..=1).
  pub strength: f32,
  /// Base period between stroke samples, in seconds.
  pub period_secs: f32,
  /// Half-width of the smoothing neighbourhood.
  pub blur_radius: i32,
  /// Maximum ray steps the eyedropper takes through empty voxels.
  pub eyedropper_retries: u32,
  /// Initially selected material.
  pub material: MaterialId,
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("."),
      lod: 0,
      world_extent: WorldExtent::default(),
      collapse_rule: CollapseRule::default(),
      brush: BrushConfig::default(),
    }
  }
}

impl Default for WorldExtent {
  fn default() -> Self {
    Self {
      x: Some(128),
      y: None,
      z: Some(128),
    }
  }
}

impl WorldExtent {
  pub const UNBOUNDED: Self = Self {
    x: None,
    y: None,
    z: None,
  };

  pub fn axes(&self) -> [Option<i32>; 3] {
    [self.x, self.y, self.z]
  }
}

impl Default for BrushConfig {
  fn default() -> Self {
    Self {
      radius: 4.0,
      strength: 1.0,
      period_secs: 0.1,
      blur_radius: 2,
      eyedropper_retries: 8,
      material: 1,
    }
  }
}

impl TerrainConfig {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    Self {
      data_dir: data_dir.into(),
      ..Self::default()
    }
  }

  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).map_err(|e| TerrainError::io(path, e))?;
    let mut config = Self::from_toml(&content)?;

    // Relative data directories resolve against the config file.
    if config.data_dir.is_relative() {
      if let Some(parent) = path.parent() {
        config.data_dir = parent.join(&config.data_dir);
      }
    }

    Ok(config)
  }

  /// Parse and validate configuration text.
  pub fn from_toml(content: &str) -> Result<Self> {
    let config: TerrainConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.lod > MAX_LOD {
      return Err(TerrainError::Config(format!(
        "lod must be at most {}, got {}",
        MAX_LOD, self.lod
      )));
    }
    for extent in self.world_extent.axes().into_iter().flatten() {
      if extent <= 0 {
        return Err(TerrainError::Config(format!(
          "world_extent axes must be positive, got {}",
          extent
        )));
      }
    }
    let brush = &self.brush;
    if !(brush.radius > 0.0) {
      return Err(TerrainError::Config(format!(
        "brush.radius must be positive, got {}",
        brush.radius
      )));
    }
    if !(0.0..=1.0).contains(&brush.strength) {
      return Err(TerrainError::Config(format!(
        "brush.strength must be within 0..=1, got {}",
        brush.strength
      )));
    }
    if !(brush.period_secs >= 0.0) {
      return Err(TerrainError::Config(format!(
        "brush.period_secs must not be negative, got {}",
        brush.period_secs
      )));
    }
    if brush.blur_radius < 0 {
      return Err(TerrainError::Config(format!(
        "brush.blur_radius must not be negative, got {}",
        brush.blur_radius
      )));
    }
    Ok(())
  }

  pub fn with_lod(mut self, lod: u32) -> Self {
    self.lod = lod;
    self
  }

  pub fn with_world_extent(mut self, extent: WorldExtent) -> Self {
    self.world_extent = extent;
    self
  }

  pub fn with_collapse_rule(mut self, rule: CollapseRule) -> Self {
    self.collapse_rule = rule;
    self
  }

  pub fn with_brush(mut self, brush: BrushConfig) -> Self {
    self.brush = brush;
    self
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
