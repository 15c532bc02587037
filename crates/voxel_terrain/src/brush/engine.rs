//! BrushEngine - stroke state, rate limiting and dispatch.
//!
//! A stroke sample is accepted only when the time since the previous
//! accepted sample exceeds `period / (2 * clamp(streak, 1, 5))`, so a held
//! stroke speeds up to five times the base rate. The first sample of a
//! stroke is always accepted and fixes the Flatten plane.

use glam::{IVec3, Vec3};
use web_time::{Duration, Instant};

use super::{BrushMode, Modifiers};
use crate::config::BrushConfig;
use crate::error::{Result, TerrainError};
use crate::grid::GridAction;
use crate::metaspace::{Metaspace, OctreeCoords};
use crate::types::MaterialId;

/// Streak length at which the stroke rate stops increasing.
const MAX_STREAK: u32 = 5;

/// State of one continuous pointer-down interaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrushStroke {
  /// Centre of the last accepted sample.
  pub origin: Vec3,
  /// Point and normal of the first accepted sample.
  pub first_point: Option<Vec3>,
  pub first_normal: Vec3,
  pub last_timestamp: Option<Instant>,
  pub streak_length: u32,
}

impl BrushStroke {
  pub fn is_active(&self) -> bool {
    self.last_timestamp.is_some()
  }
}

/// Result of a stroke sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrokeOutcome {
  /// Too soon after the previous sample; nothing changed.
  Throttled,
  /// Applied; `octrees` lists the grids whose interior changed.
  Applied { octrees: OctreeCoords },
}

/// Brush settings plus the active stroke.
#[derive(Clone, Debug)]
pub struct BrushEngine {
  pub mode: BrushMode,
  pub radius: f32,
  pub strength: f32,
  pub material: MaterialId,
  pub period: Duration,
  pub blur_radius: i32,
  pub eyedropper_retries: u32,
  stroke: BrushStroke,
}

impl Default for BrushEngine {
  fn default() -> Self {
    Self::new(&BrushConfig::default())
  }
}

impl BrushEngine {
  pub fn new(config: &BrushConfig) -> Self {
    Self {
      mode: BrushMode::default(),
      radius: config.radius,
      strength: config.strength,
      material: config.material,
      period: Duration::from_secs_f32(config.period_secs.max(0.0)),
      blur_radius: config.blur_radius,
      eyedropper_retries: config.eyedropper_retries,
      stroke: BrushStroke::default(),
    }
  }

  pub fn with_mode(mut self, mode: BrushMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_radius(mut self, radius: f32) -> Self {
    self.radius = radius;
    self
  }

  pub fn with_material(mut self, material: MaterialId) -> Self {
    self.material = material;
    self
  }

  pub fn stroke(&self) -> &BrushStroke {
    &self.stroke
  }

  /// Minimum gap before the next sample of the current stroke.
  pub fn current_interval(&self) -> Duration {
    let streak = self.stroke.streak_length.clamp(1, MAX_STREAK);
    self.period / (2 * streak)
  }

  fn accepts(&self, now: Instant) -> bool {
    match self.stroke.last_timestamp {
      None => true,
      Some(last) => now.saturating_duration_since(last) > self.current_interval(),
    }
  }

  /// Stroke sample at the current time.
  pub fn try_stroke(
    &mut self,
    metaspace: &mut Metaspace,
    point: Vec3,
    normal: Vec3,
    modifiers: Modifiers,
  ) -> Result<StrokeOutcome> {
    self.try_stroke_at(Instant::now(), metaspace, point, normal, modifiers)
  }

  /// Stroke sample at an explicit time.
  ///
  /// Applies the effective mode to every loaded grid whose box lies within
  /// reach of `point`, then refreshes halos around the changed grids.
  pub fn try_stroke_at(
    &mut self,
    now: Instant,
    metaspace: &mut Metaspace,
    point: Vec3,
    normal: Vec3,
    modifiers: Modifiers,
  ) -> Result<StrokeOutcome> {
    let mode = modifiers.effective(self.mode);
    if !mode.is_stroke() {
      return Err(TerrainError::UnsupportedBrushMode(mode));
    }
    if !self.accepts(now) {
      return Ok(StrokeOutcome::Throttled);
    }

    if self.stroke.first_point.is_none() {
      self.stroke.first_point = Some(point);
      self.stroke.first_normal = normal;
    }
    self.stroke.origin = point;
    self.stroke.last_timestamp = Some(now);
    self.stroke.streak_length += 1;

    let action = GridAction {
      mode,
      center: point,
      radius: self.radius,
      strength: self.strength,
      material: self.material,
      plane_point: self.stroke.first_point.unwrap_or(point),
      plane_normal: self.stroke.first_normal,
      blur_radius: self.blur_radius,
    };

    let reach = action.radius;
    let scale = (1 << metaspace.lod()) as f32;
    let snapshot_reach = reach + (self.blur_radius.max(0) + 1) as f32 * scale;
    let watched = metaspace.octrees_near(point, snapshot_reach);
    metaspace.begin_snapshots(&watched);

    let mut changed = OctreeCoords::new();
    for coord in metaspace.octrees_near(point, reach) {
      let count = metaspace
        .with_grid_detached(coord, |grid, others| grid.apply_action(&action, others))
        .transpose()?
        .unwrap_or(0);
      if count > 0 {
        changed.push(coord);
      }
    }

    if !changed.is_empty() {
      let affected: Vec<IVec3> = metaspace.with_neighbors(&changed);
      metaspace.refresh_halos(affected);
    }
    tracing::debug!(
      ?mode,
      streak = self.stroke.streak_length,
      changed = changed.len(),
      "stroke applied"
    );

    Ok(StrokeOutcome::Applied { octrees: changed })
  }

  /// End the stroke (pointer release) and drop stroke snapshots.
  pub fn reset_stroke(&mut self, metaspace: &mut Metaspace) {
    self.stroke = BrushStroke::default();
    metaspace.end_snapshots();
  }

  /// Pick the material at `point`, stepping one voxel at a time along
  /// `ray_dir` through empty voxels up to `eyedropper_retries` times.
  ///
  /// Sets and returns the active material on a hit; never mutates voxels.
  pub fn eyedropper(
    &mut self,
    metaspace: &Metaspace,
    point: Vec3,
    ray_dir: Vec3,
  ) -> Option<MaterialId> {
    let step = ray_dir.normalize_or_zero();
    for i in 0..=self.eyedropper_retries {
      let voxel = (point + step * i as f32).round().as_ivec3();
      let material = metaspace.voxel(voxel).material;
      if material != 0 {
        tracing::debug!(material, retries = i, "eyedropper picked material");
        self.material = material;
        return Some(material);
      }
    }
    None
  }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
