//! Brush actions on a grid's interior.
//!
//! All distances are in world voxel units and measured from the sample
//! position of each cell (`origin + (p - 1) * 2^lod`). Halo cells are never
//! written; they are refreshed from their owners after the stroke.

use glam::{IVec3, Vec3};

use super::{NeighborGrids, Snapshot, VoxelGrid};
use crate::brush::BrushMode;
use crate::error::{Result, TerrainError};
use crate::types::{density, MaterialId, OctNodeSample};

/// One brush sample resolved for grid application.
#[derive(Clone, Copy, Debug)]
pub struct GridAction {
  /// Effective mode (modifiers already applied).
  pub mode: BrushMode,
  /// Brush centre in world voxel units.
  pub center: Vec3,
  pub radius: f32,
  /// Blend factor of Smooth toward the neighbourhood mean.
  pub strength: f32,
  /// Material written by Add, Paint, Flatten and solidifying Smooth.
  pub material: MaterialId,
  /// Flatten plane, captured at the first sample of the stroke.
  pub plane_point: Vec3,
  pub plane_normal: Vec3,
  /// Half-width of the Smooth neighbourhood.
  pub blur_radius: i32,
}

impl GridAction {
  pub fn new(mode: BrushMode, center: Vec3, radius: f32, material: MaterialId) -> Self {
    Self {
      mode,
      center,
      radius,
      strength: 1.0,
      material,
      plane_point: center,
      plane_normal: Vec3::Y,
      blur_radius: 2,
    }
  }

  pub fn with_strength(mut self, strength: f32) -> Self {
    self.strength = strength;
    self
  }

  pub fn with_plane(mut self, point: Vec3, normal: Vec3) -> Self {
    self.plane_point = point;
    self.plane_normal = normal;
    self
  }

  pub fn with_blur_radius(mut self, blur_radius: i32) -> Self {
    self.blur_radius = blur_radius;
    self
  }
}

impl VoxelGrid {
  /// Apply one brush action. Returns the number of interior cells changed.
  ///
  /// `neighbors` is only consulted by Smooth, for neighbourhood samples
  /// beyond this grid's halo.
  pub fn apply_action(
    &mut self,
    action: &GridAction,
    neighbors: &impl NeighborGrids,
  ) -> Result<usize> {
    let changed = match action.mode {
      BrushMode::Add => self.apply_union(action, true),
      BrushMode::Remove => self.apply_union(action, false),
      BrushMode::Paint => self.apply_paint(action),
      BrushMode::Flatten => self.apply_flatten(action),
      BrushMode::Smooth => self.apply_smooth(action, neighbors),
      BrushMode::Eyedropper => return Err(TerrainError::UnsupportedBrushMode(action.mode)),
    };
    if changed > 0 {
      self.mark_dirty();
    }
    Ok(changed)
  }

  /// Padded interior range covering a sphere, or `None` if it misses.
  fn cell_bounds(&self, center: Vec3, reach: f32) -> Option<(IVec3, IVec3)> {
    let scale = self.scale() as f32;
    let origin = self.origin.as_vec3();
    let r = self.resolution as i32;
    let lo = ((center - reach - origin) / scale).floor().as_ivec3() + IVec3::ONE;
    let hi = ((center + reach - origin) / scale).ceil().as_ivec3() + IVec3::ONE;
    let lo = lo.max(IVec3::ONE);
    let hi = hi.min(IVec3::splat(r));
    if lo.cmpgt(hi).any() {
      return None;
    }
    Some((lo, hi))
  }

  fn distance_to(&self, p: IVec3, center: Vec3) -> f32 {
    (self.world_position(p).as_vec3() - center).length()
  }

  fn write(&mut self, p: IVec3, sample: OctNodeSample) -> bool {
    let i = self.index(p);
    if self.density[i] == sample.density && self.material[i] == sample.material {
      return false;
    }
    self.density[i] = sample.density;
    self.material[i] = sample.material;
    true
  }

  /// Add keeps the sphere value where it is more solid than the voxel;
  /// Remove keeps the inverted value where it is more empty. Only voxels
  /// strictly inside the sphere are written, so the two undo each other
  /// everywhere outside it.
  fn apply_union(&mut self, action: &GridAction, add: bool) -> usize {
    let Some((lo, hi)) = self.cell_bounds(action.center, action.radius) else {
      return 0;
    };

    let mut changed = 0;
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let p = IVec3::new(x, y, z);
          let dist = self.distance_to(p, action.center);
          if dist >= action.radius {
            continue;
          }
          let current = self.sample(p);
          let sphere = (action.radius - dist).min(1.0);

          let sample = if add {
            if sphere <= current.signed_distance() {
              continue;
            }
            OctNodeSample::new(action.material, density::encode_for(action.material, sphere))
          } else {
            if -sphere >= current.signed_distance() {
              continue;
            }
            OctNodeSample::new(0, density::encode_for(0, -sphere))
          };
          changed += self.write(p, sample) as usize;
        }
      }
    }
    changed
  }

  /// Overwrite the material of solid voxels inside the sphere.
  fn apply_paint(&mut self, action: &GridAction) -> usize {
    let Some((lo, hi)) = self.cell_bounds(action.center, action.radius) else {
      return 0;
    };

    let mut changed = 0;
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let p = IVec3::new(x, y, z);
          if self.distance_to(p, action.center) >= action.radius {
            continue;
          }
          let current = self.sample(p);
          if current.signed_distance() <= 0.0 {
            continue;
          }
          let sample = OctNodeSample::new(action.material, current.density);
          changed += self.write(p, sample) as usize;
        }
      }
    }
    changed
  }

  /// Hard cut against the stroke plane inside the sphere.
  fn apply_flatten(&mut self, action: &GridAction) -> usize {
    let Some((lo, hi)) = self.cell_bounds(action.center, action.radius) else {
      return 0;
    };
    let normal = action.plane_normal.try_normalize().unwrap_or(Vec3::Y);

    let mut changed = 0;
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let p = IVec3::new(x, y, z);
          if self.distance_to(p, action.center) > action.radius {
            continue;
          }
          let below = normal.dot(action.plane_point - self.world_position(p).as_vec3());
          let d = below.clamp(-1.0, 1.0);
          let material = if d >= 0.0 { action.material } else { 0 };
          let sample = OctNodeSample::new(material, density::encode_for(material, d));
          changed += self.write(p, sample) as usize;
        }
      }
    }
    changed
  }

  /// Blend toward the mean of the pre-stroke neighbourhood.
  ///
  /// Interior cells come from this grid's snapshot; everything else from
  /// the owning neighbour's snapshot. Unavailable neighbours (missing halo
  /// directions, cells no grid covers) are left out of the mean.
  fn apply_smooth(&mut self, action: &GridAction, neighbors: &impl NeighborGrids) -> usize {
    let Some((lo, hi)) = self.cell_bounds(action.center, action.radius) else {
      return 0;
    };

    let held = self.snapshot.is_some();
    let snapshot = self.snapshot.take().unwrap_or_else(|| Snapshot {
      density: self.density.clone(),
      material: self.material.clone(),
    });
    let pre = |grid: &VoxelGrid, q: IVec3| {
      let i = grid.index(q);
      OctNodeSample::new(snapshot.material[i], snapshot.density[i])
    };

    let blur = action.blur_radius.max(0);
    let half_step = 0.5 / density::SCALE;
    let mut changed = 0;
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let p = IVec3::new(x, y, z);
          if self.distance_to(p, action.center) > action.radius {
            continue;
          }

          let mut sum = 0.0;
          let mut count = 0u32;
          for dx in -blur..=blur {
            for dy in -blur..=blur {
              for dz in -blur..=blur {
                let q = p + IVec3::new(dx, dy, dz);
                let sample = if self.halo_direction(q) == IVec3::ZERO {
                  Some(pre(self, q))
                } else if self.in_padded(q) && !self.is_available(q) {
                  continue;
                } else {
                  // Halo copies may already hold a neighbour's edits.
                  neighbors.pre_stroke_sample(self.world_position(q))
                };
                if let Some(sample) = sample {
                  sum += sample.signed_distance();
                  count += 1;
                }
              }
            }
          }
          if count == 0 {
            continue;
          }

          let old = pre(self, p);
          let old_d = old.signed_distance();
          let mean = sum / count as f32;
          let d = old_d + action.strength * (mean - old_d);
          if (d - old_d).abs() < half_step {
            continue;
          }

          let solid = density::encode(d) >= density::SURFACE;
          let material = match (old.is_below_surface(), solid) {
            (false, true) => action.material,
            (true, false) => 0,
            _ => self.sample(p).material,
          };
          let sample = OctNodeSample::new(material, density::encode_for(material, d));
          changed += self.write(p, sample) as usize;
        }
      }
    }

    if held {
      self.snapshot = Some(snapshot);
    }
    changed
  }
}

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;
