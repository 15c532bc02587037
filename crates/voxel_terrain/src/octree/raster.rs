//! Conversion between octrees and dense sample arrays.

use glam::IVec3;

use super::node::{Children, OctreeNode};
use super::CollapseRule;
use crate::constants::cube_index;
use crate::grid::VoxelGrid;

impl OctreeNode {
  /// Write every sample reachable within `max_height` levels into two dense
  /// `resolution³` arrays (x-major).
  ///
  /// A node coarser than one grid cell is replicated over every cell it
  /// covers; nodes below `max_height` are represented by their ancestor's
  /// summary.
  pub fn rasterize(
    &self,
    out_density: &mut [u8],
    out_material: &mut [u8],
    resolution: usize,
    max_height: u32,
  ) {
    debug_assert_eq!(out_density.len(), resolution * resolution * resolution);
    debug_assert_eq!(out_material.len(), out_density.len());
    let scale = (self.size / resolution as i32).max(1);
    self.rasterize_into(
      self.position,
      scale,
      out_density,
      out_material,
      resolution,
      1,
      max_height,
    );
  }

  #[allow(clippy::too_many_arguments)]
  fn rasterize_into(
    &self,
    origin: IVec3,
    scale: i32,
    out_density: &mut [u8],
    out_material: &mut [u8],
    resolution: usize,
    height: u32,
    max_height: u32,
  ) {
    if let Children::Branch(children) = &self.children {
      if height < max_height && self.size > scale {
        for child in children.iter() {
          child.rasterize_into(
            origin,
            scale,
            out_density,
            out_material,
            resolution,
            height + 1,
            max_height,
          );
        }
        return;
      }
    }

    let min = (self.position - origin) / scale;
    let extent = (self.size / scale).max(1);
    for x in min.x..min.x + extent {
      for y in min.y..min.y + extent {
        for z in min.z..min.z + extent {
          let i = cube_index(x as usize, y as usize, z as usize, resolution);
          out_density[i] = self.sample.density;
          out_material[i] = self.sample.material;
        }
      }
    }
  }

  /// Rebuild this subtree from the interior of `grid`.
  ///
  /// Subdivides down to `max_height` (or to one grid cell), copies each
  /// leaf's sample from its grid cell, then bottom-up recomputes branch
  /// summaries and strips branches whose children are monotone under
  /// `rule`.
  pub fn de_rasterize_grid(
    &mut self,
    grid: &VoxelGrid,
    height: u32,
    max_height: u32,
    rule: CollapseRule,
  ) {
    if height >= max_height || self.size <= grid.scale() {
      self.strip_children();
      let cell = (self.position - grid.origin()) / grid.scale();
      self.set_sample(grid.interior(cell));
      return;
    }

    self.subdivide();
    if let Children::Branch(children) = &mut self.children {
      for child in children.iter_mut() {
        child.de_rasterize_grid(grid, height + 1, max_height, rule);
      }
    }
    self.refresh_summary();

    if self.is_monotone(rule) {
      self.strip_children();
    }
  }

  /// Whether all 8 children are leaves with equal samples under `rule`.
  pub fn is_monotone(&self, rule: CollapseRule) -> bool {
    let Children::Branch(children) = &self.children else {
      return false;
    };
    if !children.iter().all(|c| c.is_leaf()) {
      return false;
    }
    let first = children[0].sample;
    children.iter().all(|c| match rule {
      CollapseRule::DensityOnly => c.sample.density == first.density,
      CollapseRule::DensityAndType => c.sample.same_value(&first),
    })
  }
}

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;
