//! VoxelGrid - dense padded cache of one octree's samples.
//!
//! # Layout
//!
//! ```text
//! padded axis:  0      1 ............ R      R+1
//!               │      │              │      │
//!               halo   └── interior ──┘      halo
//!               (-1)                         (+1)
//!
//! world position of padded p = origin + (p - 1) * 2^lod
//! ```
//!
//! The interior is authoritative between edits. Halo cells are read-only
//! copies of the neighbouring grids' boundary layers, refreshed by
//! [`VoxelGrid::update_full_grid`]. A halo direction whose neighbour did not
//! exist at the last refresh is *unavailable* and holds the empty sample.
//!
//! # Module Structure
//!
//! - [`actions`]: brush actions applied to the interior

pub mod actions;

use glam::IVec3;

use crate::constants::{
  cube_index, max_height_for_lod, neighbor_index, resolution_for_lod, NEIGHBOR_OFFSETS,
  OCTREE_SIZE,
};
use crate::octree::OctreeNode;
use crate::types::{MaterialId, OctNodeSample};

pub use actions::GridAction;

/// Read-only lookup of grids by global octree coordinate.
pub trait NeighborGrids {
  /// Grid of the octree at `octree`, if loaded.
  fn grid(&self, octree: IVec3) -> Option<&VoxelGrid>;

  /// Pre-stroke sample of the grid cell covering `world`.
  ///
  /// Reads a grid's stroke snapshot when one is held, otherwise its current
  /// interior. `None` when no grid covers `world`.
  fn pre_stroke_sample(&self, world: IVec3) -> Option<OctNodeSample> {
    let octree = world.div_euclid(IVec3::splat(OCTREE_SIZE));
    let grid = self.grid(octree)?;
    let cell = (world - octree * OCTREE_SIZE).div_euclid(IVec3::splat(grid.scale()));
    Some(grid.pre_stroke_interior(cell))
  }
}

/// No neighbours at all; every halo stays unavailable.
pub struct NoNeighbors;

impl NeighborGrids for NoNeighbors {
  fn grid(&self, _octree: IVec3) -> Option<&VoxelGrid> {
    None
  }
}

#[derive(Clone, Debug)]
struct Snapshot {
  density: Vec<u8>,
  material: Vec<u8>,
}

/// Dense `(R+2)³` cache of density and material samples.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
  origin: IVec3,
  lod: u32,
  resolution: usize,
  density: Vec<u8>,
  material: Vec<u8>,
  /// Which neighbour directions supplied halo data (index 13 = self).
  available: [bool; 27],
  snapshot: Option<Snapshot>,
  /// Interior differs from the owning octree.
  dirty: bool,
  /// Interior changed since the last mesh.
  stale_mesh: bool,
}

impl VoxelGrid {
  /// Empty grid for the octree whose root sits at `origin`.
  pub fn new(origin: IVec3, lod: u32) -> Self {
    let resolution = resolution_for_lod(lod);
    let padded = resolution + 2;
    let len = padded * padded * padded;
    let mut available = [false; 27];
    available[neighbor_index(IVec3::ZERO)] = true;
    Self {
      origin,
      lod,
      resolution,
      density: vec![0; len],
      material: vec![0; len],
      available,
      snapshot: None,
      dirty: false,
      stale_mesh: true,
    }
  }

  /// Embed two dense `R³` arrays (x-major) at offset (1, 1, 1).
  pub fn from_arrays(origin: IVec3, lod: u32, density: &[u8], material: &[u8]) -> Self {
    let mut grid = Self::new(origin, lod);
    let r = grid.resolution;
    debug_assert_eq!(density.len(), r * r * r);
    debug_assert_eq!(material.len(), r * r * r);
    for x in 0..r {
      for y in 0..r {
        for z in 0..r {
          let src = cube_index(x, y, z, r);
          let dst = grid.index(IVec3::new(x as i32 + 1, y as i32 + 1, z as i32 + 1));
          grid.density[dst] = density[src];
          grid.material[dst] = material[src];
        }
      }
    }
    grid
  }

  /// Rasterize an octree at `lod`.
  pub fn from_octree(root: &OctreeNode, lod: u32) -> Self {
    let r = resolution_for_lod(lod);
    let mut density = vec![0; r * r * r];
    let mut material = vec![0; r * r * r];
    root.rasterize(&mut density, &mut material, r, max_height_for_lod(lod));
    Self::from_arrays(root.position(), lod, &density, &material)
  }

  #[inline]
  pub fn origin(&self) -> IVec3 {
    self.origin
  }

  /// Global octree coordinate of the owning octree.
  #[inline]
  pub fn octree_coord(&self) -> IVec3 {
    self.origin.div_euclid(IVec3::splat(OCTREE_SIZE))
  }

  #[inline]
  pub fn lod(&self) -> u32 {
    self.lod
  }

  /// Interior cells per axis.
  #[inline]
  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Voxels per grid cell.
  #[inline]
  pub fn scale(&self) -> i32 {
    1 << self.lod
  }

  #[inline]
  pub fn padded_size(&self) -> usize {
    self.resolution + 2
  }

  #[inline]
  fn index(&self, padded: IVec3) -> usize {
    let n = self.padded_size();
    cube_index(padded.x as usize, padded.y as usize, padded.z as usize, n)
  }

  #[inline]
  fn in_padded(&self, padded: IVec3) -> bool {
    let max = self.resolution as i32 + 1;
    padded.cmpge(IVec3::ZERO).all() && padded.cmple(IVec3::splat(max)).all()
  }

  /// Sample at a padded coordinate.
  #[inline]
  pub fn sample(&self, padded: IVec3) -> OctNodeSample {
    let i = self.index(padded);
    OctNodeSample::new(self.material[i], self.density[i])
  }

  /// Overwrite a padded cell.
  pub fn set(&mut self, padded: IVec3, sample: OctNodeSample) {
    let i = self.index(padded);
    self.density[i] = sample.density;
    self.material[i] = sample.material;
    self.mark_dirty();
  }

  /// Sample at interior cell `cell` (0..R per axis).
  #[inline]
  pub fn interior(&self, cell: IVec3) -> OctNodeSample {
    self.sample(cell + IVec3::ONE)
  }

  /// Interior sample from the stroke snapshot, or the live buffer.
  pub fn pre_stroke_interior(&self, cell: IVec3) -> OctNodeSample {
    let i = self.index(cell + IVec3::ONE);
    match &self.snapshot {
      Some(snapshot) => OctNodeSample::new(snapshot.material[i], snapshot.density[i]),
      None => OctNodeSample::new(self.material[i], self.density[i]),
    }
  }

  /// World voxel position of a padded coordinate.
  #[inline]
  pub fn world_position(&self, padded: IVec3) -> IVec3 {
    self.origin + (padded - IVec3::ONE) * self.scale()
  }

  /// Direction of the neighbour that owns a padded cell (zero for interior).
  #[inline]
  pub fn halo_direction(&self, padded: IVec3) -> IVec3 {
    let max = self.resolution as i32 + 1;
    let axis = |v: i32| {
      if v <= 0 {
        -1
      } else if v >= max {
        1
      } else {
        0
      }
    };
    IVec3::new(axis(padded.x), axis(padded.y), axis(padded.z))
  }

  /// Whether a padded cell holds real data.
  #[inline]
  pub fn is_available(&self, padded: IVec3) -> bool {
    self.available[neighbor_index(self.halo_direction(padded))]
  }

  /// Whether the neighbour in unit direction `direction` supplied halo data.
  pub fn has_neighbor(&self, direction: IVec3) -> bool {
    self.available[neighbor_index(direction)]
  }

  /// Refresh every halo cell from the neighbouring grids.
  ///
  /// Each boundary cell copies the mirrored interior cell (local 1 or R) of
  /// the neighbour in its direction. Directions without a neighbour of the
  /// same level of detail are zeroed and marked unavailable.
  pub fn update_full_grid(&mut self, neighbors: &impl NeighborGrids) {
    let coord = self.octree_coord();
    let r = self.resolution as i32;

    let mut sources: [Option<&VoxelGrid>; 27] = [None; 27];
    for (i, offset) in NEIGHBOR_OFFSETS.iter().enumerate() {
      if i == neighbor_index(IVec3::ZERO) {
        continue;
      }
      sources[i] = neighbors
        .grid(coord + *offset)
        .filter(|g| g.lod == self.lod);
      self.available[i] = sources[i].is_some();
    }

    let n = self.padded_size() as i32;
    for x in 0..n {
      for y in 0..n {
        for z in 0..n {
          let p = IVec3::new(x, y, z);
          let direction = self.halo_direction(p);
          if direction == IVec3::ZERO {
            continue;
          }
          let sample = match sources[neighbor_index(direction)] {
            Some(neighbor) => neighbor.sample(p - direction * r),
            None => OctNodeSample::EMPTY,
          };
          let i = self.index(p);
          self.density[i] = sample.density;
          self.material[i] = sample.material;
        }
      }
    }
    self.stale_mesh = true;
  }

  /// Capture the pre-stroke buffers. No-op while a snapshot is held.
  pub fn begin_snapshot(&mut self) {
    if self.snapshot.is_none() {
      self.snapshot = Some(Snapshot {
        density: self.density.clone(),
        material: self.material.clone(),
      });
    }
  }

  /// Drop the pre-stroke buffers.
  pub fn end_snapshot(&mut self) {
    self.snapshot = None;
  }

  pub fn has_snapshot(&self) -> bool {
    self.snapshot.is_some()
  }

  /// Interior differs from the owning octree.
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Interior or halo changed since the last mesh.
  pub fn needs_remesh(&self) -> bool {
    self.stale_mesh
  }

  pub fn mark_dirty(&mut self) {
    self.dirty = true;
    self.stale_mesh = true;
  }

  /// Called once the interior has been written back into the octree.
  pub fn clear_dirty(&mut self) {
    self.dirty = false;
  }

  /// Called once a mesh request has been queued for this grid.
  pub fn clear_remesh(&mut self) {
    self.stale_mesh = false;
  }

  /// Copy of the interior as two dense `R³` arrays (density, material).
  pub fn interior_arrays(&self) -> (Vec<u8>, Vec<MaterialId>) {
    let r = self.resolution;
    let mut density = vec![0; r * r * r];
    let mut material = vec![0; r * r * r];
    for x in 0..r {
      for y in 0..r {
        for z in 0..r {
          let src = self.index(IVec3::new(x as i32 + 1, y as i32 + 1, z as i32 + 1));
          let dst = cube_index(x, y, z, r);
          density[dst] = self.density[src];
          material[dst] = self.material[src];
        }
      }
    }
    (density, material)
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
