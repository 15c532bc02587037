//! Metaspace - registry of loaded octrees and their grids by coordinate.
//!
//! Cross-boundary access always goes through a coordinate lookup here; no
//! grid or octree holds a reference to its neighbours.
//!
//! ```text
//! global voxel ──div 32──▶ octree coord ──div 5──▶ batch coord
//!                              │
//!                              ▼
//!                      TerrainCell { root, grid }
//! ```

use std::collections::{HashMap, HashSet};

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use crate::constants::{max_height_for_lod, BATCH_OCTREES, NEIGHBOR_OFFSETS, OCTREE_SIZE};
use crate::grid::{NeighborGrids, VoxelGrid};
use crate::octree::{CollapseRule, OctreeNode};
use crate::types::OctNodeSample;

/// One loaded octree and its dense cache.
#[derive(Clone, Debug)]
pub struct TerrainCell {
  pub root: OctreeNode,
  pub grid: VoxelGrid,
}

impl TerrainCell {
  pub fn new(root: OctreeNode, lod: u32) -> Self {
    let grid = VoxelGrid::from_octree(&root, lod);
    Self { root, grid }
  }
}

/// Octree coordinates touched by one operation; most strokes hit few.
pub type OctreeCoords = SmallVec<[IVec3; 8]>;

/// Loaded region: cells keyed by global octree coordinate.
#[derive(Clone, Debug, Default)]
pub struct Metaspace {
  lod: u32,
  collapse_rule: CollapseRule,
  cells: HashMap<IVec3, TerrainCell>,
  batches: HashSet<IVec3>,
}

impl Metaspace {
  pub fn new(lod: u32, collapse_rule: CollapseRule) -> Self {
    Self {
      lod,
      collapse_rule,
      cells: HashMap::new(),
      batches: HashSet::new(),
    }
  }

  #[inline]
  pub fn lod(&self) -> u32 {
    self.lod
  }

  #[inline]
  pub fn collapse_rule(&self) -> CollapseRule {
    self.collapse_rule
  }

  /// Global octree coordinate containing a global voxel.
  #[inline]
  pub fn octree_of(voxel: IVec3) -> IVec3 {
    voxel.div_euclid(IVec3::splat(OCTREE_SIZE))
  }

  /// Batch coordinate containing a global octree coordinate.
  #[inline]
  pub fn batch_of(octree: IVec3) -> IVec3 {
    octree.div_euclid(IVec3::splat(BATCH_OCTREES))
  }

  /// Register a batch and its octrees, then refresh halos around them.
  pub fn insert_batch(&mut self, batch: IVec3, octrees: Vec<OctreeNode>) {
    let mut inserted = Vec::with_capacity(octrees.len());
    for root in octrees {
      let coord = Self::octree_of(root.position());
      debug_assert_eq!(Self::batch_of(coord), batch);
      self.cells.insert(coord, TerrainCell::new(root, self.lod));
      inserted.push(coord);
    }
    self.batches.insert(batch);
    tracing::debug!(?batch, octrees = inserted.len(), "batch inserted");

    let affected = self.with_neighbors(&inserted);
    self.refresh_halos(affected);
  }

  /// Drop a batch and its octrees. Returns the removed cells.
  pub fn remove_batch(&mut self, batch: IVec3) -> Vec<(IVec3, TerrainCell)> {
    if !self.batches.remove(&batch) {
      return Vec::new();
    }
    let coords: Vec<IVec3> = self
      .cells
      .keys()
      .copied()
      .filter(|c| Self::batch_of(*c) == batch)
      .collect();
    let removed: Vec<(IVec3, TerrainCell)> = coords
      .iter()
      .filter_map(|c| self.cells.remove(c).map(|cell| (*c, cell)))
      .collect();
    tracing::debug!(?batch, octrees = removed.len(), "batch removed");

    let neighbors: Vec<IVec3> = self
      .with_neighbors(&coords)
      .into_iter()
      .filter(|c| self.cells.contains_key(c))
      .collect();
    self.refresh_halos(neighbors);
    removed
  }

  /// Release every cell and batch.
  pub fn clear(&mut self) {
    self.cells.clear();
    self.batches.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn octree_count(&self) -> usize {
    self.cells.len()
  }

  pub fn octree_exists(&self, octree: IVec3) -> bool {
    self.cells.contains_key(&octree)
  }

  pub fn batch_exists(&self, batch: IVec3) -> bool {
    self.batches.contains(&batch)
  }

  /// Loaded batch coordinates in ascending (x, y, z) order.
  pub fn loaded_batches(&self) -> Vec<IVec3> {
    let mut batches: Vec<IVec3> = self.batches.iter().copied().collect();
    batches.sort_by_key(|b| b.to_array());
    batches
  }

  /// Loaded octree coordinates in ascending (x, y, z) order.
  pub fn octree_coords(&self) -> Vec<IVec3> {
    let mut coords: Vec<IVec3> = self.cells.keys().copied().collect();
    coords.sort_by_key(|c| c.to_array());
    coords
  }

  pub fn cell(&self, octree: IVec3) -> Option<&TerrainCell> {
    self.cells.get(&octree)
  }

  pub fn cell_mut(&mut self, octree: IVec3) -> Option<&mut TerrainCell> {
    self.cells.get_mut(&octree)
  }

  pub fn cells(&self) -> impl Iterator<Item = (&IVec3, &TerrainCell)> {
    self.cells.iter()
  }

  /// Current sample of the grid cell covering a global voxel.
  ///
  /// Out-of-range voxels read as [`OctNodeSample::EMPTY`].
  pub fn voxel(&self, voxel: IVec3) -> OctNodeSample {
    let octree = Self::octree_of(voxel);
    let Some(cell) = self.cells.get(&octree) else {
      return OctNodeSample::EMPTY;
    };
    let local = voxel - octree * OCTREE_SIZE;
    cell.grid.interior(local.div_euclid(IVec3::splat(cell.grid.scale())))
  }

  /// Octree sample at a global voxel, read from the tree rather than the
  /// grid. Out-of-range voxels read as [`OctNodeSample::EMPTY`].
  pub fn octree_voxel(&self, voxel: IVec3) -> OctNodeSample {
    self
      .cells
      .get(&Self::octree_of(voxel))
      .and_then(|cell| cell.root.get_voxel(voxel, max_height_for_lod(0)))
      .unwrap_or(OctNodeSample::EMPTY)
  }

  /// Run `f` on a grid detached from the registry, so it can read its
  /// neighbours through `self` while being mutated.
  pub fn with_grid_detached<R>(
    &mut self,
    octree: IVec3,
    f: impl FnOnce(&mut VoxelGrid, &Metaspace) -> R,
  ) -> Option<R> {
    let mut cell = self.cells.remove(&octree)?;
    let result = f(&mut cell.grid, self);
    self.cells.insert(octree, cell);
    Some(result)
  }

  /// Re-pull halo data for the given loaded octrees.
  pub fn refresh_halos(&mut self, coords: impl IntoIterator<Item = IVec3>) {
    for coord in coords {
      self.with_grid_detached(coord, |grid, metaspace| grid.update_full_grid(metaspace));
    }
  }

  /// `coords` plus every loaded octree among their 26 neighbours.
  pub fn with_neighbors(&self, coords: &[IVec3]) -> Vec<IVec3> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for coord in coords {
      for offset in NEIGHBOR_OFFSETS.iter() {
        let c = *coord + *offset;
        if (*offset == IVec3::ZERO || self.cells.contains_key(&c)) && seen.insert(c) {
          out.push(c);
        }
      }
    }
    out
  }

  /// Loaded octrees whose bounds lie within `radius` of `center`
  /// (distance to box, not to box centre).
  pub fn octrees_near(&self, center: Vec3, radius: f32) -> OctreeCoords {
    let size = OCTREE_SIZE as f32;
    let lo = ((center - radius) / size).floor().as_ivec3();
    let hi = ((center + radius) / size).floor().as_ivec3();

    let mut out = OctreeCoords::new();
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let coord = IVec3::new(x, y, z);
          if !self.cells.contains_key(&coord) {
            continue;
          }
          let min = (coord * OCTREE_SIZE).as_vec3();
          let max = min + size;
          let closest = center.clamp(min, max);
          if closest.distance(center) <= radius {
            out.push(coord);
          }
        }
      }
    }
    out
  }

  /// Start a stroke snapshot on the given grids.
  pub fn begin_snapshots(&mut self, coords: &[IVec3]) {
    for coord in coords {
      if let Some(cell) = self.cells.get_mut(coord) {
        cell.grid.begin_snapshot();
      }
    }
  }

  /// Drop every stroke snapshot.
  pub fn end_snapshots(&mut self) {
    for cell in self.cells.values_mut() {
      cell.grid.end_snapshot();
    }
  }

  /// Write every dirty grid back into its octree. Returns how many were
  /// committed.
  pub fn commit_dirty(&mut self) -> usize {
    let max_height = max_height_for_lod(self.lod);
    let rule = self.collapse_rule;
    let mut committed = 0;
    for cell in self.cells.values_mut() {
      if !cell.grid.is_dirty() {
        continue;
      }
      cell.root.de_rasterize_grid(&cell.grid, 1, max_height, rule);
      cell.grid.clear_dirty();
      committed += 1;
    }
    if committed > 0 {
      tracing::debug!(committed, "grids committed to octrees");
    }
    committed
  }

  /// Swap in a new octree and rebuild its grid. The cell's batch must be
  /// loaded.
  pub fn replace_octree(&mut self, octree: IVec3, root: OctreeNode) {
    debug_assert!(self.batch_exists(Self::batch_of(octree)));
    self.cells.insert(octree, TerrainCell::new(root, self.lod));
    let affected = self.with_neighbors(&[octree]);
    self.refresh_halos(affected);
  }
}

impl NeighborGrids for Metaspace {
  fn grid(&self, octree: IVec3) -> Option<&VoxelGrid> {
    self.cells.get(&octree).map(|cell| &cell.grid)
  }
}

#[cfg(test)]
#[path = "metaspace_test.rs"]
mod metaspace_test;
