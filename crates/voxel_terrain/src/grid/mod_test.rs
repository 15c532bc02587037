use std::collections::HashMap;

use super::*;
use crate::types::density;

struct Grids(HashMap<IVec3, VoxelGrid>);

impl NeighborGrids for Grids {
  fn grid(&self, octree: IVec3) -> Option<&VoxelGrid> {
    self.0.get(&octree)
  }
}

/// LOD 3: resolution 4, padded 6.
const LOD: u32 = 3;

fn numbered_grid(octree: IVec3, base: u8) -> VoxelGrid {
  let r = resolution_for_lod(LOD);
  let density: Vec<u8> = (0..r * r * r).map(|i| base + i as u8).collect();
  let material = vec![base; r * r * r];
  VoxelGrid::from_arrays(octree * OCTREE_SIZE, LOD, &density, &material)
}

#[test]
fn test_from_arrays_embeds_interior() {
  let grid = numbered_grid(IVec3::ZERO, 10);
  assert_eq!(grid.resolution(), 4);
  assert_eq!(grid.padded_size(), 6);
  assert_eq!(grid.scale(), 8);

  assert_eq!(grid.interior(IVec3::ZERO).density, 10);
  assert_eq!(grid.interior(IVec3::new(1, 2, 3)).density, 10 + (1 * 4 + 2) * 4 + 3);
  assert_eq!(grid.sample(IVec3::ZERO), OctNodeSample::EMPTY);
  assert_eq!(grid.sample(IVec3::splat(5)), OctNodeSample::EMPTY);
}

#[test]
fn test_from_octree_rasterizes() {
  let mut root = OctreeNode::new_root(IVec3::new(32, 0, 0));
  root.subdivide();
  root.children_mut().unwrap()[1].set_sample(OctNodeSample::new(4, density::MAX));

  let grid = VoxelGrid::from_octree(&root, LOD);
  assert_eq!(grid.origin(), IVec3::new(32, 0, 0));
  assert_eq!(grid.octree_coord(), IVec3::new(1, 0, 0));
  // Child 1 covers z >= 16, i.e. interior cells z = 2..4 at scale 8.
  assert_eq!(grid.interior(IVec3::new(0, 0, 2)).material, 4);
  assert_eq!(grid.interior(IVec3::new(0, 0, 1)).material, 0);

  let (density, material) = grid.interior_arrays();
  assert_eq!(material[cube_index(1, 1, 3, 4)], 4);
  assert_eq!(density[cube_index(1, 1, 0, 4)], 0);
}

#[test]
fn test_world_position_and_halo_direction() {
  let grid = VoxelGrid::new(IVec3::new(-32, 0, 64), LOD);
  assert_eq!(grid.octree_coord(), IVec3::new(-1, 0, 2));
  assert_eq!(grid.world_position(IVec3::ONE), IVec3::new(-32, 0, 64));
  assert_eq!(grid.world_position(IVec3::ZERO), IVec3::new(-40, -8, 56));
  assert_eq!(grid.halo_direction(IVec3::new(0, 3, 5)), IVec3::new(-1, 0, 1));
  assert_eq!(grid.halo_direction(IVec3::new(2, 3, 4)), IVec3::ZERO);
}

#[test]
fn test_update_full_grid_copies_mirrored_boundary() {
  let mut grids = Grids(HashMap::new());
  let east = numbered_grid(IVec3::X, 100);
  let corner = numbered_grid(IVec3::ONE, 150);
  grids.0.insert(IVec3::X, east.clone());
  grids.0.insert(IVec3::ONE, corner.clone());

  let mut grid = numbered_grid(IVec3::ZERO, 10);
  grid.update_full_grid(&grids);

  // +X face: padded x = 5 mirrors the neighbour's interior x = 0 (padded 1).
  for y in 1..=4 {
    for z in 1..=4 {
      let halo = grid.sample(IVec3::new(5, y, z));
      assert_eq!(halo, east.sample(IVec3::new(1, y, z)));
    }
  }
  // +X+Y+Z corner comes from the diagonal neighbour.
  assert_eq!(grid.sample(IVec3::splat(5)), corner.interior(IVec3::ZERO));

  assert!(grid.has_neighbor(IVec3::X));
  assert!(grid.has_neighbor(IVec3::ONE));
  assert!(!grid.has_neighbor(IVec3::NEG_X));
  assert!(grid.is_available(IVec3::new(5, 2, 2)));
  assert!(!grid.is_available(IVec3::new(0, 2, 2)));
  assert!(!grid.is_available(IVec3::new(5, 5, 2)));
  assert!(grid.is_available(IVec3::new(3, 3, 3)));
  assert_eq!(grid.sample(IVec3::new(0, 2, 2)), OctNodeSample::EMPTY);
}

#[test]
fn test_update_full_grid_clears_removed_neighbor() {
  let mut grids = Grids(HashMap::new());
  grids.0.insert(IVec3::Y, numbered_grid(IVec3::Y, 50));

  let mut grid = numbered_grid(IVec3::ZERO, 10);
  grid.update_full_grid(&grids);
  assert!(grid.sample(IVec3::new(2, 5, 2)).material != 0);

  grids.0.clear();
  grid.update_full_grid(&grids);
  assert!(!grid.has_neighbor(IVec3::Y));
  assert_eq!(grid.sample(IVec3::new(2, 5, 2)), OctNodeSample::EMPTY);
}

#[test]
fn test_update_full_grid_ignores_other_lod() {
  let mut grids = Grids(HashMap::new());
  grids.0.insert(IVec3::Z, VoxelGrid::new(IVec3::new(0, 0, 32), 2));

  let mut grid = numbered_grid(IVec3::ZERO, 10);
  grid.update_full_grid(&grids);
  assert!(!grid.has_neighbor(IVec3::Z));
}

#[test]
fn test_snapshot_preserves_pre_stroke_values() {
  let mut grid = numbered_grid(IVec3::ZERO, 10);
  let cell = IVec3::new(1, 1, 1);
  let before = grid.interior(cell);

  grid.begin_snapshot();
  grid.set(cell + IVec3::ONE, OctNodeSample::new(9, 240));
  // A second begin within the same stroke keeps the first capture.
  grid.begin_snapshot();

  assert_eq!(grid.interior(cell), OctNodeSample::new(9, 240));
  assert_eq!(grid.pre_stroke_interior(cell), before);

  grid.end_snapshot();
  assert!(!grid.has_snapshot());
  assert_eq!(grid.pre_stroke_interior(cell), OctNodeSample::new(9, 240));
}

#[test]
fn test_pre_stroke_sample_by_world_position() {
  let mut grids = Grids(HashMap::new());
  grids.0.insert(IVec3::new(-1, 0, 0), numbered_grid(IVec3::new(-1, 0, 0), 30));

  // World x = -1 is the last interior cell of octree -1 at scale 8.
  let sample = grids.pre_stroke_sample(IVec3::new(-1, 0, 0)).unwrap();
  assert_eq!(sample.density, 30 + (3 * 4) * 4);
  assert!(grids.pre_stroke_sample(IVec3::new(40, 0, 0)).is_none());
}

#[test]
fn test_dirty_flags() {
  let mut grid = VoxelGrid::new(IVec3::ZERO, LOD);
  assert!(!grid.is_dirty());
  assert!(grid.needs_remesh());
  grid.clear_remesh();
  assert!(!grid.needs_remesh());

  grid.set(IVec3::ONE, OctNodeSample::new(1, 200));
  assert!(grid.is_dirty());
  assert!(grid.needs_remesh());

  grid.clear_dirty();
  assert!(!grid.is_dirty());
  assert!(grid.needs_remesh());
}
