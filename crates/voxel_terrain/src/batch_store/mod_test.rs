use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::types::OctNodeSample;

#[test]
fn test_address_mapping_recovers_parts() {
  let mut rng = StdRng::seed_from_u64(0xBA7C);
  for _ in 0..500 {
    let batch = IVec3::new(
      rng.random_range(-40..40),
      rng.random_range(-40..40),
      rng.random_range(-40..40),
    );
    let octree = IVec3::new(rng.random_range(0..5), rng.random_range(0..5), rng.random_range(0..5));
    let voxel = IVec3::new(
      rng.random_range(0..32),
      rng.random_range(0..32),
      rng.random_range(0..32),
    );
    let coord = batch * 160 + octree * 32 + voxel;

    let address = VoxelAddress::of(coord);
    assert_eq!(address, VoxelAddress { batch, octree, voxel }, "coord {coord}");
    assert_eq!(address.global(), coord);
  }
}

#[test]
fn test_address_of_negative_coordinate() {
  let address = VoxelAddress::of(IVec3::new(-1, 0, 161));
  assert_eq!(address.batch, IVec3::new(-1, 0, 1));
  assert_eq!(address.octree, IVec3::new(4, 0, 0));
  assert_eq!(address.voxel, IVec3::new(31, 0, 1));
  assert_eq!(address.global_octree(), IVec3::new(-1, 0, 5));
}

#[test]
fn test_local_octree_index_is_x_major() {
  assert_eq!(local_octree_index(IVec3::new(0, 0, 1)), 1);
  assert_eq!(local_octree_index(IVec3::new(0, 1, 0)), 5);
  assert_eq!(local_octree_index(IVec3::new(1, 0, 0)), 25);
  assert_eq!(local_octree_index(IVec3::splat(4)), 124);
  for i in 0..125 {
    assert_eq!(local_octree_index(local_octree_coord(i)), i);
  }
}

#[test]
fn test_edge_batches_are_narrow() {
  let layout = BatchLayout::default();
  assert_eq!(layout.octree_dimensions(IVec3::ZERO), IVec3::splat(5));
  assert_eq!(layout.octree_dimensions(IVec3::new(25, 0, 0)), IVec3::new(3, 5, 5));
  assert_eq!(layout.octree_dimensions(IVec3::new(0, 7, 25)), IVec3::new(5, 5, 3));
  assert_eq!(layout.octree_dimensions(IVec3::new(25, -3, 25)), IVec3::new(3, 5, 3));
  assert_eq!(layout.octree_dimensions(IVec3::new(26, 0, 0)).x, 0);
  assert_eq!(layout.octree_count(IVec3::new(25, 0, 0)), 75);

  let unbounded = BatchLayout::new(WorldExtent::UNBOUNDED);
  assert_eq!(unbounded.octree_dimensions(IVec3::new(25, 0, 25)), IVec3::splat(5));
}

#[test]
fn test_octree_coords_in_file_order() {
  let layout = BatchLayout::default();
  let coords = layout.octree_coords(IVec3::new(25, 1, 0));
  assert_eq!(coords.len(), 75);
  assert_eq!(coords[0], IVec3::new(125, 5, 0));
  assert_eq!(coords[1], IVec3::new(125, 5, 1));
  assert_eq!(coords[5], IVec3::new(125, 6, 0));
  assert_eq!(coords[25], IVec3::new(126, 5, 0));
  assert_eq!(*coords.last().unwrap(), IVec3::new(127, 9, 4));
}

#[test]
fn test_default_octrees_are_empty_leaves() {
  let octrees = BatchLayout::default().default_octrees(IVec3::new(1, 0, 0));
  assert_eq!(octrees.len(), 125);
  assert_eq!(octrees[0].position(), IVec3::new(160, 0, 0));
  assert!(octrees.iter().all(|o| o.is_leaf() && o.sample() == OctNodeSample::EMPTY));
}

#[test]
fn test_batch_path_format() {
  let store = BatchStore::new("/data", BatchLayout::default());
  assert_eq!(
    store.batch_path(IVec3::new(3, -1, 25)),
    PathBuf::from("/data/compiled-batch-3--1-25.optoctrees")
  );
}

#[test]
fn test_write_staged_replaces_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("out.bin");

  write_staged(&path, b"first").unwrap();
  write_staged(&path, b"second").unwrap();
  assert_eq!(std::fs::read(&path).unwrap(), b"second");

  let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
    .unwrap()
    .map(|e| e.unwrap().file_name())
    .collect();
  assert_eq!(leftovers.len(), 1, "temp file left behind: {leftovers:?}");
}
