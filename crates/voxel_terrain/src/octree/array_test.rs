use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::types::density;

/// Random tree with depth at most `max_depth`; branch summaries are
/// refreshed so the tree matches what a loader would hold.
fn random_tree(rng: &mut StdRng, node: &mut OctreeNode, depth: u32, max_depth: u32) {
  let material = rng.random_range(0..4u8);
  let density = if material == 0 {
    rng.random_range(0..density::SURFACE)
  } else {
    rng.random_range(density::SURFACE..=density::MAX)
  };
  node.set_sample(OctNodeSample::new(material, density));

  if depth + 1 < max_depth && rng.random_bool(0.4) && node.subdivide() {
    if let Children::Branch(children) = &mut node.children {
      for child in children.iter_mut() {
        random_tree(rng, child, depth + 1, max_depth);
      }
    }
    node.refresh_summary();
  }
}

#[test]
fn test_round_trip_random_trees() {
  let mut rng = StdRng::seed_from_u64(0x0c7_4ee);
  for max_depth in 1..=5 {
    for _ in 0..20 {
      let mut tree = OctreeNode::new_root(IVec3::ZERO);
      random_tree(&mut rng, &mut tree, 0, max_depth);

      let data = tree.write_to_array();
      assert_eq!(data.len(), tree.node_count());

      let loaded = OctreeNode::from_array(IVec3::ZERO, &data).unwrap();
      assert_eq!(loaded, tree, "depth {max_depth}");
      assert_eq!(loaded.write_to_array(), data);
    }
  }
}

#[test]
fn test_single_leaf_array() {
  let tree = OctreeNode::filled(IVec3::ZERO, OctNodeSample::new(7, 200));
  let data = tree.write_to_array();
  assert_eq!(data, vec![OctNodeSample::new(7, 200)]);
}

#[test]
fn test_child_blocks_follow_parent() {
  let mut tree = OctreeNode::new_root(IVec3::ZERO);
  tree.subdivide();
  tree.children_mut().unwrap()[2].subdivide();

  let data = tree.write_to_array();
  assert_eq!(data.len(), 17);
  assert_eq!(data[0].child_offset, 1);
  assert_eq!(data[3].child_offset, 9);
  assert!(data[9..].iter().all(|s| s.child_offset == 0));
}

#[test]
fn test_read_empty_array_fails() {
  let err = OctreeNode::from_array(IVec3::ZERO, &[]).unwrap_err();
  assert!(matches!(err, TerrainError::NodeIndexOutOfRange { index: 0, len: 0 }));
}

#[test]
fn test_read_truncated_child_block_fails() {
  let mut data = vec![OctNodeSample::EMPTY; 5];
  data[0].child_offset = 1;
  let err = OctreeNode::from_array(IVec3::ZERO, &data).unwrap_err();
  assert!(matches!(err, TerrainError::NodeIndexOutOfRange { len: 5, .. }), "{err}");
}

#[test]
fn test_read_backward_offset_fails() {
  let mut data = vec![OctNodeSample::EMPTY; 9];
  data[0].child_offset = 1;
  data[1].child_offset = 1;
  let err = OctreeNode::from_array(IVec3::ZERO, &data).unwrap_err();
  assert!(matches!(err, TerrainError::Truncated { .. }), "{err}");
}
