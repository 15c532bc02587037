use super::*;
use crate::batch_store::BatchLayout;
use crate::config::WorldExtent;
use crate::octree::CollapseRule;
use crate::types::{density, OctNodeSample};

const SOLID: OctNodeSample = OctNodeSample::new(6, density::MAX);

/// Unbounded 5×5×5 batch layout with a one-batch world in a temp dir.
fn store_with_batch(batch: IVec3) -> (tempfile::TempDir, BatchStore, Vec<OctreeNode>) {
  let dir = tempfile::tempdir().unwrap();
  let store = BatchStore::new(dir.path(), BatchLayout::new(WorldExtent::UNBOUNDED));
  let octrees = store.layout().default_octrees(batch);
  store.write_batch(batch, &octrees).unwrap();
  (dir, store, octrees)
}

fn loaded(batch: IVec3, octrees: Vec<OctreeNode>) -> Metaspace {
  let mut space = Metaspace::new(2, CollapseRule::DensityAndType);
  space.insert_batch(batch, octrees);
  space
}

#[test]
fn test_unchanged_region_has_empty_patch() {
  let batch = IVec3::new(0, -1, 2);
  let (_dir, store, octrees) = store_with_batch(batch);
  let space = loaded(batch, octrees);

  let patch = compute_patch(&store, &space).unwrap();
  assert!(patch.is_empty());
  assert_eq!(patch.octree_count(), 0);
}

#[test]
fn test_patch_holds_only_changed_octrees() {
  let batch = IVec3::new(1, 0, 0);
  let (_dir, store, octrees) = store_with_batch(batch);
  let mut space = loaded(batch, octrees);

  let changed = IVec3::new(5 + 2, 1, 3);
  space.replace_octree(changed, OctreeNode::filled(changed * OCTREE_SIZE, SOLID));

  let patch = compute_patch(&store, &space).unwrap();
  assert_eq!(patch.batches.len(), 1);
  let diff = &patch.batches[0];
  assert_eq!(diff.batch, batch);
  assert_eq!(diff.octrees.len(), 1);
  assert_eq!(diff.octrees[0].local_index, (2 * 5 + 1) * 5 + 3);
  assert_eq!(diff.octree_coord(&diff.octrees[0]), changed);
  assert_eq!(diff.octrees[0].root.sample(), SOLID);
}

#[test]
fn test_patch_bytes_layout() {
  let root = OctreeNode::filled(IVec3::ZERO, SOLID);
  let patch = Patch {
    batches: vec![BatchPatch {
      batch: IVec3::new(-2, 0, 3),
      octrees: vec![PatchEntry {
        local_index: 0,
        root,
      }],
    }],
  };

  let bytes = patch.encode().unwrap();
  assert_eq!(
    bytes,
    vec![
      0, 0, 0, 0, // header
      0xFE, 0xFF, 0, 0, 3, 0, // batch
      1, // count
      0, // local index
      1, 0, 6, density::MAX, 0, 0, // record
    ]
  );
}

#[test]
fn test_patch_decode_positions_roots() {
  let batch = IVec3::new(-1, 2, 0);
  let mut root = OctreeNode::new_root(IVec3::ZERO);
  root.subdivide();
  root.children_mut().unwrap()[5].set_sample(SOLID);
  let patch = Patch {
    batches: vec![BatchPatch {
      batch,
      octrees: vec![PatchEntry {
        local_index: 124,
        root,
      }],
    }],
  };

  let decoded = Patch::decode(&patch.encode().unwrap()).unwrap();
  let entry = &decoded.batches[0].octrees[0];
  assert_eq!(entry.local_index, 124);
  assert_eq!(entry.root.position(), (batch * 5 + IVec3::splat(4)) * OCTREE_SIZE);
  assert!(entry.root.structurally_eq(&patch.batches[0].octrees[0].root));
}

#[test]
fn test_patch_rejects_bad_input() {
  assert!(Patch::decode(&[0, 0]).is_err());

  // Index 125 is outside a 5×5×5 batch.
  let bytes = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 125, 1, 0, 0, 0, 0, 0];
  assert!(matches!(Patch::decode(&bytes), Err(TerrainError::Truncated { .. })));

  let far = Patch {
    batches: vec![BatchPatch {
      batch: IVec3::new(40_000, 0, 0),
      octrees: Vec::new(),
    }],
  };
  assert!(far.encode().is_err());
}

#[test]
fn test_header_only_patch_is_empty() {
  let patch = Patch::decode(&PATCH_HEADER.to_le_bytes()).unwrap();
  assert!(patch.is_empty());
}

#[test]
fn test_apply_patch_replaces_loaded_octrees() {
  let batch = IVec3::ZERO;
  let (_dir, store, octrees) = store_with_batch(batch);
  let mut edited = loaded(batch, octrees.clone());
  let target = IVec3::new(0, 0, 1);
  edited.replace_octree(target, OctreeNode::filled(target * OCTREE_SIZE, SOLID));
  let patch = compute_patch(&store, &edited).unwrap();

  let mut fresh = loaded(batch, octrees);
  let mut skipped = patch.clone();
  skipped.batches.push(BatchPatch {
    batch: IVec3::new(9, 9, 9),
    octrees: vec![PatchEntry {
      local_index: 0,
      root: OctreeNode::new_root(IVec3::splat(9 * 160)),
    }],
  });

  assert_eq!(apply_patch(&mut fresh, &skipped), 1);
  let cell = fresh.cell(target).unwrap();
  assert_eq!(cell.root.sample(), SOLID);
  assert_eq!(cell.grid.interior(IVec3::ZERO), SOLID);
  assert!(!fresh.batch_exists(IVec3::new(9, 9, 9)));
}

#[test]
fn test_patch_file_round_trip() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("edits.optoctreepatch");
  let patch = Patch {
    batches: vec![BatchPatch {
      batch: IVec3::ONE,
      octrees: vec![PatchEntry {
        local_index: 31,
        root: OctreeNode::filled(IVec3::ZERO, SOLID),
      }],
    }],
  };

  patch.write(&path).unwrap();
  let read = Patch::read(&path).unwrap();
  assert_eq!(read.octree_count(), 1);
  assert_eq!(read.batches[0].batch, IVec3::ONE);

  let missing = Patch::read(&dir.path().join("missing.optoctreepatch"));
  assert!(matches!(missing, Err(TerrainError::Io { .. })));
}
