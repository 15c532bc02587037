//! Patch files: the octrees of a region that differ from the batches on
//! disk.

use std::path::Path;

use glam::IVec3;

use super::codec::{read_octree_record, write_octree_record, ByteReader};
use super::{local_octree_coord, local_octree_index, write_staged, BatchStore};
use crate::constants::{BATCH_OCTREES, BATCH_OCTREE_COUNT, OCTREE_SIZE};
use crate::error::{Result, TerrainError};
use crate::metaspace::Metaspace;
use crate::octree::OctreeNode;

/// Header value at the start of every patch file.
pub const PATCH_HEADER: u32 = 0;

/// One changed octree.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchEntry {
  /// x-major index of the octree within its batch (0..125).
  pub local_index: u8,
  pub root: OctreeNode,
}

/// Changed octrees of one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchPatch {
  pub batch: IVec3,
  pub octrees: Vec<PatchEntry>,
}

impl BatchPatch {
  /// Global octree coordinate of an entry.
  pub fn octree_coord(&self, entry: &PatchEntry) -> IVec3 {
    self.batch * BATCH_OCTREES + local_octree_coord(entry.local_index as usize)
  }
}

/// A whole patch file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
  pub batches: Vec<BatchPatch>,
}

impl Patch {
  pub fn is_empty(&self) -> bool {
    self.batches.is_empty()
  }

  /// Total number of changed octrees.
  pub fn octree_count(&self) -> usize {
    self.batches.iter().map(|b| b.octrees.len()).sum()
  }

  pub fn encode(&self) -> Result<Vec<u8>> {
    let mut out = PATCH_HEADER.to_le_bytes().to_vec();
    for batch in &self.batches {
      for axis in batch.batch.to_array() {
        let value = i16::try_from(axis).map_err(|_| {
          TerrainError::truncated(format!(
            "batch index {} does not fit a patch record",
            batch.batch
          ))
        })?;
        out.extend_from_slice(&value.to_le_bytes());
      }
      let count = u8::try_from(batch.octrees.len()).map_err(|_| {
        TerrainError::truncated(format!(
          "{} changed octrees in one batch record",
          batch.octrees.len()
        ))
      })?;
      out.push(count);
      for entry in &batch.octrees {
        out.push(entry.local_index);
        write_octree_record(&mut out, &entry.root)?;
      }
    }
    Ok(out)
  }

  pub fn decode(bytes: &[u8]) -> Result<Self> {
    let mut reader = ByteReader::new(bytes);
    let _header = reader.u32("patch header")?;

    let mut batches = Vec::new();
    while !reader.is_empty() {
      let x = reader.i16("patch batch x")?;
      let y = reader.i16("patch batch y")?;
      let z = reader.i16("patch batch z")?;
      let batch = IVec3::new(x as i32, y as i32, z as i32);
      let count = reader.u8("patch octree count")?;

      let mut octrees = Vec::with_capacity(count as usize);
      for _ in 0..count {
        let local_index = reader.u8("patch octree index")?;
        if local_index as usize >= BATCH_OCTREE_COUNT {
          return Err(TerrainError::truncated(format!(
            "patch octree index {} outside batch {}",
            local_index, batch
          )));
        }
        let coord = batch * BATCH_OCTREES + local_octree_coord(local_index as usize);
        let root = read_octree_record(&mut reader, coord * OCTREE_SIZE)?;
        octrees.push(PatchEntry { local_index, root });
      }
      batches.push(BatchPatch { batch, octrees });
    }
    Ok(Self { batches })
  }

  pub fn write(&self, path: &Path) -> Result<()> {
    write_staged(path, &self.encode()?)
  }

  pub fn read(path: &Path) -> Result<Self> {
    let bytes = std::fs::read(path).map_err(|e| TerrainError::io(path, e))?;
    Self::decode(&bytes)
  }
}

/// Octrees of a loaded `batch` that differ structurally from its file.
///
/// A missing file compares against empty defaults. Returns `None` when
/// nothing changed. Dirty grids must be committed beforehand.
pub fn compute_batch_patch(
  store: &BatchStore,
  metaspace: &Metaspace,
  batch: IVec3,
) -> Result<Option<BatchPatch>> {
  let original = store.read_batch(batch)?.octrees;
  let coords = store.layout().octree_coords(batch);

  let mut octrees = Vec::new();
  for (coord, original) in coords.iter().zip(&original) {
    let Some(cell) = metaspace.cell(*coord) else {
      continue;
    };
    if cell.root.structurally_eq(original) {
      continue;
    }
    let local = *coord - batch * BATCH_OCTREES;
    octrees.push(PatchEntry {
      local_index: local_octree_index(local) as u8,
      root: cell.root.clone(),
    });
  }

  tracing::debug!(?batch, changed = octrees.len(), "batch diffed");
  Ok((!octrees.is_empty()).then_some(BatchPatch { batch, octrees }))
}

/// Diff every loaded batch against disk.
pub fn compute_patch(store: &BatchStore, metaspace: &Metaspace) -> Result<Patch> {
  let mut patch = Patch::default();
  for batch in metaspace.loaded_batches() {
    if let Some(diff) = compute_batch_patch(store, metaspace, batch)? {
      patch.batches.push(diff);
    }
  }
  Ok(patch)
}

/// Replace loaded octrees with the patch's. Batches that are not loaded
/// are skipped. Returns the number of octrees replaced.
pub fn apply_patch(metaspace: &mut Metaspace, patch: &Patch) -> usize {
  let mut applied = 0;
  for batch in &patch.batches {
    if !metaspace.batch_exists(batch.batch) {
      tracing::warn!(batch = ?batch.batch, "patch batch not loaded, skipping");
      continue;
    }
    for entry in &batch.octrees {
      let coord = batch.octree_coord(entry);
      if !metaspace.octree_exists(coord) {
        tracing::warn!(?coord, "patch octree outside the loaded batch, skipping");
        continue;
      }
      metaspace.replace_octree(coord, entry.root.clone());
      applied += 1;
    }
  }
  applied
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod patch_test;
