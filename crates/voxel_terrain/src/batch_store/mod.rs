//! Batch files: address mapping, `.optoctrees` batches and
//! `.optoctreepatch` diffs.
//!
//! # File Formats
//!
//! ```text
//! compiled-batch-{x}-{y}-{z}.optoctrees
//! ┌──────────────┬──────────────────────────────────────────────────┐
//! │ i32 header=4 │ dims.x * dims.y * dims.z octree records (x-major) │
//! └──────────────┴──────────────────────────────────────────────────┘
//!
//! octree record
//! ┌────────────────┬───────────────────────────────────────────────┐
//! │ u16 node_count │ node_count × {u8 type, u8 density, u16 child} │
//! └────────────────┴───────────────────────────────────────────────┘
//!
//! *.optoctreepatch
//! ┌──────────────┬───────────────────────────────────────────────────┐
//! │ u32 header=0 │ { i16 x, i16 y, i16 z, u8 count,                  │
//! │              │   count × { u8 local_index, octree record } } ... │
//! └──────────────┴───────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Writers stage the whole file in memory,
//! write a sibling temp file and rename it over the destination.
//!
//! # Module Structure
//!
//! - `codec` - Byte-level batch and octree record encoding
//! - `patch` - Patch records, diffing against disk and import

pub mod codec;
pub mod patch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glam::IVec3;

use crate::config::WorldExtent;
use crate::constants::{cube_index, BATCH_OCTREES, BATCH_SIZE, OCTREE_SIZE};
use crate::error::{Result, TerrainError};
use crate::octree::OctreeNode;

pub use codec::{decode_batch, encode_batch};
pub use patch::{apply_patch, compute_batch_patch, compute_patch, BatchPatch, Patch, PatchEntry};

/// File extension of batch files.
pub const BATCH_EXTENSION: &str = "optoctrees";

/// File extension of patch files.
pub const PATCH_EXTENSION: &str = "optoctreepatch";

// =============================================================================
// Address mapping
// =============================================================================

/// A global voxel split into batch, octree-in-batch and voxel-in-octree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelAddress {
  pub batch: IVec3,
  /// Octree within the batch, `0..5` per axis.
  pub octree: IVec3,
  /// Voxel within the octree, `0..32` per axis.
  pub voxel: IVec3,
}

impl VoxelAddress {
  /// Split a global voxel coordinate.
  pub fn of(coord: IVec3) -> Self {
    let batch = coord.div_euclid(IVec3::splat(BATCH_SIZE));
    let octree = coord
      .div_euclid(IVec3::splat(OCTREE_SIZE))
      .rem_euclid(IVec3::splat(BATCH_OCTREES));
    let voxel = coord.rem_euclid(IVec3::splat(OCTREE_SIZE));
    Self { batch, octree, voxel }
  }

  /// Global voxel coordinate.
  pub fn global(&self) -> IVec3 {
    self.batch * BATCH_SIZE + self.octree * OCTREE_SIZE + self.voxel
  }

  /// Global octree coordinate.
  pub fn global_octree(&self) -> IVec3 {
    self.batch * BATCH_OCTREES + self.octree
  }

  /// x-major index of the octree within its batch.
  pub fn octree_index(&self) -> usize {
    local_octree_index(self.octree)
  }
}

/// x-major index `(x*5 + y)*5 + z` of a local octree coordinate.
#[inline]
pub fn local_octree_index(local: IVec3) -> usize {
  cube_index(local.x as usize, local.y as usize, local.z as usize, BATCH_OCTREES as usize)
}

/// Inverse of [`local_octree_index`].
#[inline]
pub fn local_octree_coord(index: usize) -> IVec3 {
  let n = BATCH_OCTREES as usize;
  IVec3::new((index / (n * n)) as i32, ((index / n) % n) as i32, (index % n) as i32)
}

// =============================================================================
// Layout
// =============================================================================

/// Batch shapes derived from the world size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchLayout {
  pub world_extent: WorldExtent,
}

impl BatchLayout {
  pub fn new(world_extent: WorldExtent) -> Self {
    Self { world_extent }
  }

  /// Octrees per axis in `batch`. Batches at the far edge of a bounded
  /// axis hold the remainder; batches past it hold none.
  pub fn octree_dimensions(&self, batch: IVec3) -> IVec3 {
    let axis = |extent: Option<i32>, b: i32| match extent {
      Some(extent) => (extent - b * BATCH_OCTREES).clamp(0, BATCH_OCTREES),
      None => BATCH_OCTREES,
    };
    let [x, y, z] = self.world_extent.axes();
    IVec3::new(axis(x, batch.x), axis(y, batch.y), axis(z, batch.z))
  }

  /// Number of octree records in the batch file.
  pub fn octree_count(&self, batch: IVec3) -> usize {
    let dims = self.octree_dimensions(batch);
    (dims.x * dims.y * dims.z) as usize
  }

  /// Global octree coordinates of `batch` in file order.
  pub fn octree_coords(&self, batch: IVec3) -> Vec<IVec3> {
    let dims = self.octree_dimensions(batch);
    let base = batch * BATCH_OCTREES;
    let mut coords = Vec::with_capacity(self.octree_count(batch));
    for x in 0..dims.x {
      for y in 0..dims.y {
        for z in 0..dims.z {
          coords.push(base + IVec3::new(x, y, z));
        }
      }
    }
    coords
  }

  /// Empty single-leaf octrees filling `batch`.
  pub fn default_octrees(&self, batch: IVec3) -> Vec<OctreeNode> {
    self
      .octree_coords(batch)
      .into_iter()
      .map(|coord| OctreeNode::new_root(coord * OCTREE_SIZE))
      .collect()
  }
}

// =============================================================================
// Store
// =============================================================================

/// Octrees read from one batch file.
#[derive(Debug)]
pub struct LoadedBatch {
  pub octrees: Vec<OctreeNode>,
  /// Set when the file was missing and defaults were synthesized.
  pub warning: Option<String>,
}

/// Batch files under one directory.
#[derive(Clone, Debug)]
pub struct BatchStore {
  root_dir: PathBuf,
  layout: BatchLayout,
}

impl BatchStore {
  pub fn new(root_dir: impl Into<PathBuf>, layout: BatchLayout) -> Self {
    Self {
      root_dir: root_dir.into(),
      layout,
    }
  }

  /// Same layout, different directory.
  pub fn with_root_dir(&self, root_dir: impl Into<PathBuf>) -> Self {
    Self::new(root_dir, self.layout)
  }

  pub fn root_dir(&self) -> &Path {
    &self.root_dir
  }

  pub fn layout(&self) -> &BatchLayout {
    &self.layout
  }

  pub fn batch_path(&self, batch: IVec3) -> PathBuf {
    self.root_dir.join(format!(
      "compiled-batch-{}-{}-{}.{}",
      batch.x, batch.y, batch.z, BATCH_EXTENSION
    ))
  }

  /// Read one batch. A missing file yields empty octrees and a warning.
  pub fn read_batch(&self, batch: IVec3) -> Result<LoadedBatch> {
    let path = self.batch_path(batch);
    let bytes = match std::fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        let message = format!("batch file {} is missing, using empty terrain", path.display());
        tracing::warn!(?batch, path = %path.display(), "batch file missing");
        return Ok(LoadedBatch {
          octrees: self.layout.default_octrees(batch),
          warning: Some(message),
        });
      }
      Err(e) => return Err(TerrainError::io(path, e)),
    };

    let octrees = decode_batch(&bytes, batch, self.layout.octree_dimensions(batch))?;
    tracing::debug!(?batch, octrees = octrees.len(), bytes = bytes.len(), "batch read");
    Ok(LoadedBatch {
      octrees,
      warning: None,
    })
  }

  /// Write one batch. `octrees` must be in file order.
  pub fn write_batch<'a>(
    &self,
    batch: IVec3,
    octrees: impl IntoIterator<Item = &'a OctreeNode>,
  ) -> Result<()> {
    let bytes = encode_batch(octrees)?;
    write_staged(&self.batch_path(batch), &bytes)?;
    tracing::debug!(?batch, bytes = bytes.len(), "batch written");
    Ok(())
  }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub fn write_staged(path: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(|e| TerrainError::io(parent, e))?;
  }

  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);

  let write = || -> io::Result<()> {
    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()
  };
  if let Err(e) = write() {
    let _ = std::fs::remove_file(&tmp);
    return Err(TerrainError::io(&tmp, e));
  }
  std::fs::rename(&tmp, path).map_err(|e| TerrainError::io(path, e))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
