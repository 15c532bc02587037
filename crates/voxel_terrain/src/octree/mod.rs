//! Sparse voxel octree.
//!
//! Each terrain cell owns one root of size 32. Leaves carry authoritative
//! samples; branches carry a summary of their children so a coarse query can
//! stop early.
//!
//! ```text
//! height 1   size 32   root
//! height 2   size 16   ├── 8 children
//! height 3   size 8    │   ├── ...
//!   ...
//! height 6   size 1    single voxels
//! ```
//!
//! # Module Structure
//!
//! - [`node`]: `OctreeNode` - ownership, subdivision, point queries
//! - [`array`]: flattened array load/store used by the batch format
//! - [`raster`]: dense grid conversion (`rasterize` / `de_rasterize_grid`)

pub mod array;
pub mod node;
pub mod raster;

use serde::Deserialize;

pub use node::{NodeState, OctreeNode};

/// When a branch whose children are all leaves collapses back into a leaf
/// during de-rasterization.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollapseRule {
  /// All children share density and material.
  #[default]
  DensityAndType,
  /// All children share density; materials may differ and are summarized.
  DensityOnly,
}
