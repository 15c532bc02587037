//! Layout constants for octrees, batches and padded voxel grids.
//!
//! # Address Space
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VOXEL ADDRESS SPACE                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  batch   = floor(coord / 160)        5 octrees per batch axis           │
//! │  octree  = floor(coord / 32) mod 5   32 voxels per octree axis          │
//! │  voxel   = coord mod 32                                                 │
//! │                                                                         │
//! │  ├──────────────── batch (160) ─────────────────┤                       │
//! │  ├─ oct 0 ─┼─ oct 1 ─┼─ oct 2 ─┼─ oct 3 ─┼─ oct 4 ─┤                    │
//! │  0        32        64        96       128       160                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Padded Grid Layout
//!
//! ```text
//! Padded index:  0     1     2    ...    R     R+1
//!                │     │                 │     │
//!                │     └── R interior ───┘     │
//!                │         voxels              │
//!                └─ halo (-1 neighbour)        └─ halo (+1 neighbour)
//! ```
//!
//! `R = 32 >> lod`. Padded index `i` holds local voxel `(i - 1) << lod`.
//!
//! # Child / Corner Numbering
//!
//! ```text
//!         +Y
//!          │
//!          │
//!          └───────── +X
//!         /
//!        +Z
//!
//! index bits: x = bit 2, y = bit 1, z = bit 0
//!   0 = (0,0,0)    4 = (1,0,0)
//!   1 = (0,0,1)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (1,1,0)
//!   3 = (0,1,1)    7 = (1,1,1)
//! ```

use glam::IVec3;

/// Edge length of a root octree node in voxels.
pub const OCTREE_SIZE: i32 = 32;

/// Maximum octree depth (sizes 32, 16, 8, 4, 2, 1).
pub const MAX_DEPTH: u32 = 6;

/// Coarsest supported level of detail (grid resolution 1).
pub const MAX_LOD: u32 = MAX_DEPTH - 1;

/// Octrees per batch axis.
pub const BATCH_OCTREES: i32 = 5;

/// Octrees in a full batch (5 × 5 × 5).
pub const BATCH_OCTREE_COUNT: usize = (BATCH_OCTREES * BATCH_OCTREES * BATCH_OCTREES) as usize;

/// Edge length of a batch in voxels (5 × 32).
pub const BATCH_SIZE: i32 = BATCH_OCTREES * OCTREE_SIZE;

/// Grid resolution (interior voxels per axis) at a level of detail.
#[inline]
pub const fn resolution_for_lod(lod: u32) -> usize {
  (OCTREE_SIZE as usize) >> lod
}

/// Octree height that rasterizes to the resolution of `lod`.
#[inline]
pub const fn max_height_for_lod(lod: u32) -> u32 {
  MAX_DEPTH - lod
}

/// Convert 3D coordinates to a linear index in an x-major cube of edge `n`.
#[inline(always)]
pub const fn cube_index(x: usize, y: usize, z: usize, n: usize) -> usize {
  (x * n + y) * n + z
}

/// Offset of child (or corner) `i` within the unit cube.
#[inline(always)]
pub const fn child_offset(i: usize) -> IVec3 {
  IVec3::new(((i >> 2) & 1) as i32, ((i >> 1) & 1) as i32, (i & 1) as i32)
}

/// Child index of the octant containing `local` inside a node of `size`.
#[inline(always)]
pub fn child_index_of(local: IVec3, half: i32) -> usize {
  let x = (local.x >= half) as usize;
  let y = (local.y >= half) as usize;
  let z = (local.z >= half) as usize;
  (x << 2) | (y << 1) | z
}

/// Unit offsets toward the 26 neighbours, plus the zero offset at index 13.
///
/// Index = `(dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)`.
pub const NEIGHBOR_OFFSETS: [IVec3; 27] = {
  let mut offsets = [IVec3::ZERO; 27];
  let mut i = 0;
  while i < 27 {
    offsets[i] = IVec3::new((i / 9) as i32 - 1, ((i / 3) % 3) as i32 - 1, (i % 3) as i32 - 1);
    i += 1;
  }
  offsets
};

/// Index into [`NEIGHBOR_OFFSETS`] for a unit offset.
#[inline(always)]
pub const fn neighbor_index(offset: IVec3) -> usize {
  ((offset.x + 1) * 9 + (offset.y + 1) * 3 + (offset.z + 1)) as usize
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
