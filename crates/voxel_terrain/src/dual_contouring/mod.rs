//! Octree Dual Contouring.
//!
//! Converts an octree, or a padded grid treated as a complete octree, into a
//! triangle mesh with one vertex per sign-changing leaf.
//!
//! # Processing Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 1: Contour Tree                        │
//! │  Grid:   complete tree over padded cells 0..=R                  │
//! │          cell exists iff all 8 corner samples are available     │
//! │  Octree: one contour leaf per octree leaf                       │
//! │  Each leaf: 8-bit solid corner mask, optional vertex index      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 2: Vertex Placement                    │
//! │  Mass point of the interpolated edge crossings of the leaf      │
//! │  Material: most common nonzero type among solid corners         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 3: Traversal                           │
//! │  cell_proc → face_proc → edge_proc → process_edge               │
//! │  One quad per sign-changing edge, judged by the finest leaf     │
//! │  Winding: triangles face from solid toward empty                │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 4: Normals                             │
//! │  Area-weighted accumulation of face normals                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Edge Ownership (grid path)
//!
//! A quad is emitted only when the lower endpoint of its edge lies in the
//! padded range `1..=R` on every axis. Neighbouring grids therefore never
//! emit the same quad, and quads across the `+` faces are emitted by the
//! grid whose halo supplies the far samples.

pub mod normals;
pub mod tables;

mod build;
mod traverse;

use glam::IVec3;

use crate::grid::VoxelGrid;
use crate::octree::OctreeNode;
use crate::types::MeshOutput;

use traverse::Traversal;

/// Leaf of a contour tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContourLeaf {
  /// Minimum corner on the traversal lattice.
  pub min: IVec3,
  pub size: i32,
  /// Bit `i` set when corner `i` is solid.
  pub corners: u8,
  /// Index into the output vertices, `None` when the leaf has no surface.
  pub vertex: Option<u32>,
}

impl ContourLeaf {
  #[inline]
  pub fn is_solid(&self, corner: usize) -> bool {
    (self.corners >> corner) & 1 == 1
  }
}

/// Node of a contour tree. Missing children are regions without data.
#[derive(Clone, Debug)]
pub enum ContourNode {
  Leaf(ContourLeaf),
  Branch(Box<[Option<ContourNode>; 8]>),
}

impl ContourNode {
  /// Number of leaves in the tree.
  pub fn leaf_count(&self) -> usize {
    match self {
      ContourNode::Leaf(_) => 1,
      ContourNode::Branch(children) => children.iter().flatten().map(|c| c.leaf_count()).sum(),
    }
  }
}

/// Run the traversal over `root`, appending triangles to `output`.
pub fn contour(root: &ContourNode, owned: Option<(IVec3, IVec3)>, output: &mut MeshOutput) {
  Traversal::new(&mut output.indices, owned).cell_proc(root);
}

/// Mesh one grid. Positions are octree-local voxel units.
pub fn contour_grid(grid: &VoxelGrid) -> MeshOutput {
  let mut output = MeshOutput::new();
  if let Some(root) = build::grid_tree(grid, &mut output) {
    let r = grid.resolution() as i32;
    contour(&root, Some((IVec3::ONE, IVec3::splat(r))), &mut output);
  }
  finish(output)
}

/// Mesh an octree directly. Positions are relative to the root's origin.
pub fn contour_octree(root: &OctreeNode) -> MeshOutput {
  let mut output = MeshOutput::new();
  let tree = build::octree_tree(root, &mut output);
  contour(&tree, None, &mut output);
  finish(output)
}

/// Drop vertices no triangle references and derive normals.
fn finish(mut output: MeshOutput) -> MeshOutput {
  compact(&mut output);
  normals::recalculate_from_geometry(&mut output);
  output
}

fn compact(output: &mut MeshOutput) {
  let mut remap = vec![u32::MAX; output.vertices.len()];
  let mut vertices = Vec::with_capacity(output.vertices.len());
  for index in output.indices.iter_mut() {
    let old = *index as usize;
    if remap[old] == u32::MAX {
      remap[old] = vertices.len() as u32;
      vertices.push(output.vertices[old]);
    }
    *index = remap[old];
  }
  output.bounds = Default::default();
  for vertex in &vertices {
    output.bounds.encapsulate(vertex.position);
  }
  output.vertices = vertices;
}
