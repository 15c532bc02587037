//! Contour tree construction and vertex placement.

use glam::{IVec3, Vec3};

use super::tables::EDGE_CORNERS;
use super::{ContourLeaf, ContourNode};
use crate::constants::{child_offset, MAX_DEPTH};
use crate::grid::VoxelGrid;
use crate::octree::OctreeNode;
use crate::types::{MaterialId, MeshOutput, OctNodeSample, Vertex};

/// Samples at the 8 corners of one leaf.
struct Corners {
  solid: u8,
  distance: [f32; 8],
  material: [MaterialId; 8],
}

impl Corners {
  fn from_samples(samples: [OctNodeSample; 8]) -> Self {
    let mut solid = 0u8;
    for (i, sample) in samples.iter().enumerate() {
      if sample.is_below_surface() {
        solid |= 1 << i;
      }
    }
    Self {
      solid,
      distance: samples.map(|s| s.signed_distance()),
      material: samples.map(|s| s.material),
    }
  }

  #[inline]
  fn is_mixed(&self) -> bool {
    self.solid != 0 && self.solid != 0xFF
  }

  #[inline]
  fn is_solid(&self, corner: usize) -> bool {
    (self.solid >> corner) & 1 == 1
  }

  /// Mass point of the edge crossings in unit-cube coordinates.
  fn mass_point(&self) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for [a, b] in EDGE_CORNERS {
      if self.is_solid(a) == self.is_solid(b) {
        continue;
      }
      let (da, db) = (self.distance[a], self.distance[b]);
      let t = if (da - db).abs() > f32::EPSILON {
        (da / (da - db)).clamp(0.0, 1.0)
      } else {
        0.5
      };
      let pa = child_offset(a).as_vec3();
      let pb = child_offset(b).as_vec3();
      sum += pa + (pb - pa) * t;
      count += 1;
    }
    if count == 0 {
      Vec3::splat(0.5)
    } else {
      sum / count as f32
    }
  }

  /// Most common nonzero material among solid corners, first corner wins
  /// ties.
  fn dominant_material(&self) -> MaterialId {
    let mut best = 0;
    let mut best_count = 0;
    for i in 0..8 {
      let material = self.material[i];
      if !self.is_solid(i) || material == 0 {
        continue;
      }
      let count = (0..8)
        .filter(|&j| self.is_solid(j) && self.material[j] == material)
        .count();
      if count > best_count {
        best = material;
        best_count = count;
      }
    }
    best
  }

  /// Push the leaf's vertex at `origin + mass_point * size`.
  fn push_vertex(&self, origin: Vec3, size: f32, output: &mut MeshOutput) -> u32 {
    let position = origin + self.mass_point() * size;
    output.push_vertex(Vertex {
      position: position.to_array(),
      material: self.dominant_material(),
      ..Vertex::default()
    })
  }
}

// =============================================================================
// Grid path
// =============================================================================

/// Complete tree over padded cells `0..=R`. `None` when no cell has a
/// surface.
pub(super) fn grid_tree(grid: &VoxelGrid, output: &mut MeshOutput) -> Option<ContourNode> {
  let cells = grid.resolution() as u32 + 1;
  let size = cells.next_power_of_two() as i32;
  grid_node(grid, IVec3::ZERO, size, output)
}

fn grid_node(
  grid: &VoxelGrid,
  min: IVec3,
  size: i32,
  output: &mut MeshOutput,
) -> Option<ContourNode> {
  let last_cell = grid.resolution() as i32;
  if min.cmpgt(IVec3::splat(last_cell)).any() {
    return None;
  }
  if size == 1 {
    return grid_leaf(grid, min, output).map(ContourNode::Leaf);
  }

  let half = size / 2;
  let children: [Option<ContourNode>; 8] =
    std::array::from_fn(|i| grid_node(grid, min + child_offset(i) * half, half, output));
  if children.iter().all(Option::is_none) {
    return None;
  }
  Some(ContourNode::Branch(Box::new(children)))
}

/// Unit cell at padded `cell`. Cells with an unavailable corner or without
/// a sign change are omitted.
fn grid_leaf(grid: &VoxelGrid, cell: IVec3, output: &mut MeshOutput) -> Option<ContourLeaf> {
  let mut samples = [OctNodeSample::EMPTY; 8];
  for (i, sample) in samples.iter_mut().enumerate() {
    let p = cell + child_offset(i);
    if !grid.is_available(p) {
      return None;
    }
    *sample = grid.sample(p);
  }

  let corners = Corners::from_samples(samples);
  if !corners.is_mixed() {
    return None;
  }

  let scale = grid.scale() as f32;
  let origin = (cell - IVec3::ONE).as_vec3() * scale;
  let vertex = corners.push_vertex(origin, scale, output);
  Some(ContourLeaf {
    min: cell,
    size: 1,
    corners: corners.solid,
    vertex: Some(vertex),
  })
}

// =============================================================================
// Octree path
// =============================================================================

/// Contour tree mirroring the octree's leaves, on the root-local lattice.
pub(super) fn octree_tree(root: &OctreeNode, output: &mut MeshOutput) -> ContourNode {
  octree_node(root, root, output)
}

fn octree_node(root: &OctreeNode, node: &OctreeNode, output: &mut MeshOutput) -> ContourNode {
  match node.children() {
    Some(children) => ContourNode::Branch(Box::new(std::array::from_fn(|i| {
      Some(octree_node(root, &children[i], output))
    }))),
    None => ContourNode::Leaf(octree_leaf(root, node, output)),
  }
}

/// Leaf whose corners are sampled at the corner points, clamped into the
/// root's bounds.
fn octree_leaf(root: &OctreeNode, node: &OctreeNode, output: &mut MeshOutput) -> ContourLeaf {
  let lo = root.position();
  let hi = lo + IVec3::splat(root.size() - 1);
  let samples = std::array::from_fn(|i| {
    let point = (node.position() + child_offset(i) * node.size()).clamp(lo, hi);
    root.get_voxel(point, MAX_DEPTH).unwrap_or(OctNodeSample::EMPTY)
  });

  let corners = Corners::from_samples(samples);
  let min = node.position() - root.position();
  let vertex = corners
    .is_mixed()
    .then(|| corners.push_vertex(min.as_vec3(), node.size() as f32, output));
  ContourLeaf {
    min,
    size: node.size(),
    corners: corners.solid,
    vertex,
  }
}

#[cfg(test)]
#[path = "build_test.rs"]
mod build_test;
