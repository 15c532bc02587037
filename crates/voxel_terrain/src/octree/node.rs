//! OctreeNode - owned sparse octree of voxel samples.
//!
//! A node is either a leaf holding an authoritative sample, or a branch that
//! owns exactly 8 children. A branch's own sample is a cached summary of its
//! children (most common material, mean density) and is only authoritative
//! right after an array load.

use glam::IVec3;

use crate::constants::{child_index_of, child_offset, OCTREE_SIZE};
use crate::types::OctNodeSample;

/// Explicit node state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
  Leaf,
  Branch,
}

#[derive(Clone, Debug)]
pub(crate) enum Children {
  Leaf,
  Branch(Box<[OctreeNode; 8]>),
}

/// Octree node with exclusively owned children.
#[derive(Clone, Debug)]
pub struct OctreeNode {
  /// Voxel-space origin (minimum corner).
  pub(crate) position: IVec3,
  /// Edge length in voxels; halves per level.
  pub(crate) size: i32,
  pub(crate) sample: OctNodeSample,
  pub(crate) children: Children,
}

impl OctreeNode {
  /// Create a leaf root of the standard octree size.
  pub fn new_root(position: IVec3) -> Self {
    Self::with_size(position, OCTREE_SIZE)
  }

  /// Create a leaf of any power-of-two size.
  pub fn with_size(position: IVec3, size: i32) -> Self {
    debug_assert!(size > 0 && (size as u32).is_power_of_two());
    Self {
      position,
      size,
      sample: OctNodeSample::EMPTY,
      children: Children::Leaf,
    }
  }

  /// Create a leaf root filled with one sample.
  pub fn filled(position: IVec3, sample: OctNodeSample) -> Self {
    let mut node = Self::new_root(position);
    node.set_sample(sample);
    node
  }

  #[inline]
  pub fn position(&self) -> IVec3 {
    self.position
  }

  #[inline]
  pub fn size(&self) -> i32 {
    self.size
  }

  /// This node's sample. For a branch this is a derived summary.
  #[inline]
  pub fn sample(&self) -> OctNodeSample {
    self.sample
  }

  /// Overwrite this node's material and density.
  pub fn set_sample(&mut self, sample: OctNodeSample) {
    self.sample.material = sample.material;
    self.sample.density = sample.density;
  }

  #[inline]
  pub fn state(&self) -> NodeState {
    match self.children {
      Children::Leaf => NodeState::Leaf,
      Children::Branch(_) => NodeState::Branch,
    }
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self.children, Children::Leaf)
  }

  pub fn children(&self) -> Option<&[OctreeNode; 8]> {
    match &self.children {
      Children::Leaf => None,
      Children::Branch(children) => Some(children),
    }
  }

  pub fn children_mut(&mut self) -> Option<&mut [OctreeNode; 8]> {
    match &mut self.children {
      Children::Leaf => None,
      Children::Branch(children) => Some(children),
    }
  }

  /// Whether `voxel` lies inside this node's cube.
  #[inline]
  pub fn contains(&self, voxel: IVec3) -> bool {
    let local = voxel - self.position;
    local.cmpge(IVec3::ZERO).all() && local.cmplt(IVec3::splat(self.size)).all()
  }

  /// Leaf → Branch. Children start with this node's sample.
  ///
  /// No-op when children already exist. Returns false for a size-1 node,
  /// which cannot be split.
  pub fn subdivide(&mut self) -> bool {
    if !self.is_leaf() {
      return true;
    }
    if self.size < 2 {
      return false;
    }
    let half = self.size / 2;
    let mut sample = self.sample;
    sample.child_offset = 0;
    let children = std::array::from_fn(|i| OctreeNode {
      position: self.position + child_offset(i) * half,
      size: half,
      sample,
      children: Children::Leaf,
    });
    self.children = Children::Branch(Box::new(children));
    true
  }

  /// Branch → Leaf. Frees the whole subtree.
  pub fn strip_children(&mut self) {
    self.children = Children::Leaf;
    self.sample.child_offset = 0;
  }

  /// Sample at `voxel`, descending at most `max_height` levels (this node is
  /// height 1).
  ///
  /// Returns `None` when `voxel` is outside this node; callers bounds-check
  /// at the metaspace boundary.
  pub fn get_voxel(&self, voxel: IVec3, max_height: u32) -> Option<OctNodeSample> {
    if !self.contains(voxel) {
      return None;
    }
    let mut node = self;
    let mut height = 1;
    while height < max_height {
      match &node.children {
        Children::Leaf => break,
        Children::Branch(children) => {
          let index = child_index_of(voxel - node.position, node.size / 2);
          node = &children[index];
          height += 1;
        }
      }
    }
    Some(node.sample)
  }

  /// Height of the subtree; a leaf is 1.
  pub fn max_depth(&self) -> u32 {
    match &self.children {
      Children::Leaf => 1,
      Children::Branch(children) => 1 + children.iter().map(|c| c.max_depth()).max().unwrap_or(0),
    }
  }

  /// Number of nodes in the subtree.
  pub fn node_count(&self) -> usize {
    match &self.children {
      Children::Leaf => 1,
      Children::Branch(children) => 1 + children.iter().map(|c| c.node_count()).sum::<usize>(),
    }
  }

  /// Recompute this branch's summary from its children.
  ///
  /// Material = most common nonzero child material (first in child order on
  /// ties); density = rounded mean of nonzero child densities, 0 if none.
  pub fn refresh_summary(&mut self) {
    if let Children::Branch(children) = &self.children {
      let summary = summarize(children);
      self.set_sample(summary);
    }
  }

  /// Deep equality of shape, sizes, materials and densities.
  pub fn structurally_eq(&self, other: &Self) -> bool {
    if self.size != other.size || !self.sample.same_value(&other.sample) {
      return false;
    }
    match (&self.children, &other.children) {
      (Children::Leaf, Children::Leaf) => true,
      (Children::Branch(a), Children::Branch(b)) => {
        a.iter().zip(b.iter()).all(|(x, y)| x.structurally_eq(y))
      }
      _ => false,
    }
  }
}

impl PartialEq for OctreeNode {
  fn eq(&self, other: &Self) -> bool {
    self.structurally_eq(other)
  }
}

pub(crate) fn summarize(children: &[OctreeNode; 8]) -> OctNodeSample {
  let mut best_material = 0u8;
  let mut best_count = 0usize;
  for (i, child) in children.iter().enumerate() {
    let material = child.sample.material;
    if material == 0 || children[..i].iter().any(|c| c.sample.material == material) {
      continue;
    }
    let count = children
      .iter()
      .filter(|c| c.sample.material == material)
      .count();
    if count > best_count {
      best_material = material;
      best_count = count;
    }
  }

  let mut sum = 0u32;
  let mut count = 0u32;
  for child in children.iter() {
    if child.sample.density != 0 {
      sum += child.sample.density as u32;
      count += 1;
    }
  }
  let density = if count == 0 {
    0
  } else {
    ((sum + count / 2) / count) as u8
  };

  OctNodeSample::new(best_material, density)
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
