//! Flattened array form of an octree.
//!
//! ```text
//! index: 0      1..=8              9..=16            ...
//!        root   root's children    children of the first branching child
//!        │      ▲
//!        └──────┘ child_offset = 1
//! ```
//!
//! Each branch's 8 children occupy one contiguous block; the branch's
//! `child_offset` points at the block start. Leaves store 0.

use glam::IVec3;

use super::node::{Children, OctreeNode};
use crate::error::{Result, TerrainError};
use crate::types::OctNodeSample;

impl OctreeNode {
  /// Rebuild this node from `data[pos]`, recursing into child blocks.
  pub fn read_array(&mut self, data: &[OctNodeSample], pos: usize) -> Result<()> {
    let sample = *data.get(pos).ok_or(TerrainError::NodeIndexOutOfRange {
      index: pos,
      len: data.len(),
    })?;
    self.strip_children();
    self.sample = sample;

    let offset = sample.child_offset as usize;
    if offset == 0 {
      return Ok(());
    }
    if offset + 8 > data.len() {
      return Err(TerrainError::NodeIndexOutOfRange {
        index: offset + 7,
        len: data.len(),
      });
    }
    if offset <= pos {
      // Child blocks always follow their parent; anything else would loop.
      return Err(TerrainError::truncated(format!(
        "node {} points backwards to child block {}",
        pos, offset
      )));
    }
    if !self.subdivide() {
      return Err(TerrainError::truncated(format!(
        "node {} of size {} cannot have children",
        pos, self.size
      )));
    }
    if let Children::Branch(children) = &mut self.children {
      for (i, child) in children.iter_mut().enumerate() {
        child.read_array(data, offset + i)?;
      }
    }
    Ok(())
  }

  /// Build a root of the standard size from a flattened array.
  pub fn from_array(position: IVec3, data: &[OctNodeSample]) -> Result<Self> {
    let mut root = Self::new_root(position);
    root.read_array(data, 0)?;
    Ok(root)
  }

  /// Flatten this subtree into the layout [`read_array`](Self::read_array)
  /// expects.
  pub fn write_to_array(&self) -> Vec<OctNodeSample> {
    let mut out = Vec::with_capacity(self.node_count());
    let mut root = self.sample;
    root.child_offset = 0;
    out.push(root);
    self.write_children(0, &mut out);
    out
  }

  fn write_children(&self, self_index: usize, out: &mut Vec<OctNodeSample>) {
    let Children::Branch(children) = &self.children else {
      return;
    };
    let offset = out.len();
    for child in children.iter() {
      let mut sample = child.sample;
      sample.child_offset = 0;
      out.push(sample);
    }
    out[self_index].child_offset = offset as u16;
    for (i, child) in children.iter().enumerate() {
      child.write_children(offset + i, out);
    }
  }
}

#[cfg(test)]
#[path = "array_test.rs"]
mod array_test;
