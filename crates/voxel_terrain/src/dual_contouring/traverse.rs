//! Cell / face / edge procedures of the minimal-edge traversal.
//!
//! A missing node anywhere in a face pair or edge quadruple means the region
//! has no data there, and the procedure returns without output.

use glam::IVec3;

use super::tables::{
  CELL_EDGES, CELL_FACES, EDGE_CORNERS, EDGE_EDGES, FACE_EDGES, FACE_EDGE_ORDERS, FACE_FACES,
  PROCESS_EDGES,
};
use super::{ContourLeaf, ContourNode};
use crate::constants::child_offset;

/// Emits triangles for one contour tree.
pub(crate) struct Traversal<'a> {
  indices: &'a mut Vec<u32>,
  /// Inclusive lattice range an edge's lower endpoint must lie in.
  owned: Option<(IVec3, IVec3)>,
}

/// Child `i` of a branch, or the node itself when it is a leaf.
#[inline]
fn descend(node: &ContourNode, i: usize) -> Option<&ContourNode> {
  match node {
    ContourNode::Leaf(_) => Some(node),
    ContourNode::Branch(children) => children[i].as_ref(),
  }
}

impl<'a> Traversal<'a> {
  pub(crate) fn new(indices: &'a mut Vec<u32>, owned: Option<(IVec3, IVec3)>) -> Self {
    Self { indices, owned }
  }

  pub(crate) fn cell_proc(&mut self, node: &ContourNode) {
    let ContourNode::Branch(children) = node else {
      return;
    };

    for child in children.iter().flatten() {
      self.cell_proc(child);
    }

    for [a, b, direction] in CELL_FACES {
      if let (Some(a), Some(b)) = (&children[a], &children[b]) {
        self.face_proc([a, b], direction);
      }
    }

    for [c0, c1, c2, c3, direction] in CELL_EDGES {
      if let (Some(n0), Some(n1), Some(n2), Some(n3)) =
        (&children[c0], &children[c1], &children[c2], &children[c3])
      {
        self.edge_proc([n0, n1, n2, n3], direction);
      }
    }
  }

  fn face_proc(&mut self, nodes: [&ContourNode; 2], direction: usize) {
    if nodes.iter().all(|n| matches!(n, ContourNode::Leaf(_))) {
      return;
    }

    for [c0, c1, sub_direction] in FACE_FACES[direction] {
      if let (Some(a), Some(b)) = (descend(nodes[0], c0), descend(nodes[1], c1)) {
        self.face_proc([a, b], sub_direction);
      }
    }

    for [order, c0, c1, c2, c3, sub_direction] in FACE_EDGES[direction] {
      let order = FACE_EDGE_ORDERS[order];
      let children = [c0, c1, c2, c3];
      let mut quad = [nodes[0]; 4];
      let mut complete = true;
      for j in 0..4 {
        match descend(nodes[order[j]], children[j]) {
          Some(node) => quad[j] = node,
          None => complete = false,
        }
      }
      if complete {
        self.edge_proc(quad, sub_direction);
      }
    }
  }

  fn edge_proc(&mut self, nodes: [&ContourNode; 4], direction: usize) {
    let leaves = nodes.map(|n| match n {
      ContourNode::Leaf(leaf) => Some(leaf),
      ContourNode::Branch(_) => None,
    });
    if let [Some(l0), Some(l1), Some(l2), Some(l3)] = leaves {
      self.process_edge([l0, l1, l2, l3], direction);
      return;
    }

    for [c0, c1, c2, c3, sub_direction] in EDGE_EDGES[direction] {
      let children = [c0, c1, c2, c3];
      let mut quad = [nodes[0]; 4];
      let mut complete = true;
      for j in 0..4 {
        match descend(nodes[j], children[j]) {
          Some(node) => quad[j] = node,
          None => complete = false,
        }
      }
      if complete {
        self.edge_proc(quad, sub_direction);
      }
    }
  }

  /// Emit the quad dual to a shared edge if the finest of the four leaves
  /// sees a sign change along it.
  fn process_edge(&mut self, leaves: [&ContourLeaf; 4], direction: usize) {
    let mut min_size = i32::MAX;
    let mut min_index = 0;
    let mut flip = false;
    let mut sign_change = [false; 4];

    for (i, leaf) in leaves.iter().enumerate() {
      let [c1, c2] = EDGE_CORNERS[PROCESS_EDGES[direction][i]];
      let solid1 = leaf.is_solid(c1);
      let solid2 = leaf.is_solid(c2);
      if leaf.size < min_size {
        min_size = leaf.size;
        min_index = i;
        flip = solid1;
      }
      sign_change[i] = solid1 != solid2;
    }

    if !sign_change[min_index] {
      return;
    }

    if let Some((lo, hi)) = self.owned {
      let leaf = leaves[min_index];
      let [c1, _] = EDGE_CORNERS[PROCESS_EDGES[direction][min_index]];
      let endpoint = leaf.min + child_offset(c1) * leaf.size;
      if endpoint.cmplt(lo).any() || endpoint.cmpgt(hi).any() {
        return;
      }
    }

    // A leaf without a vertex cannot anchor a quad.
    let [Some(v0), Some(v1), Some(v2), Some(v3)] = leaves.map(|l| l.vertex) else {
      return;
    };

    if flip {
      self.indices.extend_from_slice(&[v0, v3, v1, v0, v2, v3]);
    } else {
      self.indices.extend_from_slice(&[v0, v1, v3, v0, v3, v2]);
    }
  }
}
