//! Cube topology tables for the minimal-edge traversal.
//!
//! Corner `i` sits at `((i>>2)&1, (i>>1)&1, i&1)`; child octants use the same
//! numbering. Direction 0/1/2 = x/y/z.
//!
//! ```text
//! Edge  Axis  Corners      Edge  Axis  Corners      Edge  Axis  Corners
//! ────  ────  ───────      ────  ────  ───────      ────  ────  ───────
//!   0    X    [0, 4]         4    Y    [0, 2]         8    Z    [0, 1]
//!   1    X    [1, 5]         5    Y    [1, 3]         9    Z    [2, 3]
//!   2    X    [2, 6]         6    Y    [4, 6]        10    Z    [4, 5]
//!   3    X    [3, 7]         7    Y    [5, 7]        11    Z    [6, 7]
//! ```
//!
//! These are structural constants of the cube and are consumed as given.

/// Corner pair of each edge, lower corner first.
pub const EDGE_CORNERS: [[usize; 2]; 12] = [
  [0, 4],
  [1, 5],
  [2, 6],
  [3, 7],
  [0, 2],
  [1, 3],
  [4, 6],
  [5, 7],
  [0, 1],
  [2, 3],
  [4, 5],
  [6, 7],
];

/// Internal face pairs of a cell: `[child_a, child_b, direction]`.
pub const CELL_FACES: [[usize; 3]; 12] = [
  [0, 4, 0],
  [1, 5, 0],
  [2, 6, 0],
  [3, 7, 0],
  [0, 2, 1],
  [4, 6, 1],
  [1, 3, 1],
  [5, 7, 1],
  [0, 1, 2],
  [2, 3, 2],
  [4, 5, 2],
  [6, 7, 2],
];

/// Internal edge quadruples of a cell: `[c0, c1, c2, c3, direction]`.
pub const CELL_EDGES: [[usize; 5]; 6] = [
  [0, 1, 2, 3, 0],
  [4, 5, 6, 7, 0],
  [0, 4, 1, 5, 1],
  [2, 6, 3, 7, 1],
  [0, 2, 4, 6, 2],
  [1, 3, 5, 7, 2],
];

/// Sub-face pairs of a face, per direction: `[child_of_a, child_of_b, direction]`.
pub const FACE_FACES: [[[usize; 3]; 4]; 3] = [
  [[4, 0, 0], [5, 1, 0], [6, 2, 0], [7, 3, 0]],
  [[2, 0, 1], [6, 4, 1], [3, 1, 1], [7, 5, 1]],
  [[1, 0, 2], [3, 2, 2], [5, 4, 2], [7, 6, 2]],
];

/// Sub-edges of a face, per direction:
/// `[order, c0, c1, c2, c3, direction]`.
pub const FACE_EDGES: [[[usize; 6]; 4]; 3] = [
  [[1, 4, 0, 5, 1, 1], [1, 6, 2, 7, 3, 1], [0, 4, 6, 0, 2, 2], [0, 5, 7, 1, 3, 2]],
  [[0, 2, 3, 0, 1, 0], [0, 6, 7, 4, 5, 0], [1, 2, 0, 6, 4, 2], [1, 3, 1, 7, 5, 2]],
  [[1, 1, 0, 3, 2, 0], [1, 5, 4, 7, 6, 0], [0, 1, 5, 0, 4, 1], [0, 3, 7, 2, 6, 1]],
];

/// Which of the two face nodes supplies each of the four edge nodes.
pub const FACE_EDGE_ORDERS: [[usize; 4]; 2] = [[0, 0, 1, 1], [0, 1, 0, 1]];

/// Sub-edges of an edge, per direction: `[c0, c1, c2, c3, direction]`.
pub const EDGE_EDGES: [[[usize; 5]; 2]; 3] = [
  [[3, 2, 1, 0, 0], [7, 6, 5, 4, 0]],
  [[5, 1, 4, 0, 1], [7, 3, 6, 2, 1]],
  [[6, 4, 2, 0, 2], [7, 5, 3, 1, 2]],
];

/// Edge of each of the four nodes around a shared edge, per direction.
pub const PROCESS_EDGES: [[usize; 4]; 3] = [[3, 2, 1, 0], [7, 5, 6, 4], [11, 10, 9, 8]];

#[cfg(test)]
#[path = "tables_test.rs"]
mod tables_test;
