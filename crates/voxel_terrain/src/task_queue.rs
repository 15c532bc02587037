//! Meshing stage for parallel Dual Contouring.
//!
//! Following the IStage pattern: Enqueue → Tick → Completions
//!
//! Each request owns a copy of its grid, so meshing runs on rayon's pool
//! without borrowing the metaspace.

use glam::IVec3;
use rayon::prelude::*;
use web_time::Instant;

use crate::dual_contouring;
use crate::grid::VoxelGrid;
use crate::types::MeshOutput;

/// Request to mesh one octree's grid.
#[derive(Clone)]
pub struct MeshRequest {
  /// Unique identifier for this request
  pub id: u64,
  /// Octree coordinate the grid belongs to
  pub coord: IVec3,
  /// Grid snapshot, halos included
  pub grid: VoxelGrid,
}

/// Completed mesh result.
pub struct MeshCompletion {
  /// Request ID this completion corresponds to
  pub id: u64,
  pub coord: IVec3,
  /// Generated mesh, octree-local positions
  pub output: MeshOutput,
  /// Raw meshing time in microseconds
  pub mesh_time_us: u64,
}

/// Meshing stage that processes requests in parallel.
pub struct MeshingStage {
  /// Pending requests waiting to be processed
  pending: Vec<MeshRequest>,
  /// Completed results ready to be collected
  completed: Vec<MeshCompletion>,
  /// Next request ID
  next_id: u64,
}

impl Default for MeshingStage {
  fn default() -> Self {
    Self::new()
  }
}

impl MeshingStage {
  /// Create a new meshing stage.
  pub fn new() -> Self {
    Self {
      pending: Vec::new(),
      completed: Vec::new(),
      next_id: 0,
    }
  }

  /// Enqueue a grid, returning the assigned ID.
  ///
  /// A pending request for the same coordinate is superseded.
  pub fn enqueue(&mut self, coord: IVec3, grid: VoxelGrid) -> u64 {
    let id = self.next_id;
    self.next_id += 1;

    self.pending.retain(|r| r.coord != coord);
    self.pending.push(MeshRequest { id, coord, grid });
    id
  }

  /// Process pending requests in parallel and move completions to output.
  /// Returns the number of tasks processed this tick.
  pub fn tick(&mut self) -> usize {
    if self.pending.is_empty() {
      return 0;
    }

    let requests = std::mem::take(&mut self.pending);
    let count = requests.len();

    let completions: Vec<MeshCompletion> = requests
      .into_par_iter()
      .map(|req| {
        let start = Instant::now();
        let output = dual_contouring::contour_grid(&req.grid);
        let mesh_time_us = start.elapsed().as_micros() as u64;
        MeshCompletion {
          id: req.id,
          coord: req.coord,
          output,
          mesh_time_us,
        }
      })
      .collect();

    self.completed.extend(completions);
    count
  }

  /// Drop pending requests and undrained results for `coords`.
  pub fn cancel(&mut self, coords: &[IVec3]) {
    self.pending.retain(|r| !coords.contains(&r.coord));
    self.completed.retain(|c| !coords.contains(&c.coord));
  }

  /// Take all completed meshes.
  pub fn drain_completions(&mut self) -> Vec<MeshCompletion> {
    std::mem::take(&mut self.completed)
  }

  /// Number of pending requests.
  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  /// Number of completed results waiting to be drained.
  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  /// True when no work remains.
  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }
}

#[cfg(test)]
#[path = "task_queue_test.rs"]
mod task_queue_test;
