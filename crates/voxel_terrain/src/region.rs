//! Terrain facade and cooperative region tasks.
//!
//! Load, save and export run as finite tasks advanced one batch per
//! [`Terrain::tick`]. Only one task runs at a time; brush strokes and other
//! tasks are refused with [`TerrainError::TaskBusy`] until it finishes or
//! the region is unloaded.
//!
//! ```text
//!   load_region ─┐
//!   save_region ─┼─▶ RegionTask ──tick()──▶ TaskStatus { description, fraction }
//! export_region ─┘        │
//!                         └─ done ──▶ Notification::Success
//!                         └─ error ─▶ Notification::Error (task dropped)
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use glam::{IVec3, Vec3};

use crate::batch_store::{self, BatchStore, Patch};
use crate::brush::{BrushEngine, Modifiers, StrokeOutcome};
use crate::config::TerrainConfig;
use crate::constants::OCTREE_SIZE;
use crate::error::{Result, TerrainError};
use crate::metaspace::Metaspace;
use crate::octree::OctreeNode;
use crate::task_queue::MeshingStage;
use crate::types::{MaterialId, MeshOutput};

/// Severity of a user-facing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
  Warning,
  Error,
  Success,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
  pub level: NotificationLevel,
  pub message: String,
}

/// Progress of the active task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskStatus {
  pub description: String,
  /// 0.0..=1.0
  pub fraction: f32,
}

impl TaskStatus {
  fn idle() -> Self {
    Self {
      description: "Idle".to_string(),
      fraction: 1.0,
    }
  }
}

/// Destination of an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportMode {
  /// Full batch files into another directory.
  Batches { dir: PathBuf },
  /// Octrees that differ from the batches on disk.
  Patch { path: PathBuf },
  /// Wavefront OBJ of every loaded octree's surface.
  Mesh { path: PathBuf },
}

enum TaskKind {
  Load,
  Save,
  ExportBatches { store: BatchStore },
  ExportPatch { path: PathBuf, patch: Patch },
  ExportMesh { path: PathBuf, obj: ObjWriter },
}

struct RegionTask {
  kind: TaskKind,
  pending: VecDeque<IVec3>,
  total: usize,
}

impl RegionTask {
  fn new(kind: TaskKind, batches: impl IntoIterator<Item = IVec3>) -> Self {
    let pending: VecDeque<IVec3> = batches.into_iter().collect();
    let total = pending.len();
    Self {
      kind,
      pending,
      total,
    }
  }

  fn name(&self) -> &'static str {
    match self.kind {
      TaskKind::Load => "load",
      TaskKind::Save => "save",
      TaskKind::ExportBatches { .. }
      | TaskKind::ExportPatch { .. }
      | TaskKind::ExportMesh { .. } => "export",
    }
  }

  fn verb(&self) -> &'static str {
    match self.kind {
      TaskKind::Load => "Loading",
      TaskKind::Save => "Saving",
      TaskKind::ExportBatches { .. } => "Exporting batch",
      TaskKind::ExportPatch { .. } => "Diffing",
      TaskKind::ExportMesh { .. } => "Meshing",
    }
  }

  fn status(&self) -> TaskStatus {
    let done = self.total - self.pending.len();
    TaskStatus {
      description: format!("{} {}/{}", self.verb(), done, self.total),
      fraction: if self.total == 0 {
        1.0
      } else {
        done as f32 / self.total as f32
      },
    }
  }
}

/// A loaded terrain region with its editing and persistence state.
pub struct Terrain {
  config: TerrainConfig,
  store: BatchStore,
  metaspace: Metaspace,
  brush: BrushEngine,
  meshing: MeshingStage,
  meshes: HashMap<IVec3, MeshOutput>,
  task: Option<RegionTask>,
  /// Inclusive batch range of the loaded region.
  region: Option<(IVec3, IVec3)>,
  notifications: Vec<Notification>,
}

impl Terrain {
  pub fn new(config: TerrainConfig) -> Self {
    let store = BatchStore::new(
      config.data_dir.clone(),
      batch_store::BatchLayout::new(config.world_extent),
    );
    let metaspace = Metaspace::new(config.lod, config.collapse_rule);
    let brush = BrushEngine::new(&config.brush);
    Self {
      config,
      store,
      metaspace,
      brush,
      meshing: MeshingStage::new(),
      meshes: HashMap::new(),
      task: None,
      region: None,
      notifications: Vec::new(),
    }
  }

  pub fn config(&self) -> &TerrainConfig {
    &self.config
  }

  pub fn store(&self) -> &BatchStore {
    &self.store
  }

  pub fn metaspace(&self) -> &Metaspace {
    &self.metaspace
  }

  pub fn brush(&self) -> &BrushEngine {
    &self.brush
  }

  pub fn brush_mut(&mut self) -> &mut BrushEngine {
    &mut self.brush
  }

  pub fn region(&self) -> Option<(IVec3, IVec3)> {
    self.region
  }

  /// Latest mesh of an octree, octree-local positions.
  pub fn mesh(&self, octree: IVec3) -> Option<&MeshOutput> {
    self.meshes.get(&octree)
  }

  pub fn meshes(&self) -> impl Iterator<Item = (&IVec3, &MeshOutput)> {
    self.meshes.iter()
  }

  pub fn is_busy(&self) -> bool {
    self.task.is_some()
  }

  pub fn status(&self) -> TaskStatus {
    self.task.as_ref().map_or_else(TaskStatus::idle, RegionTask::status)
  }

  pub fn drain_notifications(&mut self) -> Vec<Notification> {
    std::mem::take(&mut self.notifications)
  }

  fn ensure_idle(&self) -> Result<()> {
    match &self.task {
      Some(task) => Err(TerrainError::TaskBusy {
        running: task.name(),
      }),
      None => Ok(()),
    }
  }

  fn ensure_loaded(&self) -> Result<()> {
    if self.metaspace.is_empty() {
      Err(TerrainError::NothingLoaded)
    } else {
      Ok(())
    }
  }

  fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
    self.notifications.push(Notification {
      level,
      message: message.into(),
    });
  }

  // ===========================================================================
  // Tasks
  // ===========================================================================

  /// Start loading the inclusive batch range `start..=end`, replacing any
  /// loaded region. Batches outside the world are skipped.
  pub fn load_region(&mut self, start: IVec3, end: IVec3) -> Result<()> {
    self.ensure_idle()?;
    self.unload_region();

    let (lo, hi) = (start.min(end), start.max(end));
    let layout = *self.store.layout();
    let mut batches = Vec::new();
    for x in lo.x..=hi.x {
      for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
          let batch = IVec3::new(x, y, z);
          if layout.octree_count(batch) > 0 {
            batches.push(batch);
          }
        }
      }
    }

    tracing::info!(?lo, ?hi, batches = batches.len(), "loading region");
    self.region = Some((lo, hi));
    self.task = Some(RegionTask::new(TaskKind::Load, batches));
    Ok(())
  }

  /// Start writing every loaded batch back to the data directory.
  pub fn save_region(&mut self) -> Result<()> {
    self.ensure_idle()?;
    self.ensure_loaded()?;
    self.metaspace.commit_dirty();

    let batches = self.metaspace.loaded_batches();
    tracing::info!(batches = batches.len(), "saving region");
    self.task = Some(RegionTask::new(TaskKind::Save, batches));
    Ok(())
  }

  /// Start an export of the loaded region.
  pub fn export_region(&mut self, mode: ExportMode) -> Result<()> {
    self.ensure_idle()?;
    self.ensure_loaded()?;
    self.metaspace.commit_dirty();

    let kind = match mode {
      ExportMode::Batches { dir } => TaskKind::ExportBatches {
        store: self.store.with_root_dir(dir),
      },
      ExportMode::Patch { path } => TaskKind::ExportPatch {
        path,
        patch: Patch::default(),
      },
      ExportMode::Mesh { path } => TaskKind::ExportMesh {
        path,
        obj: ObjWriter::new(),
      },
    };
    let batches = self.metaspace.loaded_batches();
    tracing::info!(batches = batches.len(), "exporting region");
    self.task = Some(RegionTask::new(kind, batches));
    Ok(())
  }

  /// Import a patch file into the loaded region. Returns the number of
  /// octrees replaced.
  pub fn import_patch(&mut self, path: &Path) -> Result<usize> {
    self.ensure_idle()?;
    self.ensure_loaded()?;
    let patch = Patch::read(path)?;
    let applied = batch_store::apply_patch(&mut self.metaspace, &patch);
    tracing::info!(path = %path.display(), applied, "patch imported");
    Ok(applied)
  }

  /// Advance the active task by one batch.
  ///
  /// On failure the task is dropped, an error notification is queued and
  /// the error is returned. Files are only replaced once fully staged.
  pub fn tick(&mut self) -> Result<TaskStatus> {
    let Some(mut task) = self.task.take() else {
      return Ok(TaskStatus::idle());
    };
    let _span = tracing::info_span!("region_task", task = task.name()).entered();

    if let Some(batch) = task.pending.pop_front() {
      if let Err(e) = self.step(&mut task.kind, batch) {
        tracing::warn!(?batch, error = %e, "region task failed");
        self.notify(NotificationLevel::Error, format!("{} failed: {}", task.name(), e));
        return Err(e);
      }
    }

    if !task.pending.is_empty() {
      let status = task.status();
      self.task = Some(task);
      return Ok(status);
    }

    let status = task.status();
    match self.finish(task.kind, task.total) {
      Ok(message) => {
        tracing::info!("{}", message);
        self.notify(NotificationLevel::Success, message);
        Ok(status)
      }
      Err(e) => {
        self.notify(NotificationLevel::Error, format!("{} failed: {}", status.description, e));
        Err(e)
      }
    }
  }

  /// Tick until no task is active.
  pub fn run_to_completion(&mut self) -> Result<()> {
    while self.task.is_some() {
      self.tick()?;
    }
    Ok(())
  }

  fn step(&mut self, kind: &mut TaskKind, batch: IVec3) -> Result<()> {
    match kind {
      TaskKind::Load => {
        let loaded = self.store.read_batch(batch)?;
        if let Some(warning) = loaded.warning {
          self.notify(NotificationLevel::Warning, warning);
        }
        self.metaspace.insert_batch(batch, loaded.octrees);
      }
      TaskKind::Save => {
        let empty = OctreeNode::new_root(IVec3::ZERO);
        let roots = self.batch_roots(batch, &empty);
        self.store.write_batch(batch, roots)?;
      }
      TaskKind::ExportBatches { store } => {
        let empty = OctreeNode::new_root(IVec3::ZERO);
        let roots = self.batch_roots(batch, &empty);
        store.write_batch(batch, roots)?;
      }
      TaskKind::ExportPatch { patch, .. } => {
        if let Some(diff) = batch_store::compute_batch_patch(&self.store, &self.metaspace, batch)? {
          patch.batches.push(diff);
        }
      }
      TaskKind::ExportMesh { obj, .. } => {
        let mut stage = MeshingStage::new();
        for coord in self.store.layout().octree_coords(batch) {
          if let Some(cell) = self.metaspace.cell(coord) {
            stage.enqueue(coord, cell.grid.clone());
          }
        }
        stage.tick();
        let mut completions = stage.drain_completions();
        completions.sort_by_key(|c| c.id);
        for completion in completions {
          obj.push_mesh(completion.coord, &completion.output)?;
        }
      }
    }
    Ok(())
  }

  /// Roots of `batch` in file order; octrees missing from the metaspace
  /// are written as `empty`.
  fn batch_roots<'a>(&'a self, batch: IVec3, empty: &'a OctreeNode) -> Vec<&'a OctreeNode> {
    self
      .store
      .layout()
      .octree_coords(batch)
      .into_iter()
      .map(|coord| self.metaspace.cell(coord).map_or(empty, |cell| &cell.root))
      .collect()
  }

  fn finish(&mut self, kind: TaskKind, total: usize) -> Result<String> {
    match kind {
      TaskKind::Load => Ok(format!(
        "Loaded {} batches ({} octrees)",
        total,
        self.metaspace.octree_count()
      )),
      TaskKind::Save => Ok(format!("Saved {} batches", total)),
      TaskKind::ExportBatches { store } => Ok(format!(
        "Exported {} batches to {}",
        total,
        store.root_dir().display()
      )),
      TaskKind::ExportPatch { path, patch } => {
        patch.write(&path)?;
        Ok(format!(
          "Exported patch with {} changed octrees to {}",
          patch.octree_count(),
          path.display()
        ))
      }
      TaskKind::ExportMesh { path, obj } => {
        let triangles = obj.triangles;
        batch_store::write_staged(&path, obj.finish().as_bytes())?;
        Ok(format!("Exported {} triangles to {}", triangles, path.display()))
      }
    }
  }

  /// Cancel any task and release every octree, grid and mesh.
  pub fn unload_region(&mut self) {
    if let Some(task) = self.task.take() {
      tracing::info!(
        task = task.name(),
        remaining = task.pending.len(),
        "task cancelled by unload"
      );
    }
    let coords = self.metaspace.octree_coords();
    self.meshing.cancel(&coords);
    self.meshes.clear();
    self.brush.reset_stroke(&mut self.metaspace);
    self.metaspace.clear();
    self.region = None;
  }

  // ===========================================================================
  // Editing
  // ===========================================================================

  /// Forward a stroke sample to the brush engine.
  pub fn stroke(
    &mut self,
    point: Vec3,
    normal: Vec3,
    modifiers: Modifiers,
  ) -> Result<StrokeOutcome> {
    self.ensure_idle()?;
    self.brush.try_stroke(&mut self.metaspace, point, normal, modifiers)
  }

  /// End the current stroke.
  pub fn end_stroke(&mut self) {
    self.brush.reset_stroke(&mut self.metaspace);
  }

  /// Pick the material under `point`, see [`BrushEngine::eyedropper`].
  pub fn eyedrop(&mut self, point: Vec3, ray_dir: Vec3) -> Option<MaterialId> {
    self.brush.eyedropper(&self.metaspace, point, ray_dir)
  }

  /// Mesh every grid changed since its last mesh. Returns how many octrees
  /// were meshed.
  pub fn remesh(&mut self) -> usize {
    let _span = tracing::info_span!("remesh").entered();
    for coord in self.metaspace.octree_coords() {
      if let Some(cell) = self.metaspace.cell_mut(coord) {
        if cell.grid.needs_remesh() {
          cell.grid.clear_remesh();
          self.meshing.enqueue(coord, cell.grid.clone());
        }
      }
    }

    self.meshing.tick();
    let completions = self.meshing.drain_completions();
    let count = completions.len();
    for completion in completions {
      tracing::debug!(
        coord = ?completion.coord,
        triangles = completion.output.triangle_count(),
        mesh_time_us = completion.mesh_time_us,
        "octree meshed"
      );
      self.meshes.insert(completion.coord, completion.output);
    }
    count
  }
}

/// Accumulates meshes as Wavefront OBJ text in world coordinates.
struct ObjWriter {
  text: String,
  vertex_count: usize,
  triangles: usize,
}

impl ObjWriter {
  fn new() -> Self {
    Self {
      text: String::from("# voxel_terrain OBJ export\n"),
      vertex_count: 0,
      triangles: 0,
    }
  }

  fn push_mesh(&mut self, coord: IVec3, mesh: &MeshOutput) -> Result<()> {
    if mesh.indices.len() % 3 != 0 {
      return Err(TerrainError::UnsupportedTopology(format!(
        "octree {} has {} indices, not a triangle list",
        coord,
        mesh.indices.len()
      )));
    }
    if mesh.is_empty() {
      return Ok(());
    }

    let origin = (coord * OCTREE_SIZE).as_vec3();
    // Writing into a String cannot fail.
    let _ = writeln!(self.text, "o octree_{}_{}_{}", coord.x, coord.y, coord.z);
    for v in &mesh.vertices {
      let p = origin + Vec3::from_array(v.position);
      let _ = writeln!(self.text, "v {} {} {}", p.x, p.y, p.z);
    }
    for v in &mesh.vertices {
      let _ = writeln!(self.text, "vn {} {} {}", v.normal[0], v.normal[1], v.normal[2]);
    }
    let base = self.vertex_count + 1;
    for tri in mesh.indices.chunks_exact(3) {
      let [a, b, c] = [tri[0] as usize + base, tri[1] as usize + base, tri[2] as usize + base];
      let _ = writeln!(self.text, "f {a}//{a} {b}//{b} {c}//{c}");
    }
    self.vertex_count += mesh.vertices.len();
    self.triangles += mesh.triangle_count();
    Ok(())
  }

  fn finish(self) -> String {
    self.text
  }
}

#[cfg(test)]
#[path = "region_test.rs"]
mod region_test;
