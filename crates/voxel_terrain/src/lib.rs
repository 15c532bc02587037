//! voxel_terrain - Engine independent voxel terrain editing
//!
//! Sparse octrees hold the persistent terrain. Editing happens on dense
//! padded grids, meshing runs Octree Dual Contouring over those grids, and
//! edited regions are written back as `.optoctrees` batches or
//! `.optoctreepatch` diffs.
//!
//! ```text
//! ┌──────────────┐  load   ┌──────────────┐ rasterize ┌──────────────┐
//! │  BatchStore  │ ──────► │  Metaspace   │ ────────► │  VoxelGrid   │
//! │ .optoctrees  │ ◄────── │ octree cells │ ◄──────── │ R³ + halo    │
//! └──────────────┘  save   └──────────────┘  commit   └──────────────┘
//!        ▲                        ▲                      │        ▲
//!        │ patch                  │ stroke               │        │
//!        │                 ┌──────────────┐              ▼        │
//!        └──────────────── │ BrushEngine  │ ─────── MeshingStage  │
//!                          └──────────────┘    (dual contouring)  │
//!                                 └───────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: `OctNodeSample`, density codec, mesh output
//! - [`constants`]: octree / batch / padded grid layout
//! - [`octree`]: sparse octree, flattening and rasterization
//! - [`grid`]: `VoxelGrid` with halo and per-voxel actions
//! - [`metaspace`]: loaded terrain cells keyed by octree coordinate
//! - [`brush`]: sculpting brushes and the eyedropper
//! - [`dual_contouring`]: octree Dual Contouring mesher
//! - [`task_queue`]: parallel meshing stage
//! - [`batch_store`]: batch and patch file formats
//! - [`region`]: `Terrain`, region load/save/export driven by `tick()`
//! - [`config`]: TOML configuration
//!
//! # Example
//!
//! ```ignore
//! use glam::{IVec3, Vec3};
//! use voxel_terrain::{Modifiers, Terrain, TerrainConfig};
//!
//! let mut terrain = Terrain::new(TerrainConfig::new("assets/terrain"));
//! terrain.load_region(IVec3::ZERO, IVec3::ONE)?;
//! terrain.run_to_completion()?;
//!
//! terrain.stroke(Vec3::new(40.0, 12.0, 40.0), Vec3::Y, Modifiers::NONE)?;
//! terrain.end_stroke();
//! terrain.remesh();
//!
//! terrain.save_region()?;
//! terrain.run_to_completion()?;
//! ```

pub mod batch_store;
pub mod brush;
pub mod config;
pub mod constants;
pub mod dual_contouring;
pub mod error;
pub mod grid;
pub mod metaspace;
pub mod octree;
pub mod region;
pub mod task_queue;
pub mod types;

// Re-export commonly used items
pub use batch_store::{BatchLayout, BatchStore, Patch, VoxelAddress};
pub use brush::{BrushEngine, BrushMode, Modifiers, StrokeOutcome};
pub use config::{BrushConfig, TerrainConfig, WorldExtent};
pub use constants::{BATCH_OCTREES, BATCH_SIZE, OCTREE_SIZE};
pub use error::{Result, TerrainError};
pub use grid::VoxelGrid;
pub use metaspace::Metaspace;
pub use octree::{CollapseRule, OctreeNode};
pub use region::{ExportMode, Notification, NotificationLevel, TaskStatus, Terrain};
pub use task_queue::{MeshCompletion, MeshRequest, MeshingStage};
pub use types::{MaterialId, MeshOutput, MinMaxAABB, OctNodeSample, Vertex};
