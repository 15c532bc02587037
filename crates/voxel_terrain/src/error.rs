//! Error type shared by the storage, edit and export paths.

use std::io;
use std::path::PathBuf;

use crate::brush::BrushMode;

pub type Result<T, E = TerrainError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("truncated or malformed data: {context}")]
  Truncated { context: String },

  #[error("node index {index} out of range for array of {len} nodes")]
  NodeIndexOutOfRange { index: usize, len: usize },

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("failed to parse configuration: {0}")]
  ConfigParse(#[from] toml::de::Error),

  #[error("no terrain region is loaded")]
  NothingLoaded,

  #[error("a {running} task is already running")]
  TaskBusy { running: &'static str },

  #[error("brush mode {0:?} cannot be applied as a stroke")]
  UnsupportedBrushMode(BrushMode),

  #[error("unsupported mesh topology: {0}")]
  UnsupportedTopology(String),
}

impl TerrainError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn truncated(context: impl Into<String>) -> Self {
    Self::Truncated {
      context: context.into(),
    }
  }
}
