//! Brush editing: modes, modifier keys and the stroke engine.
//!
//! # Stroke Lifecycle
//!
//! ```text
//!            try_stroke (accepted)
//!   Idle ─────────────────────────▶ Active ──┐ try_stroke
//!    ▲                                │  ▲   │ (accepted or throttled)
//!    │          reset_stroke          │  └───┘
//!    └────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`engine`]: `BrushEngine` - rate limiting and dispatch to grids

pub mod engine;

pub use engine::{BrushEngine, BrushStroke, StrokeOutcome};

/// What a stroke does to the voxels under the brush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BrushMode {
  /// Union with the brush sphere.
  #[default]
  Add,
  /// Subtract the brush sphere.
  Remove,
  /// Recolour solid voxels.
  Paint,
  /// Cut to the plane captured at the start of the stroke.
  Flatten,
  /// Blur the density field.
  Smooth,
  /// Pick the material under the cursor. Never strokes.
  Eyedropper,
}

impl BrushMode {
  /// Paired mode selected by the ctrl modifier.
  pub fn complement(self) -> Self {
    match self {
      BrushMode::Add => BrushMode::Remove,
      BrushMode::Remove => BrushMode::Add,
      other => other,
    }
  }

  /// Whether this mode mutates voxels.
  pub fn is_stroke(self) -> bool {
    !matches!(self, BrushMode::Eyedropper)
  }
}

/// Modifier keys held during a stroke sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
  pub shift: bool,
  pub ctrl: bool,
}

impl Modifiers {
  pub const NONE: Self = Self {
    shift: false,
    ctrl: false,
  };

  /// Mode actually applied for `selected`; shift wins over ctrl.
  pub fn effective(self, selected: BrushMode) -> BrushMode {
    if self.shift {
      BrushMode::Smooth
    } else if self.ctrl {
      selected.complement()
    } else {
      selected
    }
  }
}
