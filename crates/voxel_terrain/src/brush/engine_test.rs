use glam::IVec3;

use super::*;
use crate::constants::OCTREE_SIZE;
use crate::octree::{CollapseRule, OctreeNode};
use crate::types::{density, OctNodeSample};

fn space_with(octrees: &[IVec3], sample: OctNodeSample) -> Metaspace {
  let mut space = Metaspace::new(0, CollapseRule::default());
  let roots = octrees
    .iter()
    .map(|o| OctreeNode::filled(*o * OCTREE_SIZE, sample))
    .collect();
  space.insert_batch(IVec3::ZERO, roots);
  space
}

fn engine(mode: BrushMode) -> BrushEngine {
  BrushEngine::new(&BrushConfig {
    radius: 3.0,
    period_secs: 0.1,
    ..BrushConfig::default()
  })
  .with_mode(mode)
  .with_material(4)
}

fn ms(t0: Instant, millis: u64) -> Instant {
  t0 + Duration::from_millis(millis)
}

#[test]
fn test_first_sample_is_always_accepted() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Add);
  assert!(!brush.stroke().is_active());

  let outcome = brush
    .try_stroke_at(Instant::now(), &mut space, Vec3::splat(16.0), Vec3::Y, Modifiers::NONE)
    .unwrap();
  assert_eq!(
    outcome,
    StrokeOutcome::Applied {
      octrees: OctreeCoords::from_slice(&[IVec3::ZERO])
    }
  );
  assert!(brush.stroke().is_active());
  assert_eq!(brush.stroke().streak_length, 1);
}

#[test]
fn test_rate_limit_accelerates_with_streak() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Add);
  let p = Vec3::splat(16.0);
  let t0 = Instant::now();
  let mut stroke = |brush: &mut BrushEngine, at: Instant| {
    brush
      .try_stroke_at(at, &mut space, p, Vec3::Y, Modifiers::NONE)
      .unwrap()
  };

  assert_ne!(stroke(&mut brush, t0), StrokeOutcome::Throttled);
  // streak 1: 100ms / 2 = 50ms
  assert_eq!(stroke(&mut brush, ms(t0, 40)), StrokeOutcome::Throttled);
  assert_ne!(stroke(&mut brush, ms(t0, 60)), StrokeOutcome::Throttled);
  // streak 2: 25ms
  assert_eq!(brush.current_interval(), Duration::from_millis(25));
  assert_eq!(stroke(&mut brush, ms(t0, 80)), StrokeOutcome::Throttled);
  assert_ne!(stroke(&mut brush, ms(t0, 90)), StrokeOutcome::Throttled);

  for i in 0..6 {
    stroke(&mut brush, ms(t0, 200 + i * 100));
  }
  // Capped at 5x: 100ms / 10.
  assert_eq!(brush.stroke().streak_length, 9);
  assert_eq!(brush.current_interval(), Duration::from_millis(10));
}

#[test]
fn test_reset_stroke_returns_to_idle() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Smooth);
  let t0 = Instant::now();
  brush
    .try_stroke_at(t0, &mut space, Vec3::splat(16.0), Vec3::Y, Modifiers::NONE)
    .unwrap();
  assert!(space.cell(IVec3::ZERO).unwrap().grid.has_snapshot());

  brush.reset_stroke(&mut space);
  assert!(!brush.stroke().is_active());
  assert_eq!(brush.stroke().streak_length, 0);
  assert!(brush.stroke().first_point.is_none());
  assert!(!space.cell(IVec3::ZERO).unwrap().grid.has_snapshot());

  // Immediately accepted again.
  let outcome = brush
    .try_stroke_at(t0, &mut space, Vec3::splat(16.0), Vec3::Y, Modifiers::NONE)
    .unwrap();
  assert_ne!(outcome, StrokeOutcome::Throttled);
}

#[test]
fn test_stroke_spans_octree_boundary_and_refreshes_halos() {
  let mut space = space_with(&[IVec3::ZERO, IVec3::X], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Add);
  let outcome = brush
    .try_stroke_at(
      Instant::now(),
      &mut space,
      Vec3::new(32.0, 16.0, 16.0),
      Vec3::Y,
      Modifiers::NONE,
    )
    .unwrap();
  assert_eq!(
    outcome,
    StrokeOutcome::Applied {
      octrees: OctreeCoords::from_slice(&[IVec3::ZERO, IVec3::X])
    }
  );

  assert_eq!(space.voxel(IVec3::new(31, 16, 16)).material, 4);
  assert_eq!(space.voxel(IVec3::new(32, 16, 16)).material, 4);
  let west = &space.cell(IVec3::ZERO).unwrap().grid;
  assert_eq!(west.sample(IVec3::new(33, 17, 17)), space.voxel(IVec3::new(32, 16, 16)));
  assert!(west.is_dirty() && west.needs_remesh());
}

#[test]
fn test_stroke_out_of_reach_touches_nothing() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Add);
  let outcome = brush
    .try_stroke_at(
      Instant::now(),
      &mut space,
      Vec3::new(100.0, 16.0, 16.0),
      Vec3::Y,
      Modifiers::NONE,
    )
    .unwrap();
  assert_eq!(
    outcome,
    StrokeOutcome::Applied {
      octrees: OctreeCoords::new()
    }
  );
}

#[test]
fn test_ctrl_turns_add_into_remove() {
  let solid = OctNodeSample::new(2, density::MAX);
  let mut space = space_with(&[IVec3::ZERO], solid);
  let mut brush = engine(BrushMode::Add);
  let ctrl = Modifiers {
    shift: false,
    ctrl: true,
  };
  brush
    .try_stroke_at(Instant::now(), &mut space, Vec3::splat(16.0), Vec3::Y, ctrl)
    .unwrap();
  assert_eq!(space.voxel(IVec3::splat(16)), OctNodeSample::EMPTY);
  // The selected mode is not changed by the modifier.
  assert_eq!(brush.mode, BrushMode::Add);
}

#[test]
fn test_eyedropper_mode_cannot_stroke() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Eyedropper);
  let err = brush
    .try_stroke_at(Instant::now(), &mut space, Vec3::splat(16.0), Vec3::Y, Modifiers::NONE)
    .unwrap_err();
  assert!(matches!(err, TerrainError::UnsupportedBrushMode(BrushMode::Eyedropper)));
  assert!(!brush.stroke().is_active());

  let shift = Modifiers {
    shift: true,
    ctrl: false,
  };
  assert!(brush
    .try_stroke_at(Instant::now(), &mut space, Vec3::splat(16.0), Vec3::Y, shift)
    .is_ok());
}

#[test]
fn test_flatten_plane_is_fixed_by_first_sample() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  let mut brush = engine(BrushMode::Flatten).with_radius(4.0);
  let t0 = Instant::now();
  brush
    .try_stroke_at(t0, &mut space, Vec3::splat(16.0), Vec3::Y, Modifiers::NONE)
    .unwrap();
  brush
    .try_stroke_at(
      ms(t0, 500),
      &mut space,
      Vec3::new(20.0, 16.0, 16.0),
      Vec3::X,
      Modifiers::NONE,
    )
    .unwrap();

  // Still cut against y = 16, not against the second sample's normal.
  let below = space.voxel(IVec3::new(22, 14, 16));
  assert!(below.is_below_surface());
  assert_eq!(below.material, 4);
  assert_eq!(space.voxel(IVec3::new(22, 18, 16)), OctNodeSample::EMPTY);
}

#[test]
fn test_eyedropper_steps_through_empty_voxels() {
  let mut space = space_with(&[IVec3::ZERO], OctNodeSample::EMPTY);
  space.with_grid_detached(IVec3::ZERO, |grid, _| {
    for x in 10..OCTREE_SIZE {
      for y in 0..OCTREE_SIZE {
        for z in 0..OCTREE_SIZE {
          grid.set(IVec3::new(x, y, z) + IVec3::ONE, OctNodeSample::new(6, density::MAX));
        }
      }
    }
  });

  let mut brush = engine(BrushMode::Paint);
  brush.eyedropper_retries = 3;
  assert_eq!(brush.eyedropper(&space, Vec3::splat(5.0), Vec3::X), None);
  assert_eq!(brush.material, 4);

  brush.eyedropper_retries = 8;
  assert_eq!(brush.eyedropper(&space, Vec3::splat(5.0), Vec3::X), Some(6));
  assert_eq!(brush.material, 6);
  assert_eq!(brush.mode, BrushMode::Paint);
}
