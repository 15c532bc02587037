use super::*;

#[test]
fn test_defaults() {
  let config = TerrainConfig::default();
  assert_eq!(config.lod, 0);
  assert_eq!(config.world_extent.x, Some(128));
  assert_eq!(config.world_extent.y, None);
  assert_eq!(config.collapse_rule, CollapseRule::DensityAndType);
  assert_eq!(config.brush.blur_radius, 2);
  assert!(config.validate().is_ok());
}

#[test]
fn test_parse_partial_toml() {
  let config = TerrainConfig::from_toml(
    r#"
      data_dir = "terrain"
      lod = 1
      collapse_rule = "density_only"

      [world_extent]
      x = 10

      [brush]
      radius = 6.5
    "#,
  )
  .unwrap();

  assert_eq!(config.data_dir, PathBuf::from("terrain"));
  assert_eq!(config.lod, 1);
  assert_eq!(config.collapse_rule, CollapseRule::DensityOnly);
  assert_eq!(config.world_extent.x, Some(10));
  assert_eq!(config.world_extent.z, Some(128));
  assert_eq!(config.world_extent.y, None);
  assert_eq!(config.brush.radius, 6.5);
  assert_eq!(config.brush.eyedropper_retries, 8);
}

#[test]
fn test_rejects_bad_lod() {
  let err = TerrainConfig::from_toml("lod = 9").unwrap_err();
  assert!(matches!(err, TerrainError::Config(_)), "{err}");
}

#[test]
fn test_rejects_bad_strength() {
  let err = TerrainConfig::from_toml("[brush]\nstrength = 2.0").unwrap_err();
  assert!(matches!(err, TerrainError::Config(_)), "{err}");
}

#[test]
fn test_rejects_malformed_toml() {
  let err = TerrainConfig::from_toml("lod = [").unwrap_err();
  assert!(matches!(err, TerrainError::ConfigParse(_)), "{err}");
}

#[test]
fn test_builder() {
  let config = TerrainConfig::new("/tmp/terrain")
    .with_lod(2)
    .with_world_extent(WorldExtent::UNBOUNDED)
    .with_collapse_rule(CollapseRule::DensityOnly);
  assert_eq!(config.lod, 2);
  assert_eq!(config.world_extent, WorldExtent::UNBOUNDED);
  assert_eq!(config.collapse_rule, CollapseRule::DensityOnly);
}
