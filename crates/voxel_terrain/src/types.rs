//! Core data types: voxel samples, the density codec and mesh output.

/// Material identifier. 0 = empty/void, 1..=255 = material id.
pub type MaterialId = u8;

/// Signed distance byte codec.
///
/// Maps a signed distance in [-1, 1] (positive = solid) to a byte
/// `round(clamp(d, -1, 1) * 126 + 126)`. The byte 0 is reserved as the
/// "far" sentinel whose sign comes from the material: material 0 is
/// far-empty, anything else is far-solid.
///
/// Precision: 1/126 distance units per level. Bytes above 252 decode past
/// 1.0 and re-encode to 252.
pub mod density {
  use super::MaterialId;

  /// Encoded value of the surface (distance 0).
  pub const SURFACE: u8 = 126;

  /// Scale from distance units to byte levels.
  pub const SCALE: f32 = 126.0;

  /// Far sentinel.
  pub const FAR: u8 = 0;

  /// Largest byte produced by [`encode`].
  pub const MAX: u8 = 252;

  /// Encode a signed distance.
  #[inline(always)]
  pub fn encode(d: f32) -> u8 {
    (d.clamp(-1.0, 1.0) * SCALE + SCALE).round() as u8
  }

  /// Decode a byte back into a signed distance.
  ///
  /// The far sentinel is not a distance; check for [`FAR`] first or use
  /// [`signed_distance`].
  #[inline(always)]
  pub fn decode(b: u8) -> f32 {
    (b as f32 - SCALE) / SCALE
  }

  /// Encode a distance for storage next to `material`.
  ///
  /// Never yields the far sentinel for a nonzero material, which would
  /// otherwise read back as far-solid.
  #[inline]
  pub fn encode_for(material: MaterialId, d: f32) -> u8 {
    let b = encode(d);
    if b == FAR && material != 0 {
      1
    } else {
      b
    }
  }

  /// Signed distance of a stored sample, resolving the far sentinel to ±1.
  #[inline]
  pub fn signed_distance(material: MaterialId, b: u8) -> f32 {
    if b == FAR {
      if material > 0 {
        1.0
      } else {
        -1.0
      }
    } else {
      decode(b)
    }
  }

  /// Whether a stored sample lies below the surface (solid).
  #[inline(always)]
  pub fn is_below_surface(material: MaterialId, b: u8) -> bool {
    if b == FAR {
      material > 0
    } else {
      b >= SURFACE
    }
  }
}

/// One octree sample as stored in the flattened array format.
///
/// Wire layout: `{u8 material, u8 density, u16 child_offset}` little-endian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OctNodeSample {
  /// Material id (0 = empty).
  pub material: MaterialId,
  /// Encoded signed distance (see [`density`]).
  pub density: u8,
  /// Index of the first of 8 contiguous children, 0 for a leaf.
  pub child_offset: u16,
}

impl OctNodeSample {
  /// Far-empty sample, also the sentinel for out-of-range queries.
  pub const EMPTY: Self = Self {
    material: 0,
    density: density::FAR,
    child_offset: 0,
  };

  /// Size of one serialized sample in bytes.
  pub const BYTES: usize = 4;

  pub const fn new(material: MaterialId, density: u8) -> Self {
    Self {
      material,
      density,
      child_offset: 0,
    }
  }

  /// Far-solid sample of `material`.
  pub const fn far_solid(material: MaterialId) -> Self {
    Self::new(material, density::FAR)
  }

  #[inline]
  pub fn is_below_surface(&self) -> bool {
    density::is_below_surface(self.material, self.density)
  }

  #[inline]
  pub fn signed_distance(&self) -> f32 {
    density::signed_distance(self.material, self.density)
  }

  /// Same material and density, ignoring the child offset.
  #[inline]
  pub fn same_value(&self, other: &Self) -> bool {
    self.material == other.material && self.density == other.density
  }

  pub fn to_le_bytes(self) -> [u8; Self::BYTES] {
    let offset = self.child_offset.to_le_bytes();
    [self.material, self.density, offset[0], offset[1]]
  }

  pub fn from_le_bytes(bytes: [u8; Self::BYTES]) -> Self {
    Self {
      material: bytes[0],
      density: bytes[1],
      child_offset: u16::from_le_bytes([bytes[2], bytes[3]]),
    }
  }
}

/// Output vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
  /// Position in octree-local voxel units.
  pub position: [f32; 3],

  /// Surface normal (unit vector), filled after triangulation.
  pub normal: [f32; 3],

  /// Dominant material of the solid corners of the source cell.
  pub material: MaterialId,
}

impl Default for Vertex {
  fn default() -> Self {
    Self {
      position: [0.0; 3],
      normal: [0.0, 1.0, 0.0],
      material: 0,
    }
  }
}

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
    Self { min, max }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Mesh extraction result.
#[derive(Clone, Debug, Default)]
pub struct MeshOutput {
  /// Output vertices.
  pub vertices: Vec<Vertex>,

  /// Triangle indices (3 indices per triangle).
  pub indices: Vec<u32>,

  /// Bounding box encompassing all vertices.
  pub bounds: MinMaxAABB,
}

impl MeshOutput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear all buffers, preserving capacity.
  pub fn clear(&mut self) {
    self.vertices.clear();
    self.indices.clear();
    self.bounds = MinMaxAABB::empty();
  }

  /// Returns true if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  /// Number of triangles in the mesh.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Append a vertex and return its index.
  pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
    let index = self.vertices.len() as u32;
    self.bounds.encapsulate(vertex.position);
    self.vertices.push(vertex);
    index
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
