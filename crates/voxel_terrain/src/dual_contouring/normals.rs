//! Geometry-based vertex normals.

use glam::Vec3A;

use crate::types::MeshOutput;

/// Recalculate normals from triangle geometry.
///
/// Each triangle adds its unnormalized face normal (`e01 × e02`, twice its
/// area) to its three vertices, so larger faces weigh more. Vertices that
/// receive no contribution fall back to up.
pub fn recalculate_from_geometry(output: &mut MeshOutput) {
  let mut accumulated = vec![Vec3A::ZERO; output.vertices.len()];

  for tri in output.indices.chunks_exact(3) {
    let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
    let p0 = Vec3A::from_array(output.vertices[i0].position);
    let p1 = Vec3A::from_array(output.vertices[i1].position);
    let p2 = Vec3A::from_array(output.vertices[i2].position);

    let face_normal = (p1 - p0).cross(p2 - p0);
    accumulated[i0] += face_normal;
    accumulated[i1] += face_normal;
    accumulated[i2] += face_normal;
  }

  for (vertex, n) in output.vertices.iter_mut().zip(accumulated) {
    let len_sq = n.length_squared();
    vertex.normal = if len_sq < 1e-12 {
      [0.0, 1.0, 0.0]
    } else {
      (n * len_sq.sqrt().recip()).to_array()
    };
  }
}

#[cfg(test)]
#[path = "normals_test.rs"]
mod normals_test;
