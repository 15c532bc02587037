use super::*;
use crate::types::Vertex;

fn vertex(position: [f32; 3]) -> Vertex {
  Vertex {
    position,
    ..Vertex::default()
  }
}

#[test]
fn test_counter_clockwise_triangle_faces_up() {
  let mut output = MeshOutput::new();
  output.push_vertex(vertex([0.0, 0.0, 0.0]));
  output.push_vertex(vertex([0.0, 0.0, 1.0]));
  output.push_vertex(vertex([1.0, 0.0, 0.0]));
  output.indices.extend_from_slice(&[0, 1, 2]);

  recalculate_from_geometry(&mut output);
  for v in &output.vertices {
    assert_eq!(v.normal, [0.0, 1.0, 0.0]);
  }
}

#[test]
fn test_larger_face_dominates() {
  let mut output = MeshOutput::new();
  // Shared vertex 0; a big triangle facing +Y and a small one facing +X.
  output.push_vertex(vertex([0.0, 0.0, 0.0]));
  output.push_vertex(vertex([0.0, 0.0, 4.0]));
  output.push_vertex(vertex([4.0, 0.0, 0.0]));
  output.push_vertex(vertex([0.0, 1.0, 0.0]));
  output.push_vertex(vertex([0.0, 0.0, 1.0]));
  output.indices.extend_from_slice(&[0, 1, 2, 0, 3, 4]);

  recalculate_from_geometry(&mut output);
  let n = output.vertices[0].normal;
  assert!(n[1] > n[0], "normal {n:?} should lean toward +Y");
  let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
  assert!((len - 1.0).abs() < 1e-5);
}

#[test]
fn test_unreferenced_and_degenerate_fall_back_to_up() {
  let mut output = MeshOutput::new();
  output.push_vertex(vertex([0.0, 0.0, 0.0]));
  output.push_vertex(vertex([1.0, 0.0, 0.0]));
  output.push_vertex(vertex([2.0, 0.0, 0.0]));
  output.push_vertex(vertex([5.0, 5.0, 5.0]));
  output.indices.extend_from_slice(&[0, 1, 2]);

  recalculate_from_geometry(&mut output);
  for v in &output.vertices {
    assert_eq!(v.normal, [0.0, 1.0, 0.0]);
  }
}
