//! Byte-level encoding of octree records and batch files.

use glam::IVec3;

use crate::constants::{BATCH_OCTREES, OCTREE_SIZE};
use crate::error::{Result, TerrainError};
use crate::octree::OctreeNode;
use crate::types::OctNodeSample;

/// Header value at the start of every batch file.
pub const BATCH_HEADER: i32 = 4;

/// Cursor over a little-endian byte slice.
pub(crate) struct ByteReader<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  pub(crate) fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.pos >= self.data.len()
  }

  pub(crate) fn remaining(&self) -> usize {
    self.data.len().saturating_sub(self.pos)
  }

  fn take<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
    let end = self.pos + N;
    let bytes = self.data.get(self.pos..end).ok_or_else(|| {
      TerrainError::truncated(format!("{} at byte {} of {}", what, self.pos, self.data.len()))
    })?;
    self.pos = end;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
  }

  pub(crate) fn u8(&mut self, what: &str) -> Result<u8> {
    Ok(self.take::<1>(what)?[0])
  }

  pub(crate) fn u16(&mut self, what: &str) -> Result<u16> {
    self.take(what).map(u16::from_le_bytes)
  }

  pub(crate) fn i16(&mut self, what: &str) -> Result<i16> {
    self.take(what).map(i16::from_le_bytes)
  }

  pub(crate) fn i32(&mut self, what: &str) -> Result<i32> {
    self.take(what).map(i32::from_le_bytes)
  }

  pub(crate) fn u32(&mut self, what: &str) -> Result<u32> {
    self.take(what).map(u32::from_le_bytes)
  }

  fn sample(&mut self) -> Result<OctNodeSample> {
    self.take("octree node").map(OctNodeSample::from_le_bytes)
  }
}

/// Append one octree record (`u16` node count, then the flattened nodes).
pub(crate) fn write_octree_record(out: &mut Vec<u8>, root: &OctreeNode) -> Result<()> {
  let nodes = root.write_to_array();
  let count = u16::try_from(nodes.len()).map_err(|_| {
    TerrainError::truncated(format!(
      "octree has {} nodes, record holds at most {}",
      nodes.len(),
      u16::MAX
    ))
  })?;
  out.reserve(2 + nodes.len() * OctNodeSample::BYTES);
  out.extend_from_slice(&count.to_le_bytes());
  for node in nodes {
    out.extend_from_slice(&node.to_le_bytes());
  }
  Ok(())
}

/// Read one octree record into a tree rooted at `position`.
pub(crate) fn read_octree_record(
  reader: &mut ByteReader<'_>,
  position: IVec3,
) -> Result<OctreeNode> {
  let count = reader.u16("octree node count")? as usize;
  if count == 0 {
    return Err(TerrainError::truncated(format!(
      "empty octree record for octree at {}",
      position
    )));
  }
  let mut nodes = Vec::with_capacity(count);
  for _ in 0..count {
    nodes.push(reader.sample()?);
  }
  OctreeNode::from_array(position, &nodes)
}

/// Encode a batch file from octrees in file order.
pub fn encode_batch<'a>(octrees: impl IntoIterator<Item = &'a OctreeNode>) -> Result<Vec<u8>> {
  let mut out = BATCH_HEADER.to_le_bytes().to_vec();
  for root in octrees {
    write_octree_record(&mut out, root)?;
  }
  Ok(out)
}

/// Decode a batch file holding `dims` octrees of `batch`.
///
/// The header is read and not validated. Bytes after the last record are
/// ignored.
pub fn decode_batch(bytes: &[u8], batch: IVec3, dims: IVec3) -> Result<Vec<OctreeNode>> {
  let mut reader = ByteReader::new(bytes);
  let _header = reader.i32("batch header")?;

  let base = batch * BATCH_OCTREES;
  let mut octrees = Vec::with_capacity((dims.x * dims.y * dims.z).max(0) as usize);
  for x in 0..dims.x {
    for y in 0..dims.y {
      for z in 0..dims.z {
        let position = (base + IVec3::new(x, y, z)) * OCTREE_SIZE;
        octrees.push(read_octree_record(&mut reader, position)?);
      }
    }
  }

  if !reader.is_empty() {
    tracing::debug!(?batch, trailing = reader.remaining(), "ignoring trailing batch bytes");
  }
  Ok(octrees)
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
