//! CPU-side mesh representation produced by the primitive generators.

use anyhow::{Result, ensure};

/// Indexed triangle mesh, positions in object space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u16>) -> Self {
        Self { positions, indices }
    }

    /// Returns `true` if both buffers are non-empty and every index is in range.
    pub fn is_valid(&self) -> bool {
        !self.positions.is_empty()
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| usize::from(i) < self.positions.len())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds `(min, max)`.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(mut lo, mut hi), p| {
            for k in 0..3 {
                lo[k] = lo[k].min(p[k]);
                hi[k] = hi[k].max(p[k]);
            }
            (lo, hi)
        }))
    }
}

/// Checked conversion of a vertex number to a 16-bit index.
pub(crate) fn index(i: usize) -> Result<u16> {
    ensure!(i <= usize::from(u16::MAX), "vertex index {i} does not fit in 16 bits");
    Ok(i as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![[0.0; 3]; 3], vec![0, 1, 2]);
        assert!(data.is_valid());
        assert_eq!(data.triangle_count(), 1);

        let dangling = MeshData::new(vec![[0.0; 3]; 3], vec![0, 1, 3]);
        assert!(!dangling.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn bounds_cover_all_positions() {
        let data = MeshData::new(vec![[1.0, -2.0, 0.0], [-1.0, 3.0, 0.5]], vec![0, 1, 0]);
        assert_eq!(data.bounds(), Some(([-1.0, -2.0, 0.0], [1.0, 3.0, 0.5])));
        assert_eq!(MeshData::default().bounds(), None);
    }

    #[test]
    fn index_rejects_overflow() {
        assert_eq!(index(65_535).unwrap(), u16::MAX);
        assert!(index(65_536).is_err());
    }
}
