//! Immutable rest positions for one loaded model.

use crate::error::LoadError;
use glam::Vec3;
use std::sync::Arc;

/// The original sampled positions of a model.
///
/// Created once when a model finishes loading and never mutated afterwards.
/// Cloning is cheap: every clone shares the same allocation, so the
/// [`ParticleGroup`](crate::ParticleGroup) seeded from it and every
/// animation step that reads it as the rising target see one buffer.
#[derive(Clone, Debug)]
pub struct ReferenceBuffer {
    points: Arc<[Vec3]>,
}

impl ReferenceBuffer {
    /// Wrap a list of points.
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Build from a flattened `x, y, z, x, y, z, ...` array.
    pub fn from_flat(flat: &[f32]) -> Result<Self, LoadError> {
        if flat.len() % 3 != 0 {
            return Err(LoadError::RaggedBuffer(flat.len()));
        }
        let points = flat
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect::<Vec<_>>();
        Ok(Self::new(points))
    }

    /// Number of particles (points).
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the buffer holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rest position of particle `i`.
    #[inline]
    pub fn point(&self, i: usize) -> Vec3 {
        self.points[i]
    }

    /// All points in order.
    #[inline]
    pub fn as_slice(&self) -> &[Vec3] {
        &self.points
    }

    /// Stride-3 float view of the same data.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_groups_triples() {
        let buf = ReferenceBuffer::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.point(1), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(buf.as_flat(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_flat_rejects_ragged() {
        assert!(matches!(
            ReferenceBuffer::from_flat(&[1.0, 2.0]),
            Err(LoadError::RaggedBuffer(2))
        ));
    }

    #[test]
    fn test_clones_share_storage() {
        let a = ReferenceBuffer::new(vec![Vec3::ONE; 4]);
        let b = a.clone();
        assert!(std::ptr::eq(a.as_slice().as_ptr(), b.as_slice().as_ptr()));
    }
}
