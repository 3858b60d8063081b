//! Procedural unit primitives: cube, cylinder and UV sphere.
//!
//! All shapes are centered on the origin and fit the unit box
//! `[-0.5, 0.5]^3`, so a part's scale is its size.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use anyhow::{Context, Result, ensure};
use corelib::PrimitiveKind;

use crate::mesh::{MeshData, index};

pub const DEFAULT_CYLINDER_SIDES: u32 = 20;
pub const DEFAULT_SPHERE_BANDS: u32 = 20;

pub const MIN_CYLINDER_SIDES: u32 = 3;
pub const MIN_SPHERE_LAT_BANDS: u32 = 2;
pub const MIN_SPHERE_LONG_BANDS: u32 = 3;

/// Unit cube: 4 vertices per face so faces do not share corners.
pub fn cube() -> MeshData {
    #[rustfmt::skip]
    let positions = vec![
        // front
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // back
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // top
        [-0.5,  0.5, -0.5], [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5],
        // bottom
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
        // right
        [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5], [ 0.5, -0.5,  0.5],
        // left
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
    ];
    let indices = (0..6u16)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b, b + 2, b + 3]
        })
        .collect();
    MeshData::new(positions, indices)
}

/// Capped cylinder along Y: two cap centers, then `sides` (top, bottom)
/// rim pairs.
pub fn cylinder(sides: u32) -> Result<MeshData> {
    ensure!(
        sides >= MIN_CYLINDER_SIDES,
        "cylinder needs at least {MIN_CYLINDER_SIDES} sides, got {sides}"
    );
    let vertex_count = 2 + 2 * u64::from(sides);
    index(usize::try_from(vertex_count - 1)?).context("cylinder resolution too high")?;
    let n = sides as usize;

    let mut positions = Vec::with_capacity(2 + 2 * n);
    positions.push([0.0, 0.5, 0.0]);
    positions.push([0.0, -0.5, 0.0]);
    for i in 0..n {
        let angle = i as f32 * TAU / sides as f32;
        let (x, z) = (0.5 * angle.cos(), 0.5 * angle.sin());
        positions.push([x, 0.5, z]);
        positions.push([x, -0.5, z]);
    }

    let top = |i: usize| (2 + 2 * (i % n)) as u16;
    let bottom = |i: usize| (3 + 2 * (i % n)) as u16;

    let mut indices = Vec::with_capacity(12 * n);
    for i in 0..n {
        indices.extend_from_slice(&[0, top(i), top(i + 1)]);
        indices.extend_from_slice(&[1, bottom(i), bottom(i + 1)]);
    }
    for i in 0..n {
        indices.extend_from_slice(&[top(i), bottom(i), top(i + 1)]);
        indices.extend_from_slice(&[bottom(i), bottom(i + 1), top(i + 1)]);
    }
    Ok(MeshData::new(positions, indices))
}

/// Latitude/longitude sphere of radius 0.5. The seam column is duplicated,
/// giving `(lat + 1) * (long + 1)` vertices.
pub fn sphere(lat_bands: u32, long_bands: u32) -> Result<MeshData> {
    ensure!(
        lat_bands >= MIN_SPHERE_LAT_BANDS && long_bands >= MIN_SPHERE_LONG_BANDS,
        "sphere needs at least {MIN_SPHERE_LAT_BANDS}x{MIN_SPHERE_LONG_BANDS} bands, got {lat_bands}x{long_bands}"
    );
    let vertex_count = (u64::from(lat_bands) + 1)
        .checked_mul(u64::from(long_bands) + 1)
        .with_context(|| format!("sphere resolution {lat_bands}x{long_bands} overflows"))?;
    index(usize::try_from(vertex_count - 1)?).context("sphere resolution too high")?;
    let (lat, long) = (lat_bands as usize, long_bands as usize);
    let vertex_count = vertex_count as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    for la in 0..=lat {
        let theta = la as f32 * PI / lat_bands as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for lo in 0..=long {
            let phi = lo as f32 * TAU / long_bands as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            positions.push([0.5 * cos_p * sin_t, 0.5 * cos_t, 0.5 * sin_p * sin_t]);
        }
    }

    let mut indices = Vec::with_capacity(6 * lat * long);
    for la in 0..lat {
        for lo in 0..long {
            let first = (la * (long + 1) + lo) as u16;
            let second = first + long as u16 + 1;
            indices.extend_from_slice(&[first, second, first + 1]);
            indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }
    Ok(MeshData::new(positions, indices))
}

/// A primitive together with the resolution it is generated at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    Cube,
    Cylinder { sides: u32 },
    Sphere { lat: u32, long: u32 },
}

impl PrimitiveKey {
    pub fn build(&self) -> Result<MeshData> {
        match *self {
            PrimitiveKey::Cube => Ok(cube()),
            PrimitiveKey::Cylinder { sides } => cylinder(sides),
            PrimitiveKey::Sphere { lat, long } => sphere(lat, long),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveKey::Cube => PrimitiveKind::Cube,
            PrimitiveKey::Cylinder { .. } => PrimitiveKind::Cylinder,
            PrimitiveKey::Sphere { .. } => PrimitiveKind::Sphere,
        }
    }
}

/// Tessellation used for the round primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshResolution {
    pub cylinder_sides: u32,
    pub sphere_lat: u32,
    pub sphere_long: u32,
}

impl MeshResolution {
    pub fn key(&self, kind: PrimitiveKind) -> PrimitiveKey {
        match kind {
            PrimitiveKind::Cube => PrimitiveKey::Cube,
            PrimitiveKind::Cylinder => PrimitiveKey::Cylinder {
                sides: self.cylinder_sides,
            },
            PrimitiveKind::Sphere => PrimitiveKey::Sphere {
                lat: self.sphere_lat,
                long: self.sphere_long,
            },
        }
    }

    /// Check that every primitive can be generated at this resolution.
    pub fn validate(&self) -> Result<()> {
        for kind in [PrimitiveKind::Cylinder, PrimitiveKind::Sphere] {
            self.key(kind)
                .build()
                .with_context(|| format!("invalid {kind:?} resolution"))?;
        }
        Ok(())
    }
}

impl Default for MeshResolution {
    fn default() -> Self {
        Self {
            cylinder_sides: DEFAULT_CYLINDER_SIDES,
            sphere_lat: DEFAULT_SPHERE_BANDS,
            sphere_long: DEFAULT_SPHERE_BANDS,
        }
    }
}

/// Generated meshes memoized by key; a mesh is only rebuilt for a key it
/// has not seen.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: HashMap<PrimitiveKey, MeshData>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, key: PrimitiveKey) -> Result<&MeshData> {
        if !self.meshes.contains_key(&key) {
            let mesh = key.build()?;
            log::debug!(
                "generated {key:?}: {} vertices, {} triangles",
                mesh.positions.len(),
                mesh.triangle_count()
            );
            self.meshes.insert(key, mesh);
        }
        Ok(&self.meshes[&key])
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radius_xz(p: &[f32; 3]) -> f32 {
        (p[0] * p[0] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn cube_is_24_by_36() {
        let m = cube();
        assert_eq!(m.positions.len(), 24);
        assert_eq!(m.indices.len(), 36);
        assert!(m.is_valid());
        assert_eq!(m.bounds(), Some(([-0.5; 3], [0.5; 3])));
    }

    #[test]
    fn cylinder_counts_and_radius() {
        let m = cylinder(20).unwrap();
        assert_eq!(m.positions.len(), 42);
        assert_eq!(m.indices.len(), 240);
        assert!(m.is_valid());
        for p in &m.positions[2..] {
            assert!((radius_xz(p) - 0.5).abs() < 1e-6);
            assert_eq!(p[1].abs(), 0.5);
        }
    }

    #[test]
    fn cylinder_rejects_degenerate_resolution() {
        assert!(cylinder(2).is_err());
        assert!(cylinder(40_000).is_err());
        assert!(cylinder(u32::MAX).is_err());
    }

    #[test]
    fn sphere_counts_and_radius() {
        let m = sphere(20, 20).unwrap();
        assert_eq!(m.positions.len(), 441);
        assert_eq!(m.indices.len(), 2400);
        assert!(m.is_valid());
        for p in &m.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_rejects_degenerate_resolution() {
        assert!(sphere(1, 20).is_err());
        assert!(sphere(20, 2).is_err());
        assert!(sphere(300, 300).is_err());
        assert!(sphere(u32::MAX, u32::MAX).is_err());
        assert!(sphere(2, u32::MAX).is_err());
    }

    #[test]
    fn resolution_maps_kinds_to_keys() {
        let res = MeshResolution::default();
        assert_eq!(res.key(PrimitiveKind::Cube), PrimitiveKey::Cube);
        assert_eq!(
            res.key(PrimitiveKind::Cylinder),
            PrimitiveKey::Cylinder { sides: 20 }
        );
        assert_eq!(res.key(PrimitiveKind::Sphere).kind(), PrimitiveKind::Sphere);
        assert!(res.validate().is_ok());

        let bad = MeshResolution {
            cylinder_sides: 1,
            ..res
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn cache_builds_once_per_key() {
        let mut cache = MeshCache::new();
        let a = cache.get_or_build(PrimitiveKey::Cylinder { sides: 8 }).unwrap().clone();
        let b = cache.get_or_build(PrimitiveKey::Cylinder { sides: 8 }).unwrap().clone();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);

        cache.get_or_build(PrimitiveKey::Cylinder { sides: 12 }).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_build(PrimitiveKey::Sphere { lat: 0, long: 0 }).is_err());
        assert_eq!(cache.len(), 2);
    }
}
