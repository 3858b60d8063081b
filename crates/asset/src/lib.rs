//! Mesh assets for the figure.
//! Primitive generators (cube, cylinder, sphere) producing CPU-friendly mesh data.

pub mod mesh;
pub mod primitives;

pub use mesh::MeshData;
pub use primitives::{MeshCache, MeshResolution, PrimitiveKey};
