//! Flat colors of the figure (Siamese cat in a blue suit).

use crate::render::Rgba;

pub const SPACE_SUIT: Rgba = Rgba::new(0.3, 0.6, 0.9, 1.0);
pub const CAT_HEAD: Rgba = Rgba::new(0.8, 0.75, 0.7, 1.0);
/// Dark "points": ears, face mask, tail, legs, paws.
pub const CAT_POINTS: Rgba = Rgba::new(0.4, 0.3, 0.25, 1.0);
pub const CAT_NOSE: Rgba = Rgba::new(0.9, 0.5, 0.6, 1.0);
pub const CAT_EYES: Rgba = Rgba::new(0.0, 0.6, 0.8, 1.0);
pub const WHISKERS: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
pub const HELMET: Rgba = Rgba::new(0.7, 0.9, 1.0, 0.7);
pub const HELMET_RING: Rgba = Rgba::new(0.9, 0.9, 0.2, 1.0);

/// Clear color behind the figure (deep space).
pub const BACKGROUND: Rgba = Rgba::new(0.0, 0.0, 0.1, 1.0);
