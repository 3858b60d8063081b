//! Emission contract between the figure and whatever draws it.

use std::convert::Infallible;

use crate::transform::Affine4;

/// Base mesh shapes every body part is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Cube,
    Cylinder,
    Sphere,
}

/// Flat RGBA color, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// True when the color needs blending against what is behind it.
    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.0[3] < 1.0
    }
}

/// A rendering back end that accepts one figure per frame.
pub trait Renderer {
    type Error;

    /// Start a frame. `global` wraps every emitted transform (camera).
    fn begin_frame(&mut self, global: &Affine4);

    /// Queue one primitive placed by `world`.
    fn emit(&mut self, kind: PrimitiveKind, world: &Affine4, color: Rgba);

    /// Flush everything emitted since `begin_frame`.
    fn end_frame(&mut self) -> Result<(), Self::Error>;
}

/// One recorded `emit` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
    pub kind: PrimitiveKind,
    pub world: Affine4,
    pub color: Rgba,
}

/// In-memory renderer that keeps the last completed frame.
#[derive(Default, Debug)]
pub struct RecordingRenderer {
    global: Affine4,
    pending: Vec<Emission>,
    frame: Vec<Emission>,
    frames: u64,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emissions of the last finished frame.
    pub fn frame(&self) -> &[Emission] {
        &self.frame
    }

    pub fn global(&self) -> &Affine4 {
        &self.global
    }

    pub fn frames_finished(&self) -> u64 {
        self.frames
    }
}

impl Renderer for RecordingRenderer {
    type Error = Infallible;

    fn begin_frame(&mut self, global: &Affine4) {
        self.global = *global;
        self.pending.clear();
    }

    fn emit(&mut self, kind: PrimitiveKind, world: &Affine4, color: Rgba) {
        self.pending.push(Emission {
            kind,
            world: *world,
            color,
        });
    }

    fn end_frame(&mut self) -> Result<(), Infallible> {
        self.frame = std::mem::take(&mut self.pending);
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_publishes_on_end_frame() {
        let mut r = RecordingRenderer::new();
        r.begin_frame(&Affine4::IDENTITY);
        r.emit(PrimitiveKind::Cube, &Affine4::IDENTITY, Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert!(r.frame().is_empty());
        r.end_frame().unwrap();
        assert_eq!(r.frame().len(), 1);
        assert_eq!(r.frames_finished(), 1);

        r.begin_frame(&Affine4::IDENTITY);
        r.end_frame().unwrap();
        assert!(r.frame().is_empty());
    }

    #[test]
    fn translucency_follows_alpha() {
        assert!(Rgba::new(0.7, 0.9, 1.0, 0.7).is_translucent());
        assert!(!Rgba::new(0.7, 0.9, 1.0, 1.0).is_translucent());
    }
}
