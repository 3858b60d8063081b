use crate::Mat4;
use crate::transform::Affine4;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;
/// Degrees of rotation per pixel of mouse drag.
pub const DRAG_DEG_PER_PX: f32 = 0.5;

/// GL-style clip space (z in [-1, 1]) to wgpu's (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

/// Turntable camera: pitch/yaw in degrees plus a uniform zoom, applied to
/// the whole figure as one outer transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub pitch_deg: f32,
    pub yaw_deg: f32,
    zoom: f32,
}

impl OrbitCamera {
    /// Yaw starts at 180 so the cat faces the viewer.
    pub fn new() -> Self {
        Self {
            pitch_deg: 0.0,
            yaw_deg: 180.0,
            zoom: 1.0,
        }
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// One wheel notch: positive zooms in.
    pub fn zoom_steps(&mut self, steps: f32) {
        self.set_zoom(self.zoom + steps * ZOOM_STEP);
    }

    /// Mouse drag by `(dx, dy)` pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw_deg += dx * DRAG_DEG_PER_PX;
        self.pitch_deg += dy * DRAG_DEG_PER_PX;
    }

    /// `S(zoom) * Rx(pitch) * Ry(yaw)`.
    pub fn global_transform(&self) -> Affine4 {
        let mut m = Affine4::IDENTITY;
        m.scale(self.zoom, self.zoom, self.zoom)
            .rotate(self.pitch_deg, 1.0, 0.0, 0.0)
            .rotate(self.yaw_deg, 0.0, 1.0, 0.0);
        m
    }

    /// Global transform plus aspect correction and depth remap, ready for
    /// the shader.
    pub fn clip_transform(&self, aspect: f32) -> Affine4 {
        let aspect = aspect.max(1e-6);
        let mut fit = Affine4::IDENTITY;
        if aspect > 1.0 {
            fit.scale(1.0 / aspect, 1.0, 1.0);
        } else {
            fit.scale(1.0, aspect, 1.0);
        }
        Affine4::from_mat4(OPENGL_TO_WGPU) * fit * self.global_transform()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::new();
        for _ in 0..100 {
            cam.zoom_steps(1.0);
        }
        assert_eq!(cam.zoom(), MAX_ZOOM);
        cam.set_zoom(0.01);
        assert_eq!(cam.zoom(), MIN_ZOOM);
    }

    #[test]
    fn drag_turns_half_a_degree_per_pixel() {
        let mut cam = OrbitCamera::new();
        cam.drag(20.0, -10.0);
        assert_eq!(cam.yaw_deg, 190.0);
        assert_eq!(cam.pitch_deg, -5.0);
    }

    #[test]
    fn default_view_faces_the_cat() {
        // the face points along +Z in model space; yaw 180 brings it to -Z,
        // toward the viewer in GL clip space
        let g = OrbitCamera::new().global_transform();
        let p = g.transform_point3(Vec3::new(0.0, 0.0, 1.0));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn clip_transform_remaps_depth_and_aspect() {
        let mut cam = OrbitCamera::new();
        cam.yaw_deg = 0.0;
        let clip = cam.clip_transform(2.0);
        let p = clip.transform_point3(Vec3::new(1.0, 1.0, -1.0));
        assert!(p.abs_diff_eq(Vec3::new(0.5, 1.0, 0.0), 1e-5));
        let p = clip.transform_point3(Vec3::new(0.0, 0.0, 1.0));
        assert!((p.z - 1.0).abs() < 1e-5);
    }
}
