//! Core types: math re-exports, transforms, pose, animation, rig.

pub use glam::{Mat4, Vec3, Vec4, vec3};

pub mod animation;
pub mod camera;
pub mod clock;
pub mod error;
pub mod palette;
pub mod pose;
pub mod render;
pub mod rig;
pub mod transform;

pub use error::{CoreError, CoreResult};
pub use pose::{ManualPose, PoseAngles};
pub use render::{PrimitiveKind, Renderer, Rgba};
pub use transform::Affine4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Affine4::IDENTITY.mat4(), Mat4::IDENTITY);
        assert_eq!(Affine4::default(), Affine4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_matrix() {
        let mut t = Affine4::IDENTITY;
        t.translate(1.0, 2.0, 3.0).scale(2.0, 2.0, 2.0);
        // Последний столбец = translation, диагональ = scale.
        let m = t.to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 2.0).abs() < 1e-6);
        assert!((m[5] - 2.0).abs() < 1e-6);
        assert!((m[10] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn posed_frame_is_finite() {
        let camera = camera::OrbitCamera::new();
        let mut renderer = render::RecordingRenderer::new();
        let pose = animation::walk_pose(0.3);
        rig::record_figure(
            &mut renderer,
            &camera.clip_transform(16.0 / 9.0),
            &rig::default_root(),
            &pose,
        );
        renderer.end_frame().unwrap();
        for e in renderer.frame() {
            let clip = *renderer.global() * e.world;
            assert!(clip.to_cols_array().iter().all(|f| f.is_finite()));
        }
    }
}
