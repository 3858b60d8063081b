//! Mutable 4x4 model transform used to pose the figure.
//!
//! Every mutator composes into the existing matrix from the right
//! (`self = self * op`), so calls read in the order they apply to a mesh:
//! `translate` then `rotate` then `scale` places, orients and sizes a part
//! in its parent's local frame.

use std::ops::Mul;

use crate::error::{CoreError, CoreResult};
use crate::{Mat4, Vec3, Vec4};

/// Column-major homogeneous transform (16 floats).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine4(Mat4);

impl Affine4 {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    #[inline]
    pub const fn from_mat4(m: Mat4) -> Self {
        Self(m)
    }

    /// Build from 16 column-major components.
    pub fn from_cols_slice(src: &[f32]) -> CoreResult<Self> {
        let mut m = Self::IDENTITY;
        m.set_from_slice(src)?;
        Ok(m)
    }

    #[inline]
    pub fn mat4(&self) -> Mat4 {
        self.0
    }

    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    #[inline]
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.0.to_cols_array_2d()
    }

    #[inline]
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        self.0.transform_point3(p)
    }

    /// Translation column (xyz).
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.0.w_axis.truncate()
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }

    /// Reset to the multiplicative identity.
    pub fn identity(&mut self) -> &mut Self {
        self.0 = Mat4::IDENTITY;
        self
    }

    /// Deep copy of another transform.
    pub fn set(&mut self, src: &Affine4) -> &mut Self {
        self.0 = src.0;
        self
    }

    /// Copy 16 column-major components. Anything else is rejected and the
    /// matrix keeps its previous value.
    pub fn set_from_slice(&mut self, src: &[f32]) -> CoreResult<&mut Self> {
        if src.len() != 16 {
            return Err(CoreError::InvalidMatrixSource { len: src.len() });
        }
        self.0 = Mat4::from_cols_slice(src);
        Ok(self)
    }

    /// Move the origin along the matrix's own basis vectors:
    /// `t' = t + M * (x, y, z, 0)`.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        let m = &mut self.0;
        m.w_axis += m.x_axis * x + m.y_axis * y + m.z_axis * z;
        self
    }

    /// Rotate by `angle_deg` about the axis `(x, y, z)`.
    ///
    /// The axis is normalized first. A zero-length axis leaves the matrix
    /// untouched whatever the angle.
    pub fn rotate(&mut self, angle_deg: f32, x: f32, y: f32, z: f32) -> &mut Self {
        let axis = Vec3::new(x, y, z);
        if axis.length_squared() == 0.0 {
            return self;
        }
        let r = Mat4::from_axis_angle(axis.normalize(), angle_deg.to_radians());
        self.0 *= r;
        self
    }

    /// Scale the first three basis columns in place.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        let m = &mut self.0;
        m.x_axis *= x;
        m.y_axis *= y;
        m.z_axis *= z;
        self
    }

    /// Replace the matrix with its inverse.
    ///
    /// Fails with [`CoreError::SingularMatrix`] when the determinant is zero
    /// (or not finite); the matrix is not modified in that case.
    pub fn invert(&mut self) -> CoreResult<&mut Self> {
        let det = self.0.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(CoreError::SingularMatrix);
        }
        self.0 = self.0.inverse();
        Ok(self)
    }

    /// Non-mutating inverse.
    pub fn inverted(&self) -> Option<Self> {
        let mut m = *self;
        m.invert().ok()?;
        Some(m)
    }

    /// Fourth row; `(0, 0, 0, 1)` for every transform built from
    /// translate/rotate/scale.
    #[inline]
    pub fn bottom_row(&self) -> Vec4 {
        self.0.row(3)
    }
}

impl Default for Affine4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Affine4 {
    type Output = Affine4;

    fn mul(self, rhs: Affine4) -> Affine4 {
        Affine4(self.0 * rhs.0)
    }
}

impl From<Mat4> for Affine4 {
    fn from(m: Mat4) -> Self {
        Self(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample() -> Affine4 {
        let mut m = Affine4::IDENTITY;
        m.translate(0.3, -1.2, 2.0)
            .rotate(37.0, 1.0, 2.0, -0.5)
            .scale(0.5, 1.5, 2.0)
            .rotate(-80.0, 0.0, 1.0, 0.0);
        m
    }

    #[test]
    fn zero_rotation_keeps_identity_for_any_axis() {
        for axis in [[1.0, 0.0, 0.0], [0.3, -2.0, 5.0], [0.0, 0.0, 0.0]] {
            let mut m = sample();
            m.identity().rotate(0.0, axis[0], axis[1], axis[2]);
            assert!(m.abs_diff_eq(&Affine4::IDENTITY, EPS));
        }
    }

    #[test]
    fn zero_axis_is_a_noop_for_nonzero_angle() {
        let before = sample();
        let mut m = before;
        m.rotate(73.0, 0.0, 0.0, 0.0);
        assert_eq!(m, before);
    }

    #[test]
    fn opposite_rotations_cancel() {
        let before = sample();
        let mut m = before;
        m.rotate(41.0, 0.2, 0.7, -1.0).rotate(-41.0, 0.2, 0.7, -1.0);
        assert!(m.abs_diff_eq(&before, EPS));
    }

    #[test]
    fn rotate_about_z_turns_x_into_y() {
        let mut m = Affine4::IDENTITY;
        m.rotate(90.0, 0.0, 0.0, 5.0);
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Y, EPS));
    }

    #[test]
    fn translate_uses_local_axes() {
        let mut m = Affine4::IDENTITY;
        m.scale(2.0, 2.0, 2.0).rotate(90.0, 0.0, 0.0, 1.0).translate(1.0, 0.0, 0.0);
        // local +X is world +Y after the rotation, doubled by the scale
        assert!(m.translation().abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPS));
    }

    #[test]
    fn scale_multiplies_basis_columns() {
        let mut m = Affine4::IDENTITY;
        m.translate(1.0, 2.0, 3.0).scale(2.0, 3.0, 4.0);
        let a = m.to_cols_array();
        assert_eq!(a[0], 2.0);
        assert_eq!(a[5], 3.0);
        assert_eq!(a[10], 4.0);
        // translation is untouched by a later scale
        assert_eq!(&a[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn double_inversion_restores_matrix() {
        let before = sample();
        let mut m = before;
        m.invert().unwrap().invert().unwrap();
        assert!(m.abs_diff_eq(&before, 1e-4));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = sample();
        let inv = m.inverted().expect("invertible");
        assert!((m * inv).abs_diff_eq(&Affine4::IDENTITY, 1e-5));
    }

    #[test]
    fn singular_inversion_fails_without_mutation() {
        let mut m = sample();
        m.scale(1.0, 0.0, 1.0);
        let before = m;
        assert_eq!(m.invert().err(), Some(CoreError::SingularMatrix));
        assert_eq!(m, before);
        assert!(m.inverted().is_none());
    }

    #[test]
    fn copy_from_slice_validates_length() {
        let src = sample().to_cols_array();
        let m = Affine4::from_cols_slice(&src).unwrap();
        assert_eq!(m, sample());

        let mut target = sample();
        let err = target.set_from_slice(&src[..9]).unwrap_err();
        assert_eq!(err, CoreError::InvalidMatrixSource { len: 9 });
        assert_eq!(target, sample());
        assert!(Affine4::from_cols_slice(&[]).is_err());
    }

    #[test]
    fn set_copies_by_value() {
        let src = sample();
        let mut dst = Affine4::IDENTITY;
        dst.set(&src);
        dst.translate(5.0, 0.0, 0.0);
        assert_eq!(src, sample());
        assert_ne!(dst, src);
    }

    #[test]
    fn trs_keeps_affine_bottom_row() {
        assert!(sample().bottom_row().abs_diff_eq(Vec4::W, EPS));
    }
}
