use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2D) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

/// A 2D size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Compute the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

/// A 4x4 matrix stored column-major, the layout WGSL expects for `mat4x4<f32>`.
///
/// The builder methods post-multiply: `m.translate(..).rotate_z(..)` applies the rotation to
/// vertices first, then the translation, then whatever `m` already held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    cols: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Orthographic projection mapping the box to clip space with depth in [0, 1].
    ///
    /// Passing `bottom > top` mirrors the vertical axis.
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = 2.0 / (right - left);
        m.cols[1][1] = 2.0 / (top - bottom);
        m.cols[2][2] = -1.0 / (far - near);
        m.cols[3][0] = -(right + left) / (right - left);
        m.cols[3][1] = -(top + bottom) / (top - bottom);
        m.cols[3][2] = -near / (far - near);
        m
    }

    pub fn from_translation(x: f64, y: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3][0] = x;
        m.cols[3][1] = y;
        m
    }

    /// Counter-clockwise rotation about the z axis.
    pub fn from_rotation_z(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0][0] = cos;
        m.cols[0][1] = sin;
        m.cols[1][0] = -sin;
        m.cols[1][1] = cos;
        m
    }

    /// Uniform scale in the xy plane.
    pub fn from_scale(factor: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = factor;
        m.cols[1][1] = factor;
        m
    }

    pub fn translate(self, x: f64, y: f64) -> Self {
        self * Self::from_translation(x, y)
    }

    pub fn rotate_z(self, degrees: f64) -> Self {
        self * Self::from_rotation_z(degrees)
    }

    pub fn scale(self, factor: f64) -> Self {
        self * Self::from_scale(factor)
    }

    /// Element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Transform a point on the z = 0 plane.
    pub fn transform_point(&self, p: Point2D) -> Point2D {
        let x = self.get(0, 0) * p.x + self.get(0, 1) * p.y + self.get(0, 3);
        let y = self.get(1, 0) * p.x + self.get(1, 1) * p.y + self.get(1, 3);
        let w = self.get(3, 0) * p.x + self.get(3, 1) * p.y + self.get(3, 3);
        if w != 0.0 && w != 1.0 {
            Point2D::new(x / w, y / w)
        } else {
            Point2D::new(x, y)
        }
    }

    /// Component-wise comparison within `epsilon`.
    pub fn approx_eq(&self, other: &Mat4, epsilon: f64) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Columns narrowed to f32 for GPU upload.
    pub fn to_cols_array_f32(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        for (dst, src) in out.iter_mut().zip(self.cols.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = *s as f32;
            }
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f64; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, value) in out_col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.get(row, k) * rhs.get(k, col)).sum();
            }
        }
        Mat4 { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(p: Point2D, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-9, "x: {} != {}", p.x, x);
        assert!((p.y - y).abs() < 1e-9, "y: {} != {}", p.y, y);
    }

    #[test]
    fn test_size_aspect_ratio() {
        let s = Size2D::new(1920.0, 1080.0);
        assert!((s.aspect_ratio() - 16.0 / 9.0).abs() < 0.01);
        assert_eq!(Size2D::new(10.0, 0.0).aspect_ratio(), 0.0);
    }

    #[test]
    fn test_orthographic_maps_box_to_clip_space() {
        let m = Mat4::orthographic(-50.0, 50.0, -25.0, 25.0, 0.0, 1.0);
        assert_point(m.transform_point(Point2D::new(50.0, 25.0)), 1.0, 1.0);
        assert_point(m.transform_point(Point2D::new(-50.0, -25.0)), -1.0, -1.0);
        assert_point(m.transform_point(Point2D::zero()), 0.0, 0.0);
    }

    #[test]
    fn test_orthographic_flip_mirrors_vertical() {
        let m = Mat4::orthographic(-50.0, 50.0, 25.0, -25.0, 0.0, 1.0);
        assert_point(m.transform_point(Point2D::new(0.0, 25.0)), 0.0, -1.0);
    }

    #[test]
    fn test_post_multiplication_order() {
        // translate then rotate: the rotation applies to the vertex first
        let m = Mat4::identity().translate(10.0, 0.0).rotate_z(90.0);
        assert_point(m.transform_point(Point2D::new(1.0, 0.0)), 10.0, 1.0);

        let m = Mat4::identity().rotate_z(90.0).translate(10.0, 0.0);
        assert_point(m.transform_point(Point2D::new(1.0, 0.0)), 0.0, 11.0);
    }

    #[test]
    fn test_scale_and_identity() {
        let m = Mat4::identity().scale(2.5);
        assert_point(m.transform_point(Point2D::new(2.0, -4.0)), 5.0, -10.0);
        assert!((Mat4::identity() * Mat4::identity()).approx_eq(&Mat4::IDENTITY, 0.0));
    }

    #[test]
    fn test_cols_array_is_column_major() {
        let cols = Mat4::from_translation(3.0, 4.0).to_cols_array_f32();
        assert_eq!(cols[3][0], 3.0);
        assert_eq!(cols[3][1], 4.0);
        assert_eq!(cols[0][3], 0.0);
    }
}
