//! 4x4 matrix (column-major, right-handed, depth 0 to 1)

use super::Vec3;
use serde::{Deserialize, Serialize};

/// 4x4 transformation matrix (column-major)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
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

    pub fn translation(v: Vec3) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [v.x, v.y, v.z, 1.0],
            ],
        }
    }

    pub fn scale(v: Vec3) -> Self {
        Self {
            cols: [
                [v.x, 0.0, 0.0, 0.0],
                [0.0, v.y, 0.0, 0.0],
                [0.0, 0.0, v.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Create from column-major array
    pub fn from_cols_array(arr: &[f32; 16]) -> Mat4 {
        Mat4 {
            cols: [
                [arr[0], arr[1], arr[2], arr[3]],
                [arr[4], arr[5], arr[6], arr[7]],
                [arr[8], arr[9], arr[10], arr[11]],
                [arr[12], arr[13], arr[14], arr[15]],
            ],
        }
    }

    /// Convert to 2D array format (GPU upload layout)
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.cols
    }

    /// Multiply two matrices (`self * other`, `other` applied first)
    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    result[i][j] += self.cols[k][j] * other.cols[i][k];
                }
            }
        }
        Mat4 { cols: result }
    }

    /// Transform a point (w = 1, no perspective divide)
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1],
            c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2],
        )
    }

    /// Transform a homogeneous point to clip space
    pub fn transform_point4(&self, p: Vec3) -> [f32; 4] {
        let c = &self.cols;
        let mut out = [0.0f32; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = c[0][row] * p.x + c[1][row] * p.y + c[2][row] * p.z + c[3][row];
        }
        out
    }

    /// Translation component (world position of the local origin)
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Create a perspective projection matrix (right-handed, depth 0 to 1)
    pub fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let h = 1.0 / (fov_y * 0.5).tan();
        let w = h / aspect;
        let r = far / (near - far);

        Mat4 {
            cols: [
                [w, 0.0, 0.0, 0.0],
                [0.0, h, 0.0, 0.0],
                [0.0, 0.0, r, -1.0],
                [0.0, 0.0, near * r, 0.0],
            ],
        }
    }

    /// Create a look-at view matrix (right-handed)
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let f = (target - eye).normalize();
        let s = f.cross(up);
        let s = if s.length_squared() > 0.0 {
            s.normalize()
        } else {
            Vec3::new(1.0, 0.0, 0.0)
        };
        let u = s.cross(f);

        Mat4 {
            cols: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
            ],
        }
    }

    /// Rotation basis whose +Z axis points from `target` back to `eye`.
    ///
    /// No translation and no inversion: the columns are the orthonormal
    /// right/up/back axes of an observer at `eye` facing `target`. Degenerate
    /// inputs are nudged the same way scene-graph look-at helpers do, so the
    /// result is always a proper rotation.
    pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let mut z = eye - target;
        if z.length_squared() == 0.0 {
            z.z = 1.0;
        }
        z = z.normalize();

        let mut x = up.cross(z);
        if x.length_squared() == 0.0 {
            if up.z.abs() == 1.0 {
                z.x += 0.0001;
            } else {
                z.z += 0.0001;
            }
            z = z.normalize();
            x = up.cross(z);
        }
        let x = x.normalize();
        let y = z.cross(x);

        Mat4 {
            cols: [
                [x.x, x.y, x.z, 0.0],
                [y.x, y.y, y.z, 0.0],
                [z.x, z.y, z.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Component-wise comparison within a tolerance
    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mul() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn test_mul_order_applies_rhs_first() {
        let t = Mat4::translation(Vec3::new(0.0, 1.7, 0.0));
        let s = Mat4::scale(Vec3::splat(2.0));
        // scale first, then translate
        let p = (t * s).transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 2.0).abs() < 1e-6);
        assert!((p.y - 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 1.7, 2.0);
        let view = Mat4::look_at_rh(eye, Vec3::new(0.0, 1.7, 0.0), Vec3::UP);
        let p = view.transform_point(eye);
        assert!(p.length() < 1e-5);
        // target lies on -Z in view space
        let t = view.transform_point(Vec3::new(0.0, 1.7, 0.0));
        assert!((t.z + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_look_rotation_is_orthonormal() {
        let m = Mat4::look_rotation(Vec3::new(0.3, 1.2, -0.4), Vec3::ZERO, Vec3::UP);
        let x = Vec3::new(m.cols[0][0], m.cols[0][1], m.cols[0][2]);
        let y = Vec3::new(m.cols[1][0], m.cols[1][1], m.cols[1][2]);
        let z = Vec3::new(m.cols[2][0], m.cols[2][1], m.cols[2][2]);
        assert!((x.length() - 1.0).abs() < 1e-5);
        assert!((y.length() - 1.0).abs() < 1e-5);
        assert!((z.length() - 1.0).abs() < 1e-5);
        assert!(x.dot(y).abs() < 1e-5);
        assert!(y.dot(z).abs() < 1e-5);
        assert_eq!(m.position(), Vec3::ZERO);
    }

    #[test]
    fn test_look_rotation_back_axis_points_at_eye() {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let m = Mat4::look_rotation(eye, Vec3::ZERO, Vec3::UP);
        assert!((m.cols[2][2] - 1.0).abs() < 1e-6);
        assert!((m.cols[0][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_look_rotation_degenerate_inputs() {
        // eye on the target
        let m = Mat4::look_rotation(Vec3::ZERO, Vec3::ZERO, Vec3::UP);
        assert!((m.cols[2][2] - 1.0).abs() < 1e-6);
        // looking straight down the up axis
        let m = Mat4::look_rotation(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::UP);
        assert!(m.cols.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_perspective_maps_near_plane_to_zero() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let clip = proj.transform_point4(Vec3::new(0.0, 0.0, -0.1));
        assert!((clip[2] / clip[3]).abs() < 1e-5);
    }
}
