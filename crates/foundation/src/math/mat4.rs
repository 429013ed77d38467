use super::Vec3;

/// Column-major 4x4 matrix, laid out like WebXR/WebGL `Float32Array(16)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Reads 16 column-major values, e.g. `XRRigidTransform.matrix`.
    pub fn from_col_major(values: &[f32]) -> Option<Self> {
        if values.len() != 16 {
            return None;
        }
        let mut cols = [[0.0f64; 4]; 4];
        for (i, v) in values.iter().enumerate() {
            cols[i / 4][i % 4] = *v as f64;
        }
        Some(Self { cols })
    }

    pub fn to_col_major_f32(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (col, values) in self.cols.iter().enumerate() {
            for (row, v) in values.iter().enumerate() {
                out[col * 4 + row] = *v as f32;
            }
        }
        out
    }

    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    /// Right-handed rotation about +Y (same sense as a scene-graph yaw).
    pub fn rotation_y(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// RH perspective with a [-1, 1] depth range (WebGL clip space).
    pub fn perspective_rh_gl(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let range_inv = 1.0 / (near - far);
        Self {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, (near + far) * range_inv, -1.0],
                [0.0, 0.0, 2.0 * near * far * range_inv, 0.0],
            ],
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut c = [[0.0f64; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                c[col][row] = self.cols[0][row] * other.cols[col][0]
                    + self.cols[1][row] * other.cols[col][1]
                    + self.cols[2][row] * other.cols[col][2]
                    + self.cols[3][row] * other.cols[col][3];
            }
        }
        Self { cols: c }
    }

    /// Inverse of a rotation + translation matrix. Scale and shear are not
    /// handled; WebXR poses never carry them.
    pub fn rigid_inverse(&self) -> Self {
        let m = &self.cols;
        let t = Vec3::new(m[3][0], m[3][1], m[3][2]);
        let mut out = Self::IDENTITY;
        for col in 0..3 {
            for row in 0..3 {
                out.cols[col][row] = m[row][col];
            }
        }
        let r0 = Vec3::new(m[0][0], m[0][1], m[0][2]);
        let r1 = Vec3::new(m[1][0], m[1][1], m[1][2]);
        let r2 = Vec3::new(m[2][0], m[2][1], m[2][2]);
        out.cols[3] = [-r0.dot(t), -r1.dot(t), -r2.dot(t), 1.0];
        out
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let (x, y, z, _) = self.transform_homogeneous(p);
        Vec3::new(x, y, z)
    }

    /// Full homogeneous transform followed by the perspective divide.
    pub fn project_point(&self, p: Vec3) -> Vec3 {
        let (x, y, z, w) = self.transform_homogeneous(p);
        let w = if w == 0.0 { 1.0 } else { w };
        Vec3::new(x / w, y / w, z / w)
    }

    fn transform_homogeneous(&self, p: Vec3) -> (f64, f64, f64, f64) {
        let m = &self.cols;
        let row = |r: usize| m[0][r] * p.x + m[1][r] * p.y + m[2][r] * p.z + m[3][r];
        (row(0), row(1), row(2), row(3))
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
