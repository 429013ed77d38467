/// Orientation quaternion in the component order a sensor delivers it.
///
/// The Generic Sensor API reports `[x, y, z, w]`; the accessors name the
/// components positionally (`q1..q4`) so the heading formula reads the same
/// regardless of convention.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat(pub [f64; 4]);

impl Quat {
    pub const IDENTITY: Self = Self([0.0, 0.0, 0.0, 1.0]);

    pub fn new(q1: f64, q2: f64, q3: f64, q4: f64) -> Self {
        Self([q1, q2, q3, q4])
    }

    /// Builds a quaternion from a slice of exactly four components.
    pub fn from_slice(components: &[f64]) -> Option<Self> {
        let array: [f64; 4] = components.try_into().ok()?;
        Some(Self(array))
    }

    /// Rotation of `angle_rad` about the `z` axis, in `[x, y, z, w]` order.
    pub fn from_rotation_z(angle_rad: f64) -> Self {
        let half = angle_rad * 0.5;
        Self([0.0, 0.0, half.sin(), half.cos()])
    }

    pub fn q1(&self) -> f64 {
        self.0[0]
    }

    pub fn q2(&self) -> f64 {
        self.0[1]
    }

    pub fn q3(&self) -> f64 {
        self.0[2]
    }

    pub fn q4(&self) -> f64 {
        self.0[3]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Yaw extracted with `atan2(2*q1*q2 + 2*q3*q4, 1 - 2*q2^2 - 2*q3^2)`.
    pub fn heading(&self) -> f64 {
        let (q1, q2, q3, q4) = (self.q1(), self.q2(), self.q3(), self.q4());
        (2.0 * q1 * q2 + 2.0 * q3 * q4).atan2(1.0 - 2.0 * q2 * q2 - 2.0 * q3 * q3)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
