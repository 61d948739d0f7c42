//! Small linear-algebra types used by the attitude estimator.
//!
//! `q[4]`, `gyro_bias[3]` and `R[3][3]` in the original firmware are algebraic
//! objects, not collections — modeling them as named structs makes the shape
//! (and the invariants on it) compiler-checked instead of convention-checked.

use micromath::F32Ext;

/// Scalar-first unit quaternion, body-to-earth rotation. Kept with `w >= 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn norm(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A 3-component vector — body rates (deg/s), accelerations (m/s²), or a
/// rotation axis, depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn scale(&self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Row-major 3×3 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
}

/// Vector cross product `a × b`.
pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Matrix-vector product `m * v`.
pub fn rot_mult(m: &Mat3, v: &Vec3) -> Vec3 {
    Vec3::new(
        m.0[0][0] * v.x + m.0[0][1] * v.y + m.0[0][2] * v.z,
        m.0[1][0] * v.x + m.0[1][1] * v.y + m.0[1][2] * v.z,
        m.0[2][0] * v.x + m.0[2][1] * v.y + m.0[2][2] * v.z,
    )
}

/// Rotation matrix equivalent to a unit quaternion.
pub fn quat_to_mat3(q: &Quaternion) -> Mat3 {
    let (w, x, y, z) = (q.w, q.x, q.y, q.z);
    Mat3([
        [w * w + x * x - y * y - z * z, 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
        [2.0 * (x * y + w * z), w * w - x * x + y * y - z * z, 2.0 * (y * z - w * x)],
        [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), w * w - x * x - y * y + z * z],
    ])
}

/// Quaternion equivalent to a roll/pitch/yaw Euler triple, in degrees,
/// applied in roll-pitch-yaw order (body 1-2-3 intrinsic rotation).
pub fn rpy_to_quat(rpy_deg: &Vec3) -> Quaternion {
    let half = Vec3::new(
        rpy_deg.x.to_radians() * 0.5,
        rpy_deg.y.to_radians() * 0.5,
        rpy_deg.z.to_radians() * 0.5,
    );
    let (sr, cr) = (half.x.sin(), half.x.cos());
    let (sp, cp) = (half.y.sin(), half.y.cos());
    let (sy, cy) = (half.z.sin(), half.z.cos());

    Quaternion {
        w: cr * cp * cy + sr * sp * sy,
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
    }
}

/// Euler roll/pitch/yaw (degrees) equivalent to a unit quaternion, in that order.
pub fn quat_to_rpy(q: &Quaternion) -> Vec3 {
    let (w, x, y, z) = (q.w, q.x, q.y, q.z);

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        core::f32::consts::FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    Vec3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}
