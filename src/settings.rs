//! Configuration object mutated by the settings callback and read by the
//! estimator once per cycle.

use crate::linalg::{quat_to_mat3, rpy_to_quat, Mat3, Vec3};

/// Full settings snapshot, as delivered by the settings broadcast mailbox.
///
/// Every field here round-trips through a single `apply_settings` call —
/// there is no partial update. `gyro_bias_seed` is the persisted bias as
/// stored (hundredths of a deg/s); dividing by 100 happens on apply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttitudeSettings {
    pub accel_kp: f32,
    pub accel_ki: f32,
    pub yaw_bias_rate: f32,
    pub gyro_gain: f32,
    pub accel_bias: Vec3,
    pub gyro_bias_seed: Vec3,
    pub board_rotation_rpy: Vec3,
    pub zero_during_arming: bool,
    pub bias_correct_gyro: bool,
}

impl Default for AttitudeSettings {
    fn default() -> Self {
        Self {
            accel_kp: 0.0,
            accel_ki: 0.0,
            yaw_bias_rate: 0.0,
            gyro_gain: 0.42,
            accel_bias: Vec3::ZERO,
            gyro_bias_seed: Vec3::ZERO,
            board_rotation_rpy: Vec3::ZERO,
            zero_during_arming: false,
            bias_correct_gyro: true,
        }
    }
}

/// The board-rotation matrix and whether it differs from identity, derived
/// from `board_rotation_rpy`. Kept as a pair because the two must always be
/// updated together (see `AttitudeEstimator::apply_settings`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardRotation {
    pub rotate: bool,
    pub r: Mat3,
}

impl BoardRotation {
    pub const IDENTITY: BoardRotation = BoardRotation { rotate: false, r: Mat3::IDENTITY };

    pub fn from_rpy_deg(rpy: &Vec3) -> Self {
        if rpy.x == 0.0 && rpy.y == 0.0 && rpy.z == 0.0 {
            return Self::IDENTITY;
        }
        let q = rpy_to_quat(rpy);
        BoardRotation { rotate: true, r: quat_to_mat3(&q) }
    }
}
