//! The attitude estimator: sample conditioning, the gravity-reference
//! complementary filter, and quaternion propagation.
//!
//! Everything here is pure state-machine logic over values the caller
//! already has in hand (a resolved gyro sample, a tick count, an accel
//! FIFO handle) — no waiting, no hardware access, so it is exercised
//! directly by the unit tests below without an async runtime.

use micromath::F32Ext;

use crate::capability::{AccelFifo, ArmState};
use crate::linalg::{cross, rot_mult, quat_to_rpy, Quaternion, Vec3};
use crate::settings::{AttitudeSettings, BoardRotation};

/// Gyro neutral ADC count at zero rate.
const GYRO_NEUTRAL: f32 = 1665.0;
/// Accelerometer LSB → g scale, then g → m/s² via `GRAVITY`.
const ACCEL_LSB_SCALE: f32 = 0.004;
const GRAVITY: f32 = 9.81;
/// Linear-acceleration rejection window, in m/s². Uses 9.8 rather than
/// `GRAVITY` to tolerate a slightly mis-calibrated accelerometer.
const REJECT_LOW: f32 = 9.8;
const REJECT_HIGH: f32 = 1.5 * 9.8;
/// Maximum accelerometer FIFO entries drained and averaged per cycle.
const FIFO_DRAIN_CAP: u32 = 32;
/// Below this quaternion norm (or NaN) we consider the state degenerate.
const REINIT_THRESHOLD: f32 = 1e-3;
/// Startup high-gain window, in ms of system uptime.
const STARTUP_WINDOW_MS: (u32, u32) = (1000, 7000);
/// Gains forced during the startup window or while armed-pending with
/// `zero_during_arming` set.
const HIGH_GAIN: EffectiveGains = EffectiveGains { accel_kp: 1.0, accel_ki: 0.9, yaw_bias_rate: 0.23 };

/// Nominal estimator update period, in milliseconds.
pub const UPDATE_PERIOD_MS: u32 = 2;
/// Gyro-receive timeout before a cycle is declared a `SensorTimeout`.
pub const GYRO_TIMEOUT_MS: u32 = 2 * UPDATE_PERIOD_MS;

/// One gyro sample as delivered by the gyro channel: raw ADC temperature and
/// raw X/Y/Z counts (not yet scaled).
#[derive(Clone, Copy, Debug)]
pub struct GyroSample {
    pub temperature: f32,
    pub raw: Vec3,
}

/// Conditioned per-cycle sensor output, published alongside the attitude.
#[derive(Clone, Copy, Debug)]
pub struct AttitudeRaw {
    pub accels: Vec3,
    pub gyros: Vec3,
    /// FIFO entries left unread when the drain loop stopped.
    pub samples_remaining: u8,
    /// FIFO entries actually averaged into `accels` this cycle.
    pub sample_count: u8,
}

/// Published attitude: the filter quaternion and its Euler equivalent.
#[derive(Clone, Copy, Debug)]
pub struct AttitudeOutput {
    pub q: Quaternion,
    pub roll_deg: f32,
    pub pitch_deg: f32,
    pub yaw_deg: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttitudeError {
    /// The gyro channel produced nothing within `GYRO_TIMEOUT_MS`.
    SensorTimeout,
    /// The accel FIFO was empty when a sample was expected.
    AccelEmpty,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EffectiveGains {
    accel_kp: f32,
    accel_ki: f32,
    yaw_bias_rate: f32,
}

impl Default for EffectiveGains {
    fn default() -> Self {
        Self { accel_kp: 0.0, accel_ki: 0.0, yaw_bias_rate: 0.0 }
    }
}

/// The full filter state: quaternion, gyro bias, board rotation, and the
/// bookkeeping needed to reproduce the startup gain schedule. Owned
/// exclusively by the estimator task — nothing else ever mutates it.
pub struct AttitudeEstimator {
    q: Quaternion,
    gyro_bias: Vec3,
    board: BoardRotation,
    last_tick: u32,
    /// Becomes true once the startup/arming high-gain window has been left
    /// and the user's configured gains have been loaded for the rest of
    /// this run.
    init: bool,
    gains: EffectiveGains,
    settings: AttitudeSettings,
}

impl AttitudeEstimator {
    pub fn new() -> Self {
        Self {
            q: Quaternion::IDENTITY,
            gyro_bias: Vec3::ZERO,
            board: BoardRotation::IDENTITY,
            last_tick: 0,
            init: false,
            gains: EffectiveGains::default(),
            settings: AttitudeSettings::default(),
        }
    }

    pub fn quaternion(&self) -> Quaternion {
        self.q
    }

    pub fn gyro_bias(&self) -> Vec3 {
        self.gyro_bias
    }

    /// Applies a full settings snapshot: gains, flags, accel bias, the
    /// persisted gyro-bias seed (divided by 100), and the board-rotation
    /// matrix — all in one atomic step, since `rotate` and `r` must never
    /// be observed out of sync with each other.
    pub fn apply_settings(&mut self, settings: AttitudeSettings) {
        self.board = BoardRotation::from_rpy_deg(&settings.board_rotation_rpy);
        self.gyro_bias = settings.gyro_bias_seed.scale(1.0 / 100.0);
        self.settings = settings;
    }

    /// Chooses the effective `(accel_kp, accel_ki, yaw_bias_rate)` for this
    /// cycle: high fixed gains during the first ~7s of uptime or while
    /// armed-pending with `zero_during_arming`, otherwise the user's
    /// configured gains (loaded once and then left alone).
    pub fn apply_startup_policy(&mut self, now_ms: u32, arm_state: ArmState) {
        let in_startup_window = now_ms > STARTUP_WINDOW_MS.0 && now_ms < STARTUP_WINDOW_MS.1;
        let zeroing_during_arming = self.settings.zero_during_arming && arm_state == ArmState::Arming;

        if in_startup_window || zeroing_during_arming {
            self.gains = HIGH_GAIN;
            self.init = false;
        } else if !self.init {
            self.gains = EffectiveGains {
                accel_kp: self.settings.accel_kp,
                accel_ki: self.settings.accel_ki,
                yaw_bias_rate: self.settings.yaw_bias_rate,
            };
            self.init = true;
        }
    }

    /// Runs one full cycle: acquisition/conditioning, then fusion/propagation.
    /// `gyro` is `None` to signal that the gyro channel timed out this cycle.
    pub fn step<A: AccelFifo>(
        &mut self,
        now_ms: u32,
        gyro: Option<GyroSample>,
        accel_fifo: &mut A,
    ) -> Result<(AttitudeRaw, AttitudeOutput), AttitudeError> {
        let raw = self.update_sensors(gyro, accel_fifo)?;
        let output = self.update_attitude(now_ms, &raw);
        Ok((raw, output))
    }

    fn update_sensors<A: AccelFifo>(
        &mut self,
        gyro: Option<GyroSample>,
        accel_fifo: &mut A,
    ) -> Result<AttitudeRaw, AttitudeError> {
        let gyro = gyro.ok_or(AttitudeError::SensorTimeout)?;
        if accel_fifo.fifo_elements() == 0 {
            return Err(AttitudeError::AccelEmpty);
        }

        let gain = self.settings.gyro_gain;
        let mut gyros = Vec3::new(
            -(gyro.raw.x - GYRO_NEUTRAL) * gain,
            (gyro.raw.y - GYRO_NEUTRAL) * gain,
            -(gyro.raw.z - GYRO_NEUTRAL) * gain,
        );

        let mut x = 0i32;
        let mut y = 0i32;
        let mut z = 0i32;
        let mut samples_remaining: usize = 0;
        let mut sample_count: u32 = 0;
        loop {
            let (ax, ay, az) = accel_fifo.read();
            sample_count += 1;
            x += ax as i32;
            y += -(ay as i32);
            z += -(az as i32);
            samples_remaining = accel_fifo.fifo_elements();
            if sample_count >= FIFO_DRAIN_CAP || samples_remaining == 0 {
                break;
            }
        }
        let n = sample_count as f32;
        let accel_avg = Vec3::new(x as f32 / n, y as f32 / n, z as f32 / n);

        let mut accels = accel_avg;
        if self.board.rotate {
            accels = rot_mult(&self.board.r, &accel_avg);
            gyros = rot_mult(&self.board.r, &gyros);
        }

        accels = Vec3::new(
            (accels.x - self.settings.accel_bias.x) * ACCEL_LSB_SCALE * GRAVITY,
            (accels.y - self.settings.accel_bias.y) * ACCEL_LSB_SCALE * GRAVITY,
            (accels.z - self.settings.accel_bias.z) * ACCEL_LSB_SCALE * GRAVITY,
        );

        if self.settings.bias_correct_gyro {
            gyros = gyros.add(&self.gyro_bias);
        }

        // Weak pull of the Z-gyro mean toward zero. Uses this cycle's
        // already-bias-corrected gz, so the correction term feeds back on
        // itself — preserved from the original firmware rather than fixed.
        self.gyro_bias.z -= gyros.z * self.gains.yaw_bias_rate;

        Ok(AttitudeRaw {
            accels,
            gyros,
            samples_remaining: samples_remaining as u8,
            sample_count: sample_count as u8,
        })
    }

    fn update_attitude(&mut self, now_ms: u32, raw: &AttitudeRaw) -> AttitudeOutput {
        let dt = if now_ms == self.last_tick {
            0.001
        } else {
            now_ms.wrapping_sub(self.last_tick) as f32 / 1000.0
        };
        self.last_tick = now_ms;

        let mut gyro = raw.gyros;
        let q = self.q;

        // Body-frame "down" predicted by the current quaternion.
        let grot = Vec3::new(
            -(2.0 * (q.x * q.z - q.w * q.y)),
            -(2.0 * (q.y * q.z + q.w * q.x)),
            -(q.w * q.w - q.x * q.x - q.y * q.y + q.z * q.z),
        );

        let mut accel_err = cross(&raw.accels, &grot);
        // Not a true angle unless both operands are unit length — `accels`
        // is in m/s², not normalized. Kept as-is; see DESIGN.md.
        let error_phi = raw.accels.dot(&grot).acos();
        let accel_err_mag = accel_err.norm();
        if accel_err_mag > 0.0 {
            accel_err = accel_err.scale(error_phi / accel_err_mag);
        }

        let accel_mag = raw.accels.norm();
        if accel_mag <= REJECT_LOW || accel_mag > REJECT_HIGH {
            accel_err = Vec3::ZERO;
        } else {
            let displacement = (REJECT_LOW / accel_mag).acos();
            let length = accel_err.norm();
            if length > 0.0 {
                accel_err = accel_err.sub(&accel_err.scale(displacement / length));
            }
        }

        // Yaw bias is not touched here; only the weak pull in update_sensors
        // corrects it.
        self.gyro_bias.x += accel_err.x * self.gains.accel_ki;
        self.gyro_bias.y += accel_err.y * self.gains.accel_ki;

        gyro.x += accel_err.x * self.gains.accel_kp / dt;
        gyro.y += accel_err.y * self.gains.accel_kp / dt;
        gyro.z += accel_err.z * self.gains.accel_kp / dt;

        // deg/s -> rad/s and the 1/2 from the quaternion kinematics, combined.
        let s = dt * core::f32::consts::PI / 360.0;
        let qdot_w = (-q.x * gyro.x - q.y * gyro.y - q.z * gyro.z) * s;
        let qdot_x = (q.w * gyro.x - q.z * gyro.y + q.y * gyro.z) * s;
        let qdot_y = (q.z * gyro.x + q.w * gyro.y - q.x * gyro.z) * s;
        let qdot_z = (-q.y * gyro.x + q.x * gyro.y + q.w * gyro.z) * s;

        let mut next = Quaternion {
            w: q.w + qdot_w,
            x: q.x + qdot_x,
            y: q.y + qdot_y,
            z: q.z + qdot_z,
        };
        if next.w < 0.0 {
            next = Quaternion { w: -next.w, x: -next.x, y: -next.y, z: -next.z };
        }

        let qmag = next.norm();
        let next = if qmag < REINIT_THRESHOLD || qmag.is_nan() {
            Quaternion::IDENTITY
        } else {
            Quaternion { w: next.w / qmag, x: next.x / qmag, y: next.y / qmag, z: next.z / qmag }
        };
        self.q = next;

        let rpy = quat_to_rpy(&next);
        AttitudeOutput { q: next, roll_deg: rpy.x, pitch_deg: rpy.y, yaw_deg: rpy.z }
    }
}

impl Default for AttitudeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AttitudeSettings;

    /// In-memory accel FIFO for tests: a fixed-size `Vec` of raw counts.
    struct MockAccelFifo {
        samples: std::collections::VecDeque<(i16, i16, i16)>,
    }

    impl MockAccelFifo {
        fn repeating(sample: (i16, i16, i16), count: usize) -> Self {
            Self { samples: core::iter::repeat(sample).take(count).collect() }
        }

        fn empty() -> Self {
            Self { samples: std::collections::VecDeque::new() }
        }
    }

    impl AccelFifo for MockAccelFifo {
        fn fifo_elements(&self) -> usize {
            self.samples.len()
        }

        fn read(&mut self) -> (i16, i16, i16) {
            self.samples.pop_front().unwrap_or((0, 0, 0))
        }
    }

    fn gyro(x: f32, y: f32, z: f32) -> Option<GyroSample> {
        Some(GyroSample { temperature: 0.0, raw: Vec3::new(x, y, z) })
    }

    fn tuned_settings() -> AttitudeSettings {
        AttitudeSettings {
            accel_kp: 0.2,
            accel_ki: 0.002,
            yaw_bias_rate: 0.01,
            gyro_gain: 0.42,
            ..AttitudeSettings::default()
        }
    }

    fn past_startup(est: &mut AttitudeEstimator) {
        // Drive the startup policy once from well beyond the high-gain
        // window so the estimator locks in the user's configured gains.
        est.apply_startup_policy(8000, ArmState::Disarmed);
    }

    #[test]
    fn quaternion_norm_and_hemisphere_invariants_hold_after_many_cycles() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        let mut now = 8000u32;
        for _ in 0..4000 {
            now += UPDATE_PERIOD_MS;
            let mut fifo = MockAccelFifo::repeating((0, 0, 250), 4); // ~9.81 m/s^2 on Z
            let g = gyro(GYRO_NEUTRAL, GYRO_NEUTRAL, GYRO_NEUTRAL); // zero rate
            let (_, out) = est.step(now, g, &mut fifo).expect("cycle should succeed");
            assert!(out.q.norm() >= 0.999 && out.q.norm() <= 1.001);
            assert!(out.q.w >= 0.0);
        }
    }

    #[test]
    fn rest_attitude_converges_to_identity() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        let mut now = 8000u32;
        let mut out = None;
        for _ in 0..4000 {
            // 8s at 500 Hz
            now += UPDATE_PERIOD_MS;
            let mut fifo = MockAccelFifo::repeating((0, 0, 250), 4);
            let g = gyro(GYRO_NEUTRAL, GYRO_NEUTRAL, GYRO_NEUTRAL);
            out = Some(est.step(now, g, &mut fifo).unwrap().1);
        }
        let out = out.unwrap();
        assert!(out.roll_deg.abs() < 1.0, "roll={}", out.roll_deg);
        assert!(out.pitch_deg.abs() < 1.0, "pitch={}", out.pitch_deg);
    }

    #[test]
    fn roll_90_converges_from_accel_only() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        // Accel = (0, +9.81, 0) raw counts -> raw.y = 9.81/(0.004*9.81) = 250
        let mut now = 8000u32;
        let mut out = None;
        for _ in 0..4000 {
            now += UPDATE_PERIOD_MS;
            let mut fifo = MockAccelFifo::repeating((0, -250, 0), 4); // y is negated on accumulation
            let g = gyro(GYRO_NEUTRAL, GYRO_NEUTRAL, GYRO_NEUTRAL);
            out = Some(est.step(now, g, &mut fifo).unwrap().1);
        }
        let out = out.unwrap();
        assert!(out.pitch_deg.abs() < 2.0, "pitch={}", out.pitch_deg);
        assert!((out.roll_deg.abs() - 90.0).abs() < 1.0, "roll={}", out.roll_deg);
    }

    #[test]
    fn extreme_accel_zeros_error_and_only_integrates_gyro() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        // |a| = 20 m/s^2 > 14.7 rejection ceiling.
        let raw = AttitudeRaw {
            accels: Vec3::new(0.0, 0.0, 20.0),
            gyros: Vec3::new(0.0, 0.0, 0.0),
            samples_remaining: 0,
            sample_count: 4,
        };
        let before = est.gyro_bias();
        let _ = est.update_attitude(8002, &raw);
        let after = est.gyro_bias();
        assert_eq!(before.x, after.x);
        assert_eq!(before.y, after.y);
    }

    #[test]
    fn linear_acceleration_in_band_is_attenuated_not_zeroed() {
        // Accel purely on the Y axis is perpendicular to `grot = (0,0,-1)`
        // at q = identity: the cross product is nonzero (exercises the
        // rejection branch for real, unlike a Z-axis vector which is
        // collinear with `grot` and makes `cross` trivially zero regardless
        // of the magnitude logic) and `accels . grot == 0`, which keeps the
        // unnormalized `acos` in the gravity-reference error well inside its
        // [-1, 1] domain instead of producing NaN.
        fn bias_shift_for(mag: f32) -> f32 {
            let mut est = AttitudeEstimator::new();
            est.apply_settings(tuned_settings());
            past_startup(&mut est);
            let raw = AttitudeRaw {
                accels: Vec3::new(0.0, mag, 0.0),
                gyros: Vec3::ZERO,
                samples_remaining: 0,
                sample_count: 4,
            };
            let before = est.gyro_bias();
            let _ = est.update_attitude(8002, &raw);
            let after = est.gyro_bias();
            (after.x - before.x).abs()
        }

        // Near the rejection floor: displacement = acos(9.8/9.85) is small,
        // so the error is shrunk only slightly (near full strength).
        let moved_near_floor = bias_shift_for(9.85);
        // Well inside the band: displacement = acos(9.8/12.5) is much
        // larger, so more of the error is subtracted away.
        let moved_mid_band = bias_shift_for(12.5);

        assert!(moved_mid_band > 0.0, "mid-band correction should not be zeroed: {moved_mid_band}");
        assert!(
            moved_mid_band < moved_near_floor,
            "correction deeper in the band ({moved_mid_band}) should be more attenuated than near the floor ({moved_near_floor})"
        );
    }

    #[test]
    fn gyro_bias_converges_toward_injected_constant_bias() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        // Inject a constant +2 deg/s bias on X by offsetting the raw gyro
        // counts away from neutral while accel stays at rest.
        let injected_bias_dps = 2.0f32;
        let raw_offset = injected_bias_dps / tuned_settings().gyro_gain;

        let mut now = 8000u32;
        for _ in 0..15000 {
            // 30s at 500 Hz
            now += UPDATE_PERIOD_MS;
            let mut fifo = MockAccelFifo::repeating((0, 0, 250), 4);
            let g = gyro(GYRO_NEUTRAL - raw_offset, GYRO_NEUTRAL, GYRO_NEUTRAL);
            let _ = est.step(now, g, &mut fifo).unwrap();
        }

        // The filter should have learned a bias correction that cancels
        // most of the injected offset (gyro_bias.x converges toward
        // -injected_bias_dps so gyros.x ends up near zero after correction).
        let bias = est.gyro_bias();
        let err = (bias.x - (-injected_bias_dps)).abs() / injected_bias_dps;
        assert!(err < 0.05, "gyro_bias.x={} err={}", bias.x, err);
    }

    #[test]
    fn dt_zero_uses_fallback_and_does_not_panic() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        let raw = AttitudeRaw { accels: Vec3::new(0.0, 0.0, 9.81), gyros: Vec3::ZERO, samples_remaining: 0, sample_count: 4 };
        let _ = est.update_attitude(100, &raw);
        let out = est.update_attitude(100, &raw); // same tick -> dt = 0.001
        assert!(out.q.norm().is_finite());
    }

    #[test]
    fn accel_magnitude_boundaries_match_rejection_window() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        // `(0, 0, mag)` is collinear with `grot = (0,0,-1)` at q = identity,
        // so `cross(accels, grot)` is the zero vector regardless of `mag` —
        // this would "pass" even with the REJECT_LOW/REJECT_HIGH checks
        // deleted. Put the magnitude on the Y axis instead so the cross
        // product is nonzero and the magnitude gate is what's actually
        // zeroing the error.
        //
        // 14.7 sits exactly on the computed `1.5 * 9.8` ceiling, where the
        // code's strict `>` does not zero the error (it falls into the
        // attenuation branch), so the "clearly rejected" high case is
        // tested comfortably past the ceiling instead of exactly on it.
        for &mag in &[9.8f32, 15.2f32] {
            let raw = AttitudeRaw { accels: Vec3::new(0.0, mag, 0.0), gyros: Vec3::ZERO, samples_remaining: 0, sample_count: 4 };
            let before = est.gyro_bias();
            let _ = est.update_attitude(200, &raw);
            let after = est.gyro_bias();
            assert_eq!(before.x, after.x, "mag={mag} should zero the error");
            assert_eq!(before.y, after.y, "mag={mag} should zero the error");
        }
    }

    #[test]
    fn gyro_timeout_skips_fusion_and_leaves_quaternion_unchanged() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        let mut fifo = MockAccelFifo::repeating((0, 0, 250), 4);
        let q_before = est.quaternion();
        let err = est.step(100, None, &mut fifo).unwrap_err();
        assert_eq!(err, AttitudeError::SensorTimeout);
        assert_eq!(est.quaternion(), q_before);
    }

    #[test]
    fn accel_empty_fails_without_touching_quaternion() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());
        past_startup(&mut est);

        let mut fifo = MockAccelFifo::empty();
        let q_before = est.quaternion();
        let g = gyro(GYRO_NEUTRAL, GYRO_NEUTRAL, GYRO_NEUTRAL);
        let err = est.step(100, g, &mut fifo).unwrap_err();
        assert_eq!(err, AttitudeError::AccelEmpty);
        assert_eq!(est.quaternion(), q_before);
    }

    #[test]
    fn board_rotation_transforms_raw_output_before_fusion() {
        let mut est = AttitudeEstimator::new();
        let mut settings = tuned_settings();
        settings.board_rotation_rpy = Vec3::new(0.0, 0.0, 90.0);
        est.apply_settings(settings);
        past_startup(&mut est);

        // Sensor-frame accel (9.81, 0, 0) raw counts: x=250, y=0, z=0.
        let mut fifo = MockAccelFifo::repeating((250, 0, 0), 4);
        let g = gyro(GYRO_NEUTRAL, GYRO_NEUTRAL, GYRO_NEUTRAL);
        let (raw, _) = est.step(100, g, &mut fifo).unwrap();

        assert!((raw.accels.x).abs() < 0.5, "accels.x={}", raw.accels.x);
        assert!((raw.accels.y - 9.81).abs() < 0.5, "accels.y={}", raw.accels.y);
    }

    #[test]
    fn startup_policy_forces_high_gain_in_window_then_locks_user_gains() {
        let mut est = AttitudeEstimator::new();
        est.apply_settings(tuned_settings());

        est.apply_startup_policy(500, ArmState::Disarmed); // before window: user gains lock in immediately
        assert_eq!(est.gains.accel_kp, tuned_settings().accel_kp);

        let mut est2 = AttitudeEstimator::new();
        est2.apply_settings(tuned_settings());
        est2.apply_startup_policy(4000, ArmState::Disarmed); // inside window
        assert_eq!(est2.gains, HIGH_GAIN);

        est2.apply_startup_policy(8000, ArmState::Disarmed); // past window, not yet locked
        assert_eq!(est2.gains.accel_kp, tuned_settings().accel_kp);

        // Subsequent calls must not relapse into high gain even though we
        // pass a tick back inside the numeric window, because `init` is
        // now latched.
        est2.apply_startup_policy(4000, ArmState::Disarmed);
        assert_eq!(est2.gains.accel_kp, tuned_settings().accel_kp);
    }

    #[test]
    fn zero_during_arming_forces_high_gain_while_arming() {
        let mut est = AttitudeEstimator::new();
        let mut settings = tuned_settings();
        settings.zero_during_arming = true;
        est.apply_settings(settings);

        est.apply_startup_policy(8000, ArmState::Arming);
        assert_eq!(est.gains, HIGH_GAIN);

        est.apply_startup_policy(8000, ArmState::Disarmed);
        assert_eq!(est.gains.accel_kp, tuned_settings().accel_kp);
    }

    #[test]
    fn apply_settings_reseeds_gyro_bias_from_persisted_value() {
        let mut est = AttitudeEstimator::new();
        let mut settings = tuned_settings();
        settings.gyro_bias_seed = Vec3::new(150.0, -200.0, 0.0);
        est.apply_settings(settings);

        let bias = est.gyro_bias();
        assert!((bias.x - 1.5).abs() < 1e-6);
        assert!((bias.y - (-2.0)).abs() < 1e-6);
    }
}
