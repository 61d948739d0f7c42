//! Portable core of the attitude estimator: linear algebra, settings,
//! capability interfaces, and the filter state machine itself. Built
//! `no_std` for firmware, and as an ordinary host crate under `cfg(test)`
//! so the filter math can be unit tested without a hardware HAL.
#![cfg_attr(not(test), no_std)]

pub mod capability;
pub mod estimator;
pub mod linalg;
pub mod settings;

pub use capability::{AccelFifo, AlarmSeverity, AlarmSink, ArmState, Watchdog};
pub use estimator::{
    AttitudeError, AttitudeEstimator, AttitudeOutput, AttitudeRaw, GyroSample, GYRO_TIMEOUT_MS,
    UPDATE_PERIOD_MS,
};
pub use linalg::{Mat3, Quaternion, Vec3};
pub use settings::{AttitudeSettings, BoardRotation};
