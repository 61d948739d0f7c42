//! Concrete `Watchdog`/`AlarmSink` implementations for the firmware binary.
//!
//! Both are thin wrappers over `'static` atomics, the same pattern the
//! firmware already uses for `TAB_MOTOR_DSHOT_CMD`: no mutex needed because
//! there is exactly one writer (the estimator task) and readers only ever
//! want the latest value.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use attitude_estimator::{AlarmSeverity, AlarmSink, Watchdog};

/// Set true once per estimator cycle; cleared by whoever supervises liveness
/// (currently nothing does — the hook exists for a future external watchdog
/// timer peripheral).
pub static ESTIMATOR_ALIVE: AtomicBool = AtomicBool::new(false);

/// Last alarm severity set by the estimator task.
pub static ESTIMATOR_ALARM: AtomicU8 = AtomicU8::new(AlarmSeverity::Critical as u8);

pub struct FlagWatchdog;

impl Watchdog for FlagWatchdog {
    fn pet(&mut self) {
        ESTIMATOR_ALIVE.store(true, Ordering::Relaxed);
    }
}

pub struct FlagAlarm;

impl AlarmSink for FlagAlarm {
    fn set(&mut self, severity: AlarmSeverity) {
        ESTIMATOR_ALARM.store(severity as u8, Ordering::Relaxed);
    }
}
