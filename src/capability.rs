//! Capability interfaces for platform services the core estimator needs but
//! does not implement: watchdog ticking, alarm reporting, accelerometer FIFO
//! access, and flight-arming status. Concrete implementations live on the
//! binary side (`platform.rs`, `drivers/accel_fifo.rs`) where real hardware
//! registers or atomics are available.

/// Severity reported on the attitude alarm channel.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlarmSeverity {
    /// Normal operation.
    Clear,
    /// Sensor acquisition failed this cycle.
    Error,
    /// Waiting for the first accelerometer sample at boot; the estimator
    /// has not entered its main loop yet.
    Critical,
}

/// Where the estimator reports its alarm state.
pub trait AlarmSink {
    fn set(&mut self, severity: AlarmSeverity);
}

/// Pinged at least once per cycle so an external supervisor can detect a
/// wedged estimator task.
pub trait Watchdog {
    fn pet(&mut self);
}

/// Flight arming state, as delivered by the flight-status mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmState {
    Disarmed,
    Arming,
    Armed,
}

/// Non-blocking accelerometer FIFO. `fifo_elements` reports how many entries
/// are currently buffered; `read` pops the oldest one. Implementations must
/// not block — the estimator polls this once per cycle and gives up
/// immediately if it reports zero.
pub trait AccelFifo {
    fn fifo_elements(&self) -> usize;
    fn read(&mut self) -> (i16, i16, i16);
}
