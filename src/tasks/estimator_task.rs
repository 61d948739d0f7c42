use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Instant, Ticker, Timer};

use attitude_estimator::{
    AccelFifo, AlarmSeverity, AlarmSink, ArmState, AttitudeError, AttitudeEstimator,
    AttitudeSettings, GyroSample, Watchdog, GYRO_TIMEOUT_MS, UPDATE_PERIOD_MS,
};

use crate::drivers::accel_fifo::{SharedAccelFifo, ACCEL_FIFO_DEPTH};
use crate::platform::{FlagAlarm, FlagWatchdog};

/// Runs the filter at its nominal rate, applying any pending settings or
/// arm-state update atomically at the top of the cycle, then the startup
/// gain schedule, then one full sensor/fusion step.
#[embassy_executor::task]
pub async fn estimator_task(
    mut accel_fifo: SharedAccelFifo<ACCEL_FIFO_DEPTH>,
    gyro_rx: Receiver<'static, CriticalSectionRawMutex, GyroSample, 1>,
    settings_signal: &'static Signal<CriticalSectionRawMutex, AttitudeSettings>,
    arm_signal: &'static Signal<CriticalSectionRawMutex, ArmState>,
) {
    let mut estimator = AttitudeEstimator::new();
    let mut watchdog = FlagWatchdog;
    let mut alarm = FlagAlarm;
    let mut arm_state = ArmState::Disarmed;

    alarm.set(AlarmSeverity::Critical);

    // Boot gate: the original firmware spins here
    // (`while (PIOS_ADXL345_FifoElements() == 0) { AlarmsSet(...CRITICAL);
    // PIOS_WDG_UpdateFlag(...); }`) rather than entering the main loop with
    // no accel data to average. Pet the watchdog on every poll so this wait
    // itself can't starve it.
    while accel_fifo.fifo_elements() == 0 {
        watchdog.pet();
        Timer::after(Duration::from_millis(UPDATE_PERIOD_MS as u64)).await;
    }

    let boot = Instant::now();
    let mut ticker = Ticker::every(Duration::from_millis(UPDATE_PERIOD_MS as u64));

    loop {
        ticker.next().await;

        if let Some(settings) = settings_signal.try_take() {
            estimator.apply_settings(settings);
        }
        if let Some(state) = arm_signal.try_take() {
            arm_state = state;
        }

        let now_ms = Instant::now().duration_since(boot).as_millis() as u32;
        estimator.apply_startup_policy(now_ms, arm_state);

        let gyro = with_timeout(Duration::from_millis(GYRO_TIMEOUT_MS as u64), gyro_rx.receive())
            .await
            .ok();

        // The watchdog is pinged unconditionally once per cycle, whether or
        // not this cycle's fusion step succeeds.
        watchdog.pet();

        match estimator.step(now_ms, gyro, &mut accel_fifo) {
            Ok((raw, output)) => {
                alarm.set(AlarmSeverity::Clear);
                defmt::trace!(
                    "attitude roll={} pitch={} yaw={} samples={}",
                    output.roll_deg,
                    output.pitch_deg,
                    output.yaw_deg,
                    raw.sample_count,
                );
            }
            // AccelEmpty is routine (e.g. the sampling task hasn't produced
            // a new entry this cycle yet) and leaves the alarm untouched;
            // only a gyro-channel timeout escalates to Error.
            Err(AttitudeError::SensorTimeout) => {
                alarm.set(AlarmSeverity::Error);
                defmt::warn!("estimator cycle failed: sensor timeout");
            }
            Err(AttitudeError::AccelEmpty) => {
                defmt::trace!("estimator cycle skipped: accel fifo empty");
            }
        }
    }
}
