use embassy_executor::task;
use embassy_stm32::peripherals::SPI1;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Ticker};

use attitude_estimator::{GyroSample, Vec3};

use crate::drivers::accel_fifo::{AccelFifoStorage, ACCEL_FIFO_DEPTH};
use crate::drivers::icm42688::Icm42688;

/// Sampling rate feeding both the gyro mailbox and the accel FIFO — faster
/// than the estimator's own cycle so the FIFO has more than one entry to
/// average on each drain.
const SAMPLE_HZ: u64 = 1000;

#[task]
pub async fn imu_sampling_task(
    mut imu: Icm42688<'static, SPI1>,
    gyro_tx: Sender<'static, CriticalSectionRawMutex, GyroSample, 1>,
    accel_fifo: &'static AccelFifoStorage<ACCEL_FIFO_DEPTH>,
) {
    let mut ticker = Ticker::every(Duration::from_hz(SAMPLE_HZ));
    loop {
        ticker.next().await;

        let (accel, gyro) = match imu.read_all().await {
            Ok(v) => v,
            Err(_) => continue,
        };

        accel_fifo.push((accel[0], accel[1], accel[2]));

        let sample = GyroSample {
            temperature: 0.0,
            raw: Vec3::new(gyro[0] as f32, gyro[1] as f32, gyro[2] as f32),
        };
        // Non-blocking: the estimator task only ever wants the latest sample.
        let _ = gyro_tx.try_send(sample);
    }
}
