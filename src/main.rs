#![no_std]
#![no_main]

mod board;
mod drivers;
mod platform;
mod tasks;

use embassy_executor::Spawner;
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use attitude_estimator::{ArmState, AttitudeSettings, GyroSample};

use crate::board::Board;
use crate::drivers::accel_fifo::{AccelFifoStorage, ACCEL_FIFO_DEPTH};
use crate::drivers::icm42688::Icm42688;
use crate::tasks::estimator_task::estimator_task;
use crate::tasks::imu_sampling_task::imu_sampling_task;

// ── Shared mailboxes ───────────────────────────────────────────────────────
// Cap=1: the estimator always wants the LATEST gyro sample; older ones are
// dropped rather than queued.
static GYRO_CHAN: Channel<CriticalSectionRawMutex, GyroSample, 1> = Channel::new();

// "Last value wins" settings/flight-status mailboxes, applied atomically by
// the estimator task at the top of its own cycle.
static SETTINGS_SIGNAL: Signal<CriticalSectionRawMutex, AttitudeSettings> = Signal::new();
static ARM_SIGNAL: Signal<CriticalSectionRawMutex, ArmState> = Signal::new();

static ACCEL_FIFO: AccelFifoStorage<ACCEL_FIFO_DEPTH> = AccelFifoStorage::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. SPI1 @ 10 MHz — ICM-42688 IMU (SCK=PA5, MOSI=PA7, MISO=PA6, CS=PB12)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(10_000_000);
    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, NoDma, NoDma, spi_config);
    let cs_gyro = Output::new(p.PB12.degrade(), Level::High, Speed::VeryHigh);
    let mut imu = Icm42688::new(spi, cs_gyro);

    // Keep the flash chip off the shared SPI1 bus.
    let _flash_cs = board::deassert_flash_cs(p.PA4);

    // 3. Heartbeat LED (PC13)
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);

    // 4. IMU hardware init
    Timer::after(Duration::from_millis(100)).await;
    let _ = imu.init().await;

    // 5. Seed the estimator with its compiled-in defaults; later settings
    //    updates arrive over SETTINGS_SIGNAL from outside this binary.
    SETTINGS_SIGNAL.signal(AttitudeSettings::default());
    ARM_SIGNAL.signal(ArmState::Disarmed);

    // 6. Spawn tasks. `imu` owns its peripherals by value (not borrowed from
    //    `p`), so it's already 'static and can move into the task directly.
    spawner
        .spawn(imu_sampling_task(imu, GYRO_CHAN.sender(), &ACCEL_FIFO))
        .unwrap();

    spawner
        .spawn(estimator_task(
            ACCEL_FIFO.handle(),
            GYRO_CHAN.receiver(),
            &SETTINGS_SIGNAL,
            &ARM_SIGNAL,
        ))
        .unwrap();

    // 7. Main task: LED heartbeat @ 1 Hz
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
