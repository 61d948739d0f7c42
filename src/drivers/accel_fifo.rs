//! Ring-buffer backed accelerometer FIFO shared between the IMU sampling
//! task (producer) and the estimator task (consumer), in the same spirit as
//! the fixed-capacity channels used elsewhere in this firmware — except the
//! estimator needs to drain several entries per cycle and average them, not
//! just take the newest one.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;

use attitude_estimator::AccelFifo;

/// Matches the estimator's own per-cycle drain cap, so the buffer can never
/// accumulate more than one cycle's worth of backlog.
pub const ACCEL_FIFO_DEPTH: usize = 32;

/// Backing storage, placed in a `'static` so both tasks can reference it
/// without an owning struct being passed between them.
pub struct AccelFifoStorage<const N: usize> {
    queue: Mutex<CriticalSectionRawMutex, RefCell<Deque<(i16, i16, i16), N>>>,
}

impl<const N: usize> AccelFifoStorage<N> {
    pub const fn new() -> Self {
        Self { queue: Mutex::new(RefCell::new(Deque::new())) }
    }

    /// Pushes a new sample, dropping the oldest one if the buffer is full.
    pub fn push(&self, sample: (i16, i16, i16)) {
        self.queue.lock(|cell| {
            let mut q = cell.borrow_mut();
            if q.is_full() {
                q.pop_front();
            }
            let _ = q.push_back(sample);
        });
    }

    pub fn handle(&'static self) -> SharedAccelFifo<N> {
        SharedAccelFifo { storage: self }
    }
}

/// Consumer-side handle implementing the core crate's `AccelFifo` trait.
pub struct SharedAccelFifo<const N: usize> {
    storage: &'static AccelFifoStorage<N>,
}

impl<const N: usize> AccelFifo for SharedAccelFifo<N> {
    fn fifo_elements(&self) -> usize {
        self.storage.queue.lock(|cell| cell.borrow().len())
    }

    fn read(&mut self) -> (i16, i16, i16) {
        self.storage.queue.lock(|cell| cell.borrow_mut().pop_front().unwrap_or((0, 0, 0)))
    }
}
