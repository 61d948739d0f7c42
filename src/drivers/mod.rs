pub mod accel_fifo;
pub mod icm42688;
