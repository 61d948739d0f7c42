pub mod estimator_task;
pub mod imu_sampling_task;
