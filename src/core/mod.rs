pub mod big_float;
pub mod color_map;
pub mod file_io;
pub mod image_utils;
pub mod scalar;
pub mod stopwatch;
pub mod viewport;
pub mod work_queue;
pub mod worker_pool;
