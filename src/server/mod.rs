//! The concurrency layer: readiness reactor and worker pool.

pub mod pool;
pub mod reactor;
