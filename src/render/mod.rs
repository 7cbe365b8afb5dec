pub mod engine;
pub mod job;
pub mod pool;
