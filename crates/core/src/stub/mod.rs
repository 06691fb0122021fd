//! Stub identity pooling.

pub mod pool;

pub use pool::StubPool;
