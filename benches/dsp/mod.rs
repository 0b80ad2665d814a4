//! Benchmarks for low-level DSP primitives.

mod filter;
mod shape;
mod splice;

pub use filter::bench_filter;
pub use shape::bench_shape;
pub use splice::bench_splice;
