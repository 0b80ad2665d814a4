//! Full engine benchmarks.
//!
//! These run whole blocks through `ShaperEngine`, from the default single
//! level stage up to a chain where every stage is active.

mod chain;

pub use chain::bench_chain;
