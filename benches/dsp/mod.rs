//! Benchmarks for the DSP units and their graph nodes.

mod ladder;
mod ms20;
mod oversampler;
mod wavefolder;

pub use ladder::bench_ladder;
pub use ms20::bench_ms20;
pub use oversampler::bench_oversampler;
pub use wavefolder::{bench_wavefolder, bench_westcoast};
