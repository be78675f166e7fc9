//! Benchmarks for the MS-20 style ZDF filter (8× oversampled).

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use laika_dsp::graph::{GraphNode, Modulatable, Ms20Node, Ms20Param, RenderCtx};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_ms20(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ms20");
    let ctx = RenderCtx::new(SAMPLE_RATE);

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        let mut node = Ms20Node::lowpass(SAMPLE_RATE).unwrap();
        node.apply_modulation(Ms20Param::Frequency, 0.5, 0.0);
        node.apply_modulation(Ms20Param::Peak, 0.7, 0.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Drive only changes the input gain, cost should match
        let mut node = Ms20Node::highpass(SAMPLE_RATE).unwrap();
        node.apply_modulation(Ms20Param::Frequency, 0.5, 0.0);
        node.apply_modulation(Ms20Param::Drive, 1.0, 0.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("highpass_driven", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
