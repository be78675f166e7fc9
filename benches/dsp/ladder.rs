//! Benchmarks for the diode-ladder filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use laika_dsp::config::DiodeVcfConfig;
use laika_dsp::dsp::{DiodeLadderFilter, Effect};
use laika_dsp::graph::{DiodeVcfNode, DiodeVcfParam, GraphNode, Modulatable, RenderCtx};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_ladder(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ladder");
    let ctx = RenderCtx::new(SAMPLE_RATE);

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        // Per-sample unit, host rate
        let mut filter = DiodeLadderFilter::new(SAMPLE_RATE).unwrap();
        filter.set_frequency(0.5);
        filter.set_resonance(8.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("low", size), &size, |b, _| {
            b.iter(|| {
                for (sample, &x) in buffer.iter_mut().zip(&input) {
                    filter.set_in(black_box(x));
                    filter.process();
                    *sample = filter.out();
                }
            })
        });

        // Per-sample unit, 2× oversampled
        let mut filter = DiodeLadderFilter::new(SAMPLE_RATE).unwrap();
        filter.set_low(false);
        filter.set_frequency(0.5);
        filter.set_resonance(8.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("hidef", size), &size, |b, _| {
            b.iter(|| {
                for (sample, &x) in buffer.iter_mut().zip(&input) {
                    filter.set_in(black_box(x));
                    filter.process();
                    *sample = filter.out();
                }
            })
        });

        // Knob moving every block forces a retune per block
        let mut node = DiodeVcfNode::new(SAMPLE_RATE, DiodeVcfConfig::default()).unwrap();
        let mut buffer = input.clone();
        let mut knob = 0.0f32;
        group.bench_with_input(BenchmarkId::new("node_sweep", size), &size, |b, _| {
            b.iter(|| {
                knob = (knob + 0.01).fract();
                node.apply_modulation(DiodeVcfParam::Frequency, knob, 0.0);
                buffer.copy_from_slice(&input);
                node.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
