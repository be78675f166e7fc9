//! Benchmarks for the wavefolders and the complex shaper node.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use laika_dsp::config::WestcoastMode;
use laika_dsp::dsp::{LockhartWavefolder, SergeWavefolder, Wavefolder};
use laika_dsp::graph::{GraphNode, Modulatable, RenderCtx, WestcoastNode, WestcoastParam};

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

fn fold(folder: &mut dyn Wavefolder, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        folder.set_in(*sample);
        folder.process();
        *sample = folder.out();
    }
}

pub fn bench_wavefolder(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavefolder");

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        // Lockhart runs a Wright omega solve per stage per sub-sample
        let mut lockhart = LockhartWavefolder::new(SAMPLE_RATE).unwrap();
        lockhart.set_gain(6.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lockhart", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                fold(&mut lockhart, black_box(&mut buffer));
            })
        });

        let mut serge = SergeWavefolder::new(SAMPLE_RATE).unwrap();
        serge.set_gain(6.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("serge", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                fold(&mut serge, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

pub fn bench_westcoast(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/westcoast");
    let ctx = RenderCtx::new(SAMPLE_RATE);

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        for mode in [
            WestcoastMode::Lockhart,
            WestcoastMode::Serge,
            WestcoastMode::Overdrive,
        ] {
            let mut node = WestcoastNode::with_mode(SAMPLE_RATE, mode).unwrap();
            node.apply_modulation(WestcoastParam::Gain, 6.0, 0.0);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(mode.name(), size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    node.render_block(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
