//! Benchmarks for the oversampling wrapper alone.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use laika_dsp::dsp::oversampler::{Oversampled, Oversampler};
use laika_dsp::dsp::trig::fast_tanh;
use laika_dsp::SampleRate;

use crate::{ramp, BLOCK_SIZES, SAMPLE_RATE};

/// Cheapest useful stage, so the numbers are mostly interpolation + decimation.
struct Tanh;

impl Oversampled<1> for Tanh {
    fn set_sample_rate(&mut self, _sample_rate: SampleRate) {}

    fn tick(&mut self, input: f32) -> [f32; 1] {
        [fast_tanh(input)]
    }

    fn reset(&mut self) {}
}

fn run<const N: usize>(os: &mut Oversampler<Tanh, N, 1>, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = os.process(*sample)[0];
    }
}

pub fn bench_oversampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oversampler");
    let rate = SampleRate::new(SAMPLE_RATE).unwrap();

    for &size in BLOCK_SIZES {
        let input = ramp(size);

        let mut os2 = Oversampler::<_, 2, 1>::new(Tanh, rate);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("2x", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                run(&mut os2, black_box(&mut buffer));
            })
        });

        let mut os4 = Oversampler::<_, 4, 1>::new(Tanh, rate);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("4x", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                run(&mut os4, black_box(&mut buffer));
            })
        });

        let mut os8 = Oversampler::<_, 8, 1>::new(Tanh, rate);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("8x", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                run(&mut os8, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
