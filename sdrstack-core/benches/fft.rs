use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sdrstack_core::context::DspContext;
use sdrstack_core::dsp::fft::magnitude_spectrum_db;
use sdrstack_core::logging::SignalLogger;

fn test_samples(n: usize) -> (Vec<f32>, Vec<f32>) {
    let i: Vec<f32> = (0..n).map(|k| (k as f32 * 0.01).sin()).collect();
    let q: Vec<f32> = (0..n).map(|k| (k as f32 * 0.01).cos()).collect();
    (i, q)
}

fn benchmark_magnitude_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("magnitude_spectrum_db");
    for size in [1024usize, 4096, 8192, 16384] {
        let (i, q) = test_samples(size);
        let ctx = DspContext::new();
        let mut logger = SignalLogger::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                black_box(magnitude_spectrum_db(black_box(&i), black_box(&q), size, &ctx, &mut logger).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_magnitude_spectrum);
criterion_main!(benches);
