use be_core::{BorderMode, Dims3, Volume};
use be_filter::{PreprocessConfig, gaussian_smooth, krcah_preprocess};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_slab(n: usize) -> Volume<f64> {
    let dims = Dims3::new(n, n, n);
    let mut data = vec![0.0f64; dims.len()];
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                if x.abs_diff(n / 2) <= 1 {
                    data[dims.index(x, y, z)] = 1000.0;
                }
            }
        }
    }
    Volume::from_vec(dims, data).expect("valid volume")
}

fn bench_gaussian_smooth(c: &mut Criterion) {
    let vol = build_slab(64);

    c.bench_function("gaussian_smooth_sigma1_64cubed", |b| {
        b.iter(|| {
            let out = gaussian_smooth(black_box(&vol), 1.0, BorderMode::Clamp)
                .expect("valid sigma");
            black_box(out.len());
        });
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let vol = build_slab(64);
    let cfg = PreprocessConfig::default();

    c.bench_function("krcah_preprocess_64cubed", |b| {
        b.iter(|| {
            let out = krcah_preprocess(black_box(&vol), black_box(&cfg)).expect("valid config");
            black_box(out.len());
        });
    });
}

criterion_group!(benches, bench_gaussian_smooth, bench_preprocess);
criterion_main!(benches);
