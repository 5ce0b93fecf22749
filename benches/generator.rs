use criterion::{Criterion, criterion_group, criterion_main};
use distributed_scaling_svg::config::Config;
use distributed_scaling_svg::layout::compute_layout;
use distributed_scaling_svg::render::generate;
use distributed_scaling_svg::timeline::build_timeline;
use distributed_scaling_svg::verify::{Expectations, verify_svg};
use std::hint::black_box;

fn bench_stages(c: &mut Criterion) {
    let config = Config::default();
    let expected = Expectations::from_scene(&config.scene);
    let svg = generate(&config).expect("default scene").svg;

    let mut group = c.benchmark_group("distributed_scaling");
    group.bench_function("layout", |b| {
        b.iter(|| compute_layout(black_box(&config.scene), black_box(&config.layout)))
    });
    group.bench_function("timeline", |b| {
        b.iter(|| {
            build_timeline(
                black_box(&config.scene),
                black_box(&config.theme),
                black_box(&config.animation),
            )
        })
    });
    group.bench_function("generate", |b| b.iter(|| generate(black_box(&config))));
    group.bench_function("verify", |b| b.iter(|| verify_svg(black_box(&svg), expected)));
    group.finish();
}

criterion_group!(benches, bench_stages);
criterion_main!(benches);
