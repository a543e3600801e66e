//! Channel matrix generation benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cdl_channel::*;

fn endpoints() -> (Endpoint, Endpoint) {
    (
        Endpoint::new(1, Vector3::new(0.0, 0.0, 25.0)),
        Endpoint::new(2, Vector3::new(120.0, 40.0, 1.5)),
    )
}

fn benchmark_uma_4x16(c: &mut Criterion) {
    let mut model = ChannelModel::new(ModelConfig::new(Scenario::UrbanMacro, 3.5e9), 1).unwrap();
    let (a, b) = endpoints();
    let bs = UniformPlanarArray::new(4, 4);
    let ue = UniformPlanarArray::new(2, 2);
    let mut t = 0.0;

    c.bench_function("uma_nlos_16x4_generate", |bench| {
        bench.iter(|| {
            // A new time with the cache cleared forces a full realisation
            model.clear();
            t += 1.0;
            black_box(model.channel_matrix_at(&a, &b, &bs, &ue, ChannelCondition::nlos(), t).unwrap())
        })
    });
}

fn benchmark_umi_blockage(c: &mut Criterion) {
    let config = ModelConfig {
        blockage: true,
        update_period_s: 0.001,
        ..ModelConfig::new(Scenario::UrbanMicroStreetCanyon, 28e9)
    };
    let mut model = ChannelModel::new(config, 2).unwrap();
    let (a, b) = endpoints();
    let bs = UniformPlanarArray::new(8, 8);
    let ue = UniformPlanarArray::new(1, 2);
    let mut t = 0.0;

    c.bench_function("umi_los_blockage_64x2_update", |bench| {
        bench.iter(|| {
            t += 0.01;
            black_box(model.channel_matrix_at(&a, &b, &bs, &ue, ChannelCondition::los(), t).unwrap())
        })
    });
}

fn benchmark_cache_hit(c: &mut Criterion) {
    let mut model = ChannelModel::new(ModelConfig::new(Scenario::UrbanMacro, 3.5e9), 3).unwrap();
    let (a, b) = endpoints();
    let array = UniformPlanarArray::new(2, 2);
    model
        .channel_matrix_at(&a, &b, &array, &array, ChannelCondition::los(), 0.0)
        .unwrap();

    c.bench_function("cached_lookup", |bench| {
        bench.iter(|| black_box(model.channel_matrix_at(&a, &b, &array, &array, ChannelCondition::los(), 0.0).unwrap()))
    });
}

criterion_group!(benches, benchmark_uma_4x16, benchmark_umi_blockage, benchmark_cache_hit);
criterion_main!(benches);
