//! # Genesis Benchmarks
//!
//! | Operation | Scales with |
//! |-----------|-------------|
//! | Full testnet genesis | validator count |
//! | gentx verification | one signature |
//! | Invariant check | document size |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use genesis_builder::{invariants, TestnetGenesis, TestnetGenesisConfig};

fn bench_testnet_genesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("testnet-genesis");

    for validators in [1usize, 4, 16, 64] {
        let config = TestnetGenesisConfig {
            validators,
            ..TestnetGenesisConfig::default()
        };
        group.throughput(Throughput::Elements(validators as u64));
        group.bench_with_input(
            BenchmarkId::new("generate", validators),
            &config,
            |b, config| b.iter(|| black_box(TestnetGenesis::generate(config).map(|t| t.genesis.len()))),
        );
    }

    group.finish();
}

fn bench_gentx_verify(c: &mut Criterion) {
    let config = TestnetGenesisConfig::default();
    let codec = config.codec();
    let doc = match TestnetGenesis::generate(&config).and_then(|t| t.document(&codec)) {
        Ok(doc) => doc,
        Err(e) => panic!("genesis generation failed: {e}"),
    };
    let tx = &doc.genutil.gen_txs[0];

    c.bench_function("gentx-verify", |b| {
        b.iter(|| black_box(tx.verify(&codec, &doc.chain_id).is_ok()))
    });
}

fn bench_invariants(c: &mut Criterion) {
    let mut group = c.benchmark_group("invariants");

    for validators in [4usize, 64] {
        let config = TestnetGenesisConfig {
            validators,
            ..TestnetGenesisConfig::default()
        };
        let codec = config.codec();
        let doc = match TestnetGenesis::generate(&config).and_then(|t| t.document(&codec)) {
            Ok(doc) => doc,
            Err(e) => panic!("genesis generation failed: {e}"),
        };
        group.bench_with_input(BenchmarkId::new("check_all", validators), &doc, |b, doc| {
            b.iter(|| black_box(invariants::check_all(doc, &codec).is_ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_testnet_genesis, bench_gentx_verify, bench_invariants);
criterion_main!(benches);
