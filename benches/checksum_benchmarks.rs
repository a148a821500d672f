//! Benchmarks for state checksumming
//!
//! These benchmarks measure:
//! - Hash computation for wells of growing connection count
//! - Hash chain operations
//! - Packing and unpacking overhead

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rsched::{
    bitwise_eq, pack, unpack, Connection, ConnectionState, CtfKind, CtfProperties, Direction, Order, StateHasher, Well,
};

fn create_well(num_connections: usize) -> Well {
    let mut well = Well::new("P1", "G1", 0, 0, None, "OIL", 0);
    let connections = well.connections_mut();
    connections.set_ordering(Order::Input);
    for k in 0..num_connections {
        connections.add(Connection::new(
            [0, 0, k],
            k,
            k as i32 + 1,
            2000.0 + k as f64,
            ConnectionState::Open,
            CtfProperties {
                CF: 1.0 + k as f64 * 0.01,
                Kh: 100.0,
                ..CtfProperties::default()
            },
            1,
            Direction::Z,
            CtfKind::DeckValue,
            k,
            true,
        ));
    }
    well
}

fn bench_hash_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_computation");

    for num_connections in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*num_connections as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_connections),
            num_connections,
            |b, &num_connections| {
                let well = create_well(num_connections);
                let hasher = StateHasher::new();
                b.iter(|| black_box(hasher.hash(&well)));
            },
        );
    }

    group.finish();
}

fn bench_hash_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_chain");
    let hasher = StateHasher::new();

    for chain_length in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*chain_length as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(chain_length),
            chain_length,
            |b, &chain_length| {
                let well = create_well(10);
                let hashes: Vec<_> = (0..chain_length).map(|_| hasher.hash(&well)).collect();
                b.iter(|| black_box(hasher.hash_chain(&hashes)));
            },
        );
    }

    group.finish();
}

fn bench_pack_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_unpack");

    for num_connections in [10, 100, 1000].iter() {
        let well = create_well(*num_connections);
        let bytes = pack(&well);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("pack", num_connections), &well, |b, well| {
            b.iter(|| black_box(pack(well)))
        });
        group.bench_with_input(BenchmarkId::new("unpack", num_connections), &bytes, |b, bytes| {
            b.iter(|| black_box(unpack::<Well>(bytes).unwrap()))
        });
    }

    group.finish();
}

fn bench_hash_vs_bitwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_vs_bitwise");

    let well1 = create_well(1000);
    let well2 = create_well(1000);
    let hasher = StateHasher::new();

    group.bench_function("hash_comparison", |b| {
        let hash1 = hasher.hash(&well1);
        let hash2 = hasher.hash(&well2);
        b.iter(|| black_box(hash1 == hash2));
    });

    group.bench_function("bitwise_equality", |b| {
        b.iter(|| black_box(bitwise_eq(&well1, &well2)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_hash_computation,
    bench_hash_chain,
    bench_pack_unpack,
    bench_hash_vs_bitwise
);
criterion_main!(benches);
