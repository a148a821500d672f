//! Benchmarks for schedule processing
//!
//! These benchmarks measure:
//! - Keyword processing for decks of growing size
//! - Parallel building of independent schedules

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rsched::{CartesianGrid, Deck, DeckItem, DeckKeyword, DeckRecord, Schedule, ScheduleBuilder};

fn builder() -> ScheduleBuilder {
    Schedule::builder()
        .with_start(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        .with_grid(Arc::new(CartesianGrid::new(20, 20, 10)))
}

/// A deck defining `num_wells` wells followed by `num_steps` report steps
fn create_deck(num_wells: usize, num_steps: usize) -> Deck {
    let mut keywords = Vec::new();
    for w in 0..num_wells {
        let name = format!("W{}", w);
        let i = (w % 20) as i32 + 1;
        let j = (w / 20 % 20) as i32 + 1;
        keywords.push(DeckKeyword::new(
            "WELSPECS",
            vec![DeckRecord::new(vec![
                DeckItem::string("WELL", name.as_str()),
                DeckItem::string("GROUP", "G1"),
                DeckItem::int("HEAD_I", i),
                DeckItem::int("HEAD_J", j),
            ])],
        ));
        keywords.push(DeckKeyword::new(
            "COMPDAT",
            vec![DeckRecord::new(vec![
                DeckItem::string("WELL", name.as_str()),
                DeckItem::int("K1", 1),
                DeckItem::int("K2", 10),
                DeckItem::double("CONNECTION_TRANSMISSIBILITY_FACTOR", 5.0),
            ])],
        ));
    }
    for step in 0..num_steps {
        keywords.push(DeckKeyword::new(
            "NUPCOL",
            vec![DeckRecord::new(vec![DeckItem::int("NUM_ITER", (step % 10) as i32 + 1)])],
        ));
        keywords.push(DeckKeyword::new(
            "TSTEP",
            vec![DeckRecord::new(vec![
                DeckItem::doubles("STEP_SIZE", &[30.0]).with_si_factor(86400.0)
            ])],
        ));
    }
    Deck::new(keywords)
}

fn bench_process_deck(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_deck");

    for num_steps in [10, 100, 500].iter() {
        let deck = create_deck(50, *num_steps);
        group.throughput(Throughput::Elements(deck.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_steps), &deck, |b, deck| {
            b.iter(|| black_box(builder().build(deck).unwrap()))
        });
    }

    group.finish();
}

fn bench_build_independent(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_independent");

    let decks: Vec<Deck> = (0..8).map(|_| create_deck(50, 100)).collect();
    let builder = builder();

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(builder.build_independent(&decks)))
    });

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let schedules: Vec<_> = decks.iter().map(|deck| builder.clone().build(deck)).collect();
            black_box(schedules)
        })
    });

    group.finish();
}

fn bench_timeline_hash_chain(c: &mut Criterion) {
    let schedule = builder().build(&create_deck(50, 100)).unwrap();
    c.bench_function("timeline_hash_chain", |b| {
        b.iter(|| black_box(schedule.timeline().hash_chain()))
    });
}

criterion_group!(
    benches,
    bench_process_deck,
    bench_build_independent,
    bench_timeline_hash_chain
);
criterion_main!(benches);
