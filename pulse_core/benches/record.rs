use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pulse_core::{InstrumentDescriptor, LabelSet, Registry};
use std::sync::Arc;
use std::thread;

const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

fn bench_counter_add(c: &mut Criterion) {
    let registry = Registry::default();
    let counter = registry
        .register(InstrumentDescriptor::counter("requests_total").build())
        .unwrap();
    let labels = LabelSet::from([("method", "GET"), ("status", "200")]);

    c.bench_function("counter_add_existing_cell", |b| {
        b.iter(|| counter.add(black_box(1.0), &labels).unwrap())
    });
}

fn bench_histogram_record(c: &mut Criterion) {
    let registry = Registry::default();
    let histogram = registry
        .register(
            InstrumentDescriptor::histogram("request_duration")
                .boundaries(vec![10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0])
                .build(),
        )
        .unwrap();
    let labels = LabelSet::from([("endpoint", "/api/users")]);

    c.bench_function("histogram_record", |b| {
        let mut value = 0.0;
        b.iter(|| {
            value = (value + 37.0) % 2500.0;
            histogram.record(black_box(value), &labels).unwrap()
        })
    });
}

fn bench_contended_add(c: &mut Criterion) {
    let registry = Arc::new(Registry::default());
    let counter = registry
        .register(InstrumentDescriptor::counter("requests_total").build())
        .unwrap();

    c.bench_function("counter_add_4_threads_distinct_cells", |b| {
        b.iter(|| {
            let workers: Vec<_> = METHODS
                .iter()
                .map(|method| {
                    let counter = counter.clone();
                    let labels = LabelSet::from([("method", *method)]);
                    thread::spawn(move || {
                        for _ in 0..1_000 {
                            counter.add(1.0, &labels).unwrap();
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_counter_add,
    bench_histogram_record,
    bench_contended_add
);
criterion_main!(benches);
