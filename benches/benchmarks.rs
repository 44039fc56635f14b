use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use partyline::bus::{Event, EventBus};
use partyline::runtime::Runtime;
use partyline::{bind, Channel, Signal};

fn signal_write_benchmark(c: &mut Criterion) {
    Runtime::scope(|| {
        let signal: Signal<i32> = Signal::new(0);

        c.bench_function("signal_write", |b| {
            let mut i = 0;
            b.iter(|| {
                signal.set(black_box(i));
                i += 1;
            });
        });
    });
}

fn bind_unmount_benchmark(c: &mut Criterion) {
    let channel = Channel::new("bench", 0u64).unwrap();

    Runtime::scope(|| {
        c.bench_function("bind_unmount", |b| {
            b.iter(|| {
                let binding = channel.bind().unwrap();
                black_box(binding)
            });
        });
    });
}

fn bus_dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_dispatch");

    for listener_count in [1, 10, 100].iter() {
        let bus = EventBus::new();
        for _ in 0..*listener_count {
            bus.add_listener("tick", |event| {
                black_box(event.detail::<u64>());
            });
        }
        let event = Event::new("tick", 7u64);

        group.bench_with_input(
            BenchmarkId::from_parameter(listener_count),
            listener_count,
            |b, _| {
                b.iter(|| black_box(bus.dispatch(&event)));
            },
        );
    }
    group.finish();
}

fn shared_write_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_write");

    for subscriber_count in [1, 10, 100].iter() {
        Runtime::scope(|| {
            let (_writer, set) = bind("bench", 0usize).unwrap();
            // Half the subscribers listen on an unrelated key.
            let peers: Vec<_> = (0..*subscriber_count)
                .map(|n| {
                    let key = if n % 2 == 0 { "bench" } else { "other" };
                    bind(key, 0usize).unwrap()
                })
                .collect();

            group.bench_with_input(
                BenchmarkId::from_parameter(subscriber_count),
                subscriber_count,
                |b, _| {
                    let mut i = 0;
                    b.iter(|| {
                        set.set(black_box(i));
                        i += 1;
                    });
                },
            );
            drop(peers);
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    signal_write_benchmark,
    bind_unmount_benchmark,
    bus_dispatch_benchmark,
    shared_write_benchmark,
);
criterion_main!(benches);
