//! Channel handoff benchmarks.
//!
//! Compares the crate's SPSC channel against `rtrb` for single-threaded
//! push/pop and for a two-thread transfer of a fixed batch of commands.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::thread;
use tandem_lob::{channel, Command, Order};

const BATCH: u64 = 100_000;

fn command(id: u64) -> Command {
    if id % 4 == 0 {
        Command::CancelOrder(id - 1)
    } else {
        Command::AddOrder(Order::buy(id, 10_000 + id % 64, 10))
    }
}

/// Benchmark: push then pop on one thread (no contention)
fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");

    group.bench_function("tandem", |b| {
        let (mut tx, mut rx) = channel::<Command>(1024);
        let mut id = 0u64;
        b.iter(|| {
            id += 1;
            let _ = tx.push(command(id));
            black_box(rx.pop())
        })
    });

    group.bench_function("rtrb", |b| {
        let (mut tx, mut rx) = rtrb::RingBuffer::<Command>::new(1024);
        let mut id = 0u64;
        b.iter(|| {
            id += 1;
            let _ = tx.push(command(id));
            black_box(rx.pop().ok())
        })
    });

    group.finish();
}

/// Benchmark: move a batch of commands from a producer thread to the caller
fn bench_cross_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_thread");
    group.throughput(Throughput::Elements(BATCH));

    for capacity in [64usize, 1024, 8192].iter() {
        group.bench_with_input(BenchmarkId::new("tandem", capacity), capacity, |b, &capacity| {
            b.iter(|| {
                let (mut tx, mut rx) = channel::<Command>(capacity);
                let producer = thread::spawn(move || {
                    for id in 1..=BATCH {
                        tx.push_spin(command(id));
                    }
                });

                let mut received = 0u64;
                while !rx.is_drained() {
                    match rx.pop() {
                        Some(cmd) => {
                            black_box(cmd);
                            received += 1;
                        }
                        None => std::hint::spin_loop(),
                    }
                }
                producer.join().unwrap();
                assert_eq!(received, BATCH);
            })
        });

        group.bench_with_input(BenchmarkId::new("rtrb", capacity), capacity, |b, &capacity| {
            b.iter(|| {
                let (mut tx, mut rx) = rtrb::RingBuffer::<Command>::new(capacity);
                let producer = thread::spawn(move || {
                    for id in 1..=BATCH {
                        let mut cmd = command(id);
                        loop {
                            match tx.push(cmd) {
                                Ok(()) => break,
                                Err(rtrb::PushError::Full(back)) => {
                                    cmd = back;
                                    std::hint::spin_loop();
                                }
                            }
                        }
                    }
                });

                let mut received = 0u64;
                while received < BATCH {
                    match rx.pop() {
                        Ok(cmd) => {
                            black_box(cmd);
                            received += 1;
                        }
                        Err(_) => std::hint::spin_loop(),
                    }
                }
                producer.join().unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_cross_thread);
criterion_main!(benches);
