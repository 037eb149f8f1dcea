//! Criterion benchmark untuk shared-memory FIFO
//!
//! In-process loopback: producer dan consumer handle di proses yang
//! sama (handshake tetap lewat semaphore, counter tetap shared).
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shmfifo::{ConsumerFifo, ProducerFifo};

fn open_pair(tag: &str, capacity: usize) -> (ProducerFifo, ConsumerFifo) {
    let name = format!("shmfifo_bench_{}_{}", std::process::id(), tag);
    let producer = ProducerFifo::open(&name, capacity);
    let consumer = ConsumerFifo::open(&name, capacity);
    (producer, consumer)
}

fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");

    // Write+read cycle untuk beberapa ukuran chunk
    for chunk_size in [64usize, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*chunk_size as u64));
        group.bench_function(format!("write_read_{}", chunk_size), |b| {
            let (mut producer, mut consumer) = open_pair(&format!("cycle{}", chunk_size), 1 << 20);
            let src = vec![0xA5u8; *chunk_size];
            let mut dst = vec![0u8; *chunk_size];
            b.iter(|| {
                producer.write(black_box(&src));
                consumer.read(&mut dst);
                black_box(&dst);
            });
        });
    }

    group.finish();
}

fn bench_batch_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    // Burst writes lalu drain - wraparound terjadi terus menerus
    for batch in [16usize, 64, 128].iter() {
        const CHUNK: usize = 1024;
        group.throughput(Throughput::Bytes((batch * CHUNK) as u64));
        group.bench_function(format!("batch_{}x{}", batch, CHUNK), |b| {
            let (mut producer, mut consumer) = open_pair(&format!("batch{}", batch), 256 * 1024);
            let src = [0x5Au8; CHUNK];
            let mut dst = [0u8; CHUNK];
            b.iter(|| {
                for _ in 0..*batch {
                    producer.write(black_box(&src));
                    consumer.read(&mut dst);
                }
                black_box(&dst);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_batch_throughput);
criterion_main!(benches);
