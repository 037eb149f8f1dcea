//! Loopback Demo - FIFO end-to-end dalam satu proses
//!
//! Walkthrough protokol lengkap tanpa perlu dua terminal: handshake,
//! transfer berurutan, wraparound, dan readiness queries.
//!
//! Run dengan: cargo run --release --example loopback

use shmfifo::{ConsumerFifo, ProducerFifo};

fn main() {
    let name = format!("shmfifo_loopback_{}", std::process::id());

    println!("🚀 shmfifo loopback demo\n");

    // Producer dulu - membuat segment + semaphore, post readiness
    let mut producer = ProducerFifo::open(&name, 16);
    println!("producer open: {} bytes mapped", producer.mapped_len());

    // Consumer attach - tx sudah di-post jadi tidak block di sini
    let mut consumer = ConsumerFifo::open(&name, 16);
    println!("consumer open: {} bytes mapped\n", consumer.mapped_len());

    // Belum ada write yang melatch attach, belum ada data
    println!("ready_for_writing (pre-latch): {}", producer.is_ready_for_writing());
    println!("ready_for_reading (empty):     {}\n", consumer.is_ready_for_reading());

    // Transfer pertama - write ini mengonsumsi consumer-readiness signal
    producer.write(b"0123456789");
    println!("wrote 10 bytes, occupancy = {}", producer.occupancy());

    let mut head = [0u8; 4];
    consumer.read(&mut head);
    println!("read  4 bytes: {:?}, occupancy = {}", std::str::from_utf8(&head).unwrap(), consumer.occupancy());

    // Write kedua wrap melewati akhir ring 16-byte
    producer.write(b"ABCDEFGHIJ");
    println!("wrote 10 bytes (wrapped), occupancy = {}", producer.occupancy());

    let mut rest = [0u8; 16];
    consumer.read(&mut rest);
    println!("read 16 bytes: {:?}", std::str::from_utf8(&rest).unwrap());

    println!("\nready_for_writing: {}", producer.is_ready_for_writing());
    println!("ready_for_reading: {}", consumer.is_ready_for_reading());

    // Drop: consumer close saja; producer juga unlink shm + semaphores
    drop(consumer);
    drop(producer);

    println!("\n✅ Loopback complete");
}
