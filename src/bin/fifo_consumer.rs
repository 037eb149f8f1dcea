//! FIFO Consumer Binary - Throughput + Integrity Check
//!
//! Proses consumer: attach ke named FIFO milik fifo_producer, baca
//! seluruh stream, dan verifikasi byte pattern deterministiknya.
//!
//! Nama, capacity, total bytes, dan chunk size HARUS identik dengan
//! producer - kedua sisi sepakat out-of-band, FIFO tidak framing.
//!
//! Usage:
//!   cargo run --release --bin fifo_consumer -- --name demo_fifo

use std::time::Instant;

use shmfifo::ConsumerFifo;

/// Consumer configuration - mirror dari sisi producer
struct ConsumerConfig {
    name: String,
    capacity: usize,
    total_bytes: usize,
    chunk_bytes: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            name: "shmfifo_demo".to_string(),
            capacity: 1 << 20,
            total_bytes: 256 << 20,
            chunk_bytes: 4096,
        }
    }
}

fn main() {
    let config = parse_args();

    println!("🚀 shmfifo consumer");
    println!("  FIFO name:  {}", config.name);
    println!("  Capacity:   {} bytes", config.capacity);
    println!("  Expect:     {} MB\n", config.total_bytes >> 20);
    println!("⏳ Waiting for producer...\n");

    let mut fifo = ConsumerFifo::open(&config.name, config.capacity);
    println!("  Mapped:     {} bytes (header + ring)", fifo.mapped_len());

    let mut chunk = vec![0u8; config.chunk_bytes];
    let mut received = 0usize;
    let mut corrupt = 0usize;

    let start = Instant::now();
    while received < config.total_bytes {
        let n = config.chunk_bytes.min(config.total_bytes - received);
        fifo.read(&mut chunk[..n]);

        // Verifikasi pattern: byte ke-i dari stream = i mod 251
        for (i, &b) in chunk[..n].iter().enumerate() {
            if b != ((received + i) % 251) as u8 {
                corrupt += 1;
            }
        }
        received += n;
    }
    let elapsed = start.elapsed();

    let mb = (received as f64) / (1024.0 * 1024.0);
    println!("✅ Stream complete");
    println!("  Received:   {:.1} MB", mb);
    println!("  Duration:   {:.3}s", elapsed.as_secs_f64());
    println!("  Throughput: {:.1} MB/sec", mb / elapsed.as_secs_f64());

    if corrupt > 0 {
        eprintln!("❌ Integrity check FAILED: {} corrupt bytes", corrupt);
        std::process::exit(1);
    }
    println!("  Integrity:  OK (every byte matched)");
}

fn parse_args() -> ConsumerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ConsumerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" | "-n" => {
                if i + 1 < args.len() {
                    config.name = args[i + 1].clone();
                    i += 1;
                }
            }
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    config.capacity = args[i + 1].parse().unwrap_or(1 << 20);
                    i += 1;
                }
            }
            "--bytes" | "-b" => {
                if i + 1 < args.len() {
                    config.total_bytes = args[i + 1].parse().unwrap_or(256 << 20);
                    i += 1;
                }
            }
            "--chunk" => {
                if i + 1 < args.len() {
                    config.chunk_bytes = args[i + 1].parse().unwrap_or(4096);
                    i += 1;
                }
            }
            "--help" => {
                println!("shmfifo Consumer - Shared-Memory Throughput Demo\n");
                println!("Usage: fifo_consumer [OPTIONS]\n");
                println!("Options:");
                println!("  -n, --name <NAME>       FIFO name (default: shmfifo_demo)");
                println!("  -c, --capacity <BYTES>  Ring capacity (default: 1048576)");
                println!("  -b, --bytes <BYTES>     Total stream size (default: 256MB)");
                println!("      --chunk <BYTES>     Chunk size per read (default: 4096)");
                println!("      --help              Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}
