//! FIFO Producer Binary - Throughput Demo
//!
//! Proses producer: membuat named FIFO di shared memory, lalu stream
//! byte pattern deterministik yang diverifikasi oleh fifo_consumer.
//!
//! Jalankan producer dulu, lalu consumer dengan nama dan capacity yang
//! identik (kontrak handshake: producer-open sebelum consumer-open).
//!
//! Usage:
//!   cargo run --release --bin fifo_producer -- --name demo_fifo
//!   cargo run --release --bin fifo_consumer -- --name demo_fifo

use std::time::Instant;

use shmfifo::ProducerFifo;

/// Producer configuration
struct ProducerConfig {
    name: String,
    capacity: usize,
    total_bytes: usize,
    chunk_bytes: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            name: "shmfifo_demo".to_string(),
            capacity: 1 << 20,          // 1MB ring
            total_bytes: 256 << 20,     // 256MB stream
            chunk_bytes: 4096,
        }
    }
}

/// Pattern deterministik: byte ke-i dari stream = i mod 251.
/// 251 prima, jadi pattern tidak sinkron dengan ukuran chunk/ring.
#[inline(always)]
fn fill_pattern(buf: &mut [u8], stream_offset: usize) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = ((stream_offset + i) % 251) as u8;
    }
}

fn main() {
    let config = parse_args();

    println!("🚀 shmfifo producer");
    println!("  FIFO name:  {}", config.name);
    println!("  Capacity:   {} bytes", config.capacity);
    println!("  Stream:     {} MB", config.total_bytes >> 20);
    println!("  Chunk:      {} bytes\n", config.chunk_bytes);

    let mut fifo = ProducerFifo::open(&config.name, config.capacity);
    println!("  Mapped:     {} bytes (header + ring)", fifo.mapped_len());
    println!("⏳ Waiting for consumer to attach...\n");

    let mut chunk = vec![0u8; config.chunk_bytes];
    let mut sent = 0usize;

    // Write pertama block sampai consumer attach - timer mulai setelahnya
    fill_pattern(&mut chunk, 0);
    fifo.write(&chunk);
    sent += chunk.len();

    let start = Instant::now();
    while sent < config.total_bytes {
        let n = config.chunk_bytes.min(config.total_bytes - sent);
        fill_pattern(&mut chunk[..n], sent);
        fifo.write(&chunk[..n]);
        sent += n;
    }
    let elapsed = start.elapsed();

    let mb = (sent as f64) / (1024.0 * 1024.0);
    println!("✅ Stream complete");
    println!("  Sent:       {:.1} MB", mb);
    println!("  Duration:   {:.3}s", elapsed.as_secs_f64());
    println!("  Throughput: {:.1} MB/sec", mb / elapsed.as_secs_f64());
}

fn parse_args() -> ProducerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ProducerConfig::default();

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
                println!("shmfifo Producer - Shared-Memory Throughput Demo\n");
                println!("Usage: fifo_producer [OPTIONS]\n");
                println!("Options:");
                println!("  -n, --name <NAME>       FIFO name (default: shmfifo_demo)");
                println!("  -c, --capacity <BYTES>  Ring capacity (default: 1048576)");
                println!("  -b, --bytes <BYTES>     Total stream size (default: 256MB)");
                println!("      --chunk <BYTES>     Chunk size per write (default: 4096)");
                println!("      --help              Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}
