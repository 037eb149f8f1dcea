//! shmfifo - Shared-Memory SPSC FIFO
//!
//! Fixed-capacity circular byte buffer di shared memory antara dua
//! proses OS yang tidak berkerabat: satu producer, satu consumer.
//! Untuk transfer unidirectional high-throughput / low-latency di mana
//! pipe atau socket menambah copy/syscall overhead yang tidak perlu.
//!
//! Arsitektur:
//! - Satu segment mmap: atomic occupancy counter + byte ring
//! - Handshake sekali lewat dua named semaphore (producer ready / consumer ready)
//! - Steady state: busy-wait polling pada counter, tanpa blocking syscall
//!
//! # Usage
//!
//! Proses producer:
//!
//! ```no_run
//! use shmfifo::ProducerFifo;
//!
//! let mut fifo = ProducerFifo::open("my_fifo", 1 << 20);
//! fifo.write(b"payload"); // block sampai consumer attach + ruang cukup
//! ```
//!
//! Proses consumer (nama dan capacity HARUS identik):
//!
//! ```no_run
//! use shmfifo::ConsumerFifo;
//!
//! let mut fifo = ConsumerFifo::open("my_fifo", 1 << 20);
//! let mut buf = [0u8; 7];
//! fifo.read(&mut buf); // block sampai data cukup
//! ```
//!
//! Kedua sisi harus sepakat out-of-band soal urutan dan ukuran call -
//! FIFO tidak melakukan framing. SPSC saja: lebih dari satu producer
//! atau consumer tidak didukung.

pub mod core;

pub use crate::core::{ConsumerFifo, ProducerFifo, HEADER_SIZE};
