//! Core module: Shared-Memory SPSC FIFO
//!
//! Prinsip desain:
//! - Zero-Copy setup: satu mmap shared antar proses, tidak ada kernel
//!   channel (pipe/socket) di data path
//! - Lock-Free steady state: satu atomic counter, tidak ada Mutex
//! - Blocking hanya saat handshake: sekali per proses

mod fifo;
mod rendezvous;
mod segment;

pub use fifo::{ConsumerFifo, ProducerFifo};
pub use rendezvous::Rendezvous;
pub use segment::{SharedSegment, HEADER_SIZE};
