//! Integration tests untuk handshake ordering, backpressure blocking,
//! dan round trip antar proses sungguhan (fork).
//!
//! Catatan kontrak: capacity mismatch antara producer dan consumer
//! adalah pelanggaran precondition yang TIDAK dideteksi - kedua sisi
//! me-map ukuran berbeda dari object yang sama dan cursor mereka
//! desinkron secara diam-diam. Itu undefined behavior by design
//! (didokumentasikan, tidak "diperbaiki"), jadi tidak ada test yang
//! mengeksekusinya.
//!
//! Run dengan: cargo test --test process_roundtrip

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use shmfifo::{ConsumerFifo, ProducerFifo};

fn unique_name(tag: &str) -> String {
    format!("shmfifo_it_{}_{}", std::process::id(), tag)
}

/// Consumer-open yang dipanggil sebelum producer-open harus block
/// sampai producer selesai inisialisasi.
#[test]
fn consumer_open_blocks_until_producer_open() {
    let name = unique_name("hs_consumer_first");
    let (opened_tx, opened_rx) = mpsc::channel();

    let consumer_name = name.clone();
    let consumer_thread = thread::spawn(move || {
        let consumer = ConsumerFifo::open(&consumer_name, 64);
        opened_tx.send(()).unwrap();
        consumer
    });

    // Tanpa producer, consumer-open harus masih menunggu
    thread::sleep(Duration::from_millis(100));
    assert!(
        opened_rx.try_recv().is_err(),
        "consumer open returned before producer open"
    );

    let producer = ProducerFifo::open(&name, 64);

    opened_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("consumer open did not complete after producer open");
    let consumer = consumer_thread.join().unwrap();

    drop(consumer);
    drop(producer);
}

/// Write pertama producer harus block sampai consumer attach, bahkan
/// jika dipanggil langsung setelah producer-open return.
#[test]
fn first_write_blocks_until_consumer_attach() {
    let name = unique_name("hs_first_write");
    let (wrote_tx, wrote_rx) = mpsc::channel();

    let mut producer = ProducerFifo::open(&name, 64);

    let writer_thread = thread::spawn(move || {
        producer.write(&[7u8; 8]);
        wrote_tx.send(()).unwrap();
        producer
    });

    thread::sleep(Duration::from_millis(100));
    assert!(
        wrote_rx.try_recv().is_err(),
        "first write returned before consumer attached"
    );

    let mut consumer = ConsumerFifo::open(&name, 64);

    wrote_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first write did not complete after consumer attach");

    let mut buf = [0u8; 8];
    consumer.read(&mut buf);
    assert_eq!(buf, [7u8; 8]);

    let producer = writer_thread.join().unwrap();
    drop(consumer);
    drop(producer);
}

/// Write yang meminta lebih banyak ruang daripada yang tersedia harus
/// spin sampai read membebaskan ruang, lalu selesai penuh.
#[test]
fn write_blocks_under_backpressure() {
    let name = unique_name("backpressure");
    let (progress_tx, progress_rx) = mpsc::channel();

    let mut producer = ProducerFifo::open(&name, 8);
    let mut consumer = ConsumerFifo::open(&name, 8);

    let writer_thread = thread::spawn(move || {
        producer.write(&[1u8; 6]);
        progress_tx.send("first").unwrap();
        // Hanya 2 bytes bebas - harus spin sampai consumer membaca
        producer.write(&[2u8; 6]);
        progress_tx.send("second").unwrap();
        producer
    });

    assert_eq!(
        progress_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        "first"
    );

    // Write kedua tidak boleh selesai selama ruang belum cukup
    thread::sleep(Duration::from_millis(100));
    assert!(
        progress_rx.try_recv().is_err(),
        "write completed without enough free space"
    );

    let mut buf = [0u8; 6];
    consumer.read(&mut buf);
    assert_eq!(buf, [1u8; 6]);

    assert_eq!(
        progress_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        "second"
    );

    consumer.read(&mut buf);
    assert_eq!(buf, [2u8; 6]);

    let producer = writer_thread.join().unwrap();
    drop(consumer);
    drop(producer);
}

/// Round trip lewat dua proses OS sungguhan: parent producer, child
/// consumer. Child verifikasi pattern dan melapor lewat exit status.
#[test]
#[cfg(unix)]
fn two_process_round_trip() {
    const CAPACITY: usize = 4096;
    const CHUNK: usize = 1000; // bukan pembagi capacity - wraparound pasti terjadi
    const CHUNKS: usize = 512;

    let name = unique_name("fork");

    // SAFETY: child langsung menjalankan consumer loop dan exit,
    // tanpa menyentuh state thread lain dari test harness
    match unsafe { libc::fork() } {
        -1 => panic!("fork failed: {}", std::io::Error::last_os_error()),
        0 => {
            // Child: consumer. Jangan panic di sini - lapor via exit code.
            let mut fifo = ConsumerFifo::open(&name, CAPACITY);
            let mut chunk = [0u8; CHUNK];
            let mut offset = 0usize;
            for _ in 0..CHUNKS {
                fifo.read(&mut chunk);
                for (i, &b) in chunk.iter().enumerate() {
                    if b != ((offset + i) % 251) as u8 {
                        std::process::exit(2);
                    }
                }
                offset += CHUNK;
            }
            std::process::exit(0);
        }
        child => {
            let mut fifo = ProducerFifo::open(&name, CAPACITY);
            let mut chunk = [0u8; CHUNK];
            let mut offset = 0usize;
            for _ in 0..CHUNKS {
                for (i, b) in chunk.iter_mut().enumerate() {
                    *b = ((offset + i) % 251) as u8;
                }
                fifo.write(&chunk);
                offset += CHUNK;
            }

            let mut status = 0;
            // SAFETY: child adalah pid valid hasil fork di atas
            let waited = unsafe { libc::waitpid(child, &mut status, 0) };
            assert_eq!(waited, child, "waitpid failed");
            assert!(libc::WIFEXITED(status), "consumer child did not exit cleanly");
            assert_eq!(
                libc::WEXITSTATUS(status),
                0,
                "consumer child reported corrupt data"
            );
        }
    }
}
