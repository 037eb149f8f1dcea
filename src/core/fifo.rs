//! SPSC Shared-Memory FIFO - Producer/Consumer Handles
//!
//! Protokol:
//! - Startup: rendezvous dua arah lewat named semaphore (sekali saja)
//! - Steady state: satu atomic occupancy counter sebagai satu-satunya
//!   sinyal flow control, busy-wait polling tanpa backoff
//!
//! Counter double-serves: "free space" untuk writer, "available data"
//! untuk reader. Valid karena exactly one producer dan one consumer.
//!
//! Write dan read selalu whole-request: tidak pernah partial. Request
//! lebih besar dari capacity tidak pernah bisa terpenuhi dan akan spin
//! selamanya - kontrak caller, tidak dicek.

use std::io;
use std::process;
use std::ptr;
use std::sync::atomic::Ordering;

use super::rendezvous::Rendezvous;
use super::segment::SharedSegment;

const TX_SUFFIX: &str = "_tx";
const RX_SUFFIX: &str = "_rx";

/// Setup failure = misconfiguration yang unrecoverable (permission,
/// stale names, capacity mismatch). Log lalu terminate.
fn fatal(what: &str, err: io::Error) -> ! {
    eprintln!("shmfifo: fatal: {what}: {err}");
    process::exit(1);
}

/// Producer handle - membuat segment, menulis ke ring.
///
/// Drop melakukan teardown penuh: selain unmap dan close, producer juga
/// meng-unlink shm object dan kedua nama semaphore dari OS namespace.
pub struct ProducerFifo {
    segment: SharedSegment,
    tx: Rendezvous,
    rx: Rendezvous,
    // Write cursor lokal - tidak pernah shared antar proses
    cursor: usize,
    // Latched saat rx rendezvous pertama kali dikonsumsi
    consumer_attached: bool,
}

/// Consumer handle - attach ke segment yang ada, membaca dari ring.
///
/// Drop hanya unmap dan close handle - producer yang memiliki shared
/// resources, consumer tidak meng-unlink apa pun.
pub struct ConsumerFifo {
    segment: SharedSegment,
    // Kedua semaphore tetap dipegang sampai drop (close best-effort)
    _tx: Rendezvous,
    _rx: Rendezvous,
    cursor: usize,
}

impl ProducerFifo {
    /// Buat dan inisialisasi FIFO, lalu post producer-readiness signal.
    ///
    /// Harus dipanggil sebelum [`ConsumerFifo::open`] menyelesaikan
    /// handshake-nya. Kegagalan setup bersifat fatal: log + exit.
    ///
    /// Capacity harus identik dengan yang diberikan consumer, dan harus
    /// muat di occupancy counter (i64) - precondition caller.
    pub fn open(name: &str, capacity: usize) -> Self {
        let tx = Rendezvous::open(name, TX_SUFFIX)
            .unwrap_or_else(|e| fatal("open tx semaphore", e));
        let rx = Rendezvous::open(name, RX_SUFFIX)
            .unwrap_or_else(|e| fatal("open rx semaphore", e));

        let segment = SharedSegment::create(name, capacity)
            .unwrap_or_else(|e| fatal("create shared segment", e));

        // Init selesai - lepaskan consumer yang menunggu
        if let Err(e) = tx.post() {
            fatal("post producer readiness", e);
        }

        Self {
            segment,
            tx,
            rx,
            cursor: 0,
            consumer_attached: false,
        }
    }

    /// Tulis seluruh `src` ke ring. Return jumlah bytes yang ditulis
    /// (selalu `src.len()` - tidak pernah partial).
    ///
    /// Call pertama block sekali sampai consumer attach (latched).
    /// Setelah itu busy-wait sampai ruang cukup untuk seluruh request.
    pub fn write(&mut self, src: &[u8]) -> usize {
        if !self.consumer_attached {
            // Satu-satunya blocking wait di steady-state path, sekali saja
            if let Err(e) = self.rx.wait() {
                fatal("wait for consumer attach", e);
            }
            self.consumer_attached = true;
        }

        let n = src.len();
        let capacity = self.segment.capacity();

        // Spin sampai ruang cukup - atomic load polos, tanpa backoff
        loop {
            let count = self.segment.occupancy().load(Ordering::Acquire);
            assert!(
                count >= 0 && count <= capacity as i64,
                "fifo occupancy out of range: {count}"
            );
            let space = capacity - count as usize;
            if n <= space {
                break;
            }
        }

        // Copy dengan wraparound: maksimal dua segment (tail lalu head)
        let offset = self.cursor;
        let first = (capacity - offset).min(n);
        unsafe {
            let dst = self.segment.data_mut_ptr();
            ptr::copy_nonoverlapping(src.as_ptr(), dst.add(offset), first);
            if first < n {
                // Sisa masuk ke awal ring
                ptr::copy_nonoverlapping(src.as_ptr().add(first), dst, n - first);
            }
        }
        self.cursor = if offset + first >= capacity {
            n - first
        } else {
            offset + first
        };

        // Publication point: consumer tidak boleh melihat counter naik
        // sebelum bytes benar-benar berada di ring
        self.segment.occupancy().fetch_add(n as i64, Ordering::Release);

        n
    }

    /// Element-typed write: `items.len()` elemen `T` sebagai satu unit.
    /// Return jumlah elemen (selalu penuh).
    ///
    /// `T` harus plain-old-data (`#[repr(C)]` tanpa pointer/padding
    /// bermakna) - bytes di-transfer apa adanya.
    pub fn write_items<T: Copy>(&mut self, items: &[T]) -> usize {
        // SAFETY: T: Copy, dibaca sebagai raw bytes untuk transfer
        let bytes = unsafe {
            std::slice::from_raw_parts(items.as_ptr() as *const u8, std::mem::size_of_val(items))
        };
        self.write(bytes);
        items.len()
    }

    /// Non-blocking: true jika consumer sudah attach DAN masih ada
    /// ruang. Snapshot racy - bisa stale saat caller bertindak.
    #[inline(always)]
    pub fn is_ready_for_writing(&self) -> bool {
        if !self.consumer_attached {
            return false;
        }
        let count = self.segment.occupancy().load(Ordering::Acquire);
        (count as usize) < self.segment.capacity()
    }

    /// Bytes yang sedang berada dalam ring (snapshot).
    #[inline(always)]
    pub fn occupancy(&self) -> usize {
        self.segment.occupancy().load(Ordering::Acquire).max(0) as usize
    }

    /// Kapasitas ring dalam bytes.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.segment.capacity()
    }

    /// Total ukuran mapping (header + ring) - nilai yang sama dengan
    /// yang dilihat consumer.
    #[inline(always)]
    pub fn mapped_len(&self) -> usize {
        self.segment.mapped_len()
    }
}

impl Drop for ProducerFifo {
    fn drop(&mut self) {
        // Producer memiliki kernel-persistent resources: unlink semua
        // nama dari OS namespace. Error di-log, tidak fatal.
        if let Err(e) = self.segment.unlink() {
            eprintln!("shmfifo: shm_unlink failed: {e}");
        }
        if let Err(e) = self.tx.unlink() {
            eprintln!("shmfifo: sem_unlink {} failed: {e}", self.tx.name());
        }
        if let Err(e) = self.rx.unlink() {
            eprintln!("shmfifo: sem_unlink {} failed: {e}", self.rx.name());
        }
        // munmap + close fd + sem_close jalan lewat drop field
    }
}

impl ConsumerFifo {
    /// Attach ke FIFO yang dibuat producer.
    ///
    /// Block tanpa batas waktu sampai producer-readiness signal, map
    /// segment yang sudah ada, lalu post consumer-readiness signal.
    /// Boleh dipanggil sebelum [`ProducerFifo::open`] - akan menunggu.
    ///
    /// Capacity harus identik dengan milik producer. Mismatch adalah
    /// pelanggaran precondition yang tidak terdeteksi.
    pub fn open(name: &str, capacity: usize) -> Self {
        let tx = Rendezvous::open(name, TX_SUFFIX)
            .unwrap_or_else(|e| fatal("open tx semaphore", e));
        let rx = Rendezvous::open(name, RX_SUFFIX)
            .unwrap_or_else(|e| fatal("open rx semaphore", e));

        // Block sampai producer selesai inisialisasi
        if let Err(e) = tx.wait() {
            fatal("wait for producer readiness", e);
        }

        let segment = SharedSegment::attach(name, capacity)
            .unwrap_or_else(|e| fatal("attach shared segment", e));

        // Beri tahu producer bahwa consumer siap
        if let Err(e) = rx.post() {
            fatal("post consumer readiness", e);
        }

        Self {
            segment,
            _tx: tx,
            _rx: rx,
            cursor: 0,
        }
    }

    /// Baca tepat `dst.len()` bytes dari ring. Return jumlah bytes
    /// (selalu penuh - tidak pernah partial).
    ///
    /// Busy-wait sampai data cukup untuk seluruh request.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len();
        let capacity = self.segment.capacity();

        // Spin sampai data cukup
        loop {
            let count = self.segment.occupancy().load(Ordering::Acquire);
            assert!(
                count >= 0 && count <= capacity as i64,
                "fifo occupancy out of range: {count}"
            );
            if count as usize >= n {
                break;
            }
        }

        let offset = self.cursor;
        let first = (capacity - offset).min(n);
        unsafe {
            let src = self.segment.data_ptr();
            ptr::copy_nonoverlapping(src.add(offset), dst.as_mut_ptr(), first);
            if first < n {
                // Sisa diambil dari awal ring
                ptr::copy_nonoverlapping(src, dst.as_mut_ptr().add(first), n - first);
            }
        }
        self.cursor = if offset + first >= capacity {
            n - first
        } else {
            offset + first
        };

        // Counter turun hanya setelah copy selesai - producer tidak
        // boleh menimpa bytes yang belum selesai dibaca
        self.segment.occupancy().fetch_sub(n as i64, Ordering::Release);

        n
    }

    /// Element-typed read: isi seluruh `items`. Return jumlah elemen.
    ///
    /// `T` harus plain-old-data - bytes di-transfer apa adanya.
    pub fn read_items<T: Copy>(&mut self, items: &mut [T]) -> usize {
        let len = items.len();
        // SAFETY: T: Copy, diisi sebagai raw bytes dari ring
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(
                items.as_mut_ptr() as *mut u8,
                std::mem::size_of_val(items),
            )
        };
        self.read(bytes);
        len
    }

    /// Non-blocking: true jika ada data untuk dibaca. Snapshot racy.
    #[inline(always)]
    pub fn is_ready_for_reading(&self) -> bool {
        self.segment.occupancy().load(Ordering::Acquire) != 0
    }

    /// Bytes yang sedang berada dalam ring (snapshot).
    #[inline(always)]
    pub fn occupancy(&self) -> usize {
        self.segment.occupancy().load(Ordering::Acquire).max(0) as usize
    }

    /// Kapasitas ring dalam bytes.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.segment.capacity()
    }

    /// Total ukuran mapping (header + ring).
    #[inline(always)]
    pub fn mapped_len(&self) -> usize {
        self.segment.mapped_len()
    }
}

// Consumer tidak punya Drop sendiri: unmap + close fd + sem_close
// jalan lewat drop field. Tidak ada unlink - bukan pemilik.
