//! POSIX Shared Memory Segment untuk Zero-Copy IPC
//!
//! Satu region shared memory di-mmap ke kedua proses:
//! - Header: occupancy counter (atomic, offset 0)
//! - Data: raw byte ring buffer langsung setelah header
//!
//! Layout fixed setelah creation, tidak pernah di-resize.

use memmap2::{MmapMut, MmapOptions};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;
use std::sync::atomic::{AtomicI64, Ordering};

/// Ukuran header dalam bytes - hanya occupancy counter.
///
/// Fixed 64-bit supaya layout konsisten antar proses pada mesin yang sama.
pub const HEADER_SIZE: usize = std::mem::size_of::<AtomicI64>();

/// Mmap-backed shared segment: header + byte ring.
///
/// Dua typed view di-carve dari satu mapping:
/// - [`SharedSegment::occupancy`] - atomic counter view (offset 0)
/// - [`SharedSegment::data_ptr`] / [`SharedSegment::data_mut_ptr`] - byte ring view
///
/// Ownership mapping: shared dengan OS selama handle hidup, dilepas
/// sekali saat drop (munmap + close via RAII).
pub struct SharedSegment {
    name: CString,
    // File wrapper atas shm fd - close otomatis saat drop
    _file: File,
    mmap: MmapMut,
    capacity: usize,
}

impl SharedSegment {
    /// Membuat shared memory object baru (producer side).
    ///
    /// `shm_open(O_CREAT | O_RDWR)`, resize ke `HEADER_SIZE + capacity`,
    /// mmap, lalu zero-init occupancy counter.
    pub fn create(name: &str, capacity: usize) -> io::Result<Self> {
        let c_name = shm_name(name)?;
        let file = shm_open_fd(&c_name, libc::O_CREAT | libc::O_RDWR)?;

        let total = HEADER_SIZE + capacity;
        // ftruncate ke ukuran penuh - hanya producer yang resize
        file.set_len(total as u64)?;

        // SAFETY: fd valid dengan read/write permission, ukuran sudah di-set
        let mmap = unsafe { MmapOptions::new().len(total).map_mut(&file)? };

        let segment = Self {
            name: c_name,
            _file: file,
            mmap,
            capacity,
        };

        // FIFO mulai kosong
        segment.occupancy().store(0, Ordering::Release);

        Ok(segment)
    }

    /// Attach ke shared memory object yang sudah ada (consumer side).
    ///
    /// Tidak ada resize - producer sudah melakukannya. Caller harus memberi
    /// capacity yang identik dengan producer (precondition, tidak dicek).
    pub fn attach(name: &str, capacity: usize) -> io::Result<Self> {
        let c_name = shm_name(name)?;
        let file = shm_open_fd(&c_name, libc::O_RDWR)?;

        let total = HEADER_SIZE + capacity;

        // SAFETY: object sudah dibuat dan di-resize oleh producer
        let mmap = unsafe { MmapOptions::new().len(total).map_mut(&file)? };

        Ok(Self {
            name: c_name,
            _file: file,
            mmap,
            capacity,
        })
    }

    /// Atomic counter view - bytes yang sedang berada dalam ring.
    ///
    /// Satu-satunya nilai yang dimutasi oleh kedua proses.
    #[inline(always)]
    pub fn occupancy(&self) -> &AtomicI64 {
        // SAFETY: counter berada di offset 0, mapping minimal HEADER_SIZE
        // bytes, dan AtomicI64 boleh dimutasi lewat shared reference
        unsafe { &*(self.mmap.as_ptr() as *const AtomicI64) }
    }

    /// Byte ring view untuk read (consumer side).
    #[inline(always)]
    pub fn data_ptr(&self) -> *const u8 {
        // SAFETY: mapping berukuran HEADER_SIZE + capacity
        unsafe { self.mmap.as_ptr().add(HEADER_SIZE) }
    }

    /// Byte ring view untuk write (producer side).
    #[inline(always)]
    pub fn data_mut_ptr(&mut self) -> *mut u8 {
        // SAFETY: mapping berukuran HEADER_SIZE + capacity
        unsafe { self.mmap.as_mut_ptr().add(HEADER_SIZE) }
    }

    /// Kapasitas ring dalam bytes (tanpa header).
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total ukuran mapping (header + ring).
    #[inline(always)]
    pub fn mapped_len(&self) -> usize {
        self.mmap.len()
    }

    /// Hapus nama object dari OS namespace.
    ///
    /// Hanya producer yang memanggil ini - kernel-persistent resource
    /// harus di-reclaim oleh pemiliknya.
    pub fn unlink(&self) -> io::Result<()> {
        let status = unsafe { libc::shm_unlink(self.name.as_ptr()) };
        if status == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Validasi nama shm - harus bebas NUL byte.
fn shm_name(name: &str) -> io::Result<CString> {
    CString::new(name).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "shm name contains NUL byte")
    })
}

/// `shm_open` wrapper - fd dibungkus `File` supaya close otomatis.
fn shm_open_fd(name: &CString, oflag: libc::c_int) -> io::Result<File> {
    // SAFETY: name adalah CString valid, mode S_IRWXU seperti kontrak FIFO
    let fd = unsafe { libc::shm_open(name.as_ptr(), oflag, libc::S_IRWXU as libc::mode_t) };
    if fd == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fd baru dibuka, ownership dipindah ke File
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn unique_name(tag: &str) -> String {
        format!("shmfifo_seg_{}_{}", std::process::id(), tag)
    }

    #[test]
    fn test_create_attach_shared_counter() {
        let name = unique_name("counter");

        let creator = SharedSegment::create(&name, 4096).unwrap();
        assert_eq!(creator.mapped_len(), HEADER_SIZE + 4096);
        assert_eq!(creator.occupancy().load(Ordering::Acquire), 0);

        // Attach dari "proses" kedua - counter harus shared
        let opener = SharedSegment::attach(&name, 4096).unwrap();
        creator.occupancy().store(42, Ordering::Release);
        assert_eq!(opener.occupancy().load(Ordering::Acquire), 42);

        creator.unlink().unwrap();
    }

    #[test]
    fn test_data_region_shared() {
        let name = unique_name("data");

        let mut creator = SharedSegment::create(&name, 64).unwrap();
        let opener = SharedSegment::attach(&name, 64).unwrap();

        unsafe {
            std::ptr::copy_nonoverlapping(b"ping".as_ptr(), creator.data_mut_ptr(), 4);
            let mut out = [0u8; 4];
            std::ptr::copy_nonoverlapping(opener.data_ptr(), out.as_mut_ptr(), 4);
            assert_eq!(&out, b"ping");
        }

        creator.unlink().unwrap();
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(SharedSegment::create("bad\0name", 64).is_err());
    }
}
