//! One-Shot Rendezvous via Named POSIX Semaphore
//!
//! Dipakai hanya untuk startup handshake: satu post dan satu wait per
//! proses per instance. Setelah rendezvous selesai, flow control
//! sepenuhnya lewat occupancy counter - semaphore tidak disentuh lagi.

use std::ffi::CString;
use std::io;

/// Named semaphore dengan semantik create-if-absent, initial value 0.
///
/// Kedua proses membuka dengan `O_CREAT` supaya urutan pembukaan kedua
/// semaphore tidak menjadi race - siapa pun yang pertama akan membuatnya.
pub struct Rendezvous {
    name: CString,
    sem: *mut libc::sem_t,
}

// SAFETY: handle dipakai oleh satu pemilik, boleh dipindah antar thread.
// Tidak Sync - sem_t pointer tidak untuk dipakai bersamaan.
unsafe impl Send for Rendezvous {}

impl Rendezvous {
    /// Buka (atau buat) semaphore bernama `/{base}{suffix}`, initial 0.
    pub fn open(base: &str, suffix: &str) -> io::Result<Self> {
        let name = CString::new(format!("/{base}{suffix}")).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "semaphore name contains NUL byte")
        })?;

        // SAFETY: name valid, mode S_IRWXU, initial value 0 (consumer akan wait)
        let sem = unsafe {
            libc::sem_open(
                name.as_ptr(),
                libc::O_CREAT,
                libc::S_IRWXU as libc::c_uint,
                0u32,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { name, sem })
    }

    /// Signal readiness ke proses lawan.
    pub fn post(&self) -> io::Result<()> {
        // SAFETY: sem valid selama handle hidup
        let status = unsafe { libc::sem_post(self.sem) };
        if status == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Block sampai proses lawan melakukan post.
    ///
    /// Tidak ada timeout dan tidak bisa di-cancel - sesuai kontrak
    /// handshake. EINTR di-retry.
    pub fn wait(&self) -> io::Result<()> {
        loop {
            // SAFETY: sem valid selama handle hidup
            let status = unsafe { libc::sem_wait(self.sem) };
            if status == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Hapus nama semaphore dari OS namespace (producer teardown).
    pub fn unlink(&self) -> io::Result<()> {
        let status = unsafe { libc::sem_unlink(self.name.as_ptr()) };
        if status == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Nama lengkap semaphore (untuk diagnostics).
    pub fn name(&self) -> &str {
        // Nama dibuat dari &str valid, selalu UTF-8
        self.name.to_str().unwrap_or("<invalid>")
    }
}

impl Drop for Rendezvous {
    fn drop(&mut self) {
        // SAFETY: sem belum pernah di-close sebelumnya
        let status = unsafe { libc::sem_close(self.sem) };
        if status == -1 {
            eprintln!(
                "shmfifo: sem_close {} failed: {}",
                self.name(),
                io::Error::last_os_error()
            );
        }
    }
}
