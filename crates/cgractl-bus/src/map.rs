use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::config::BusConfig;
use crate::discovery::{discover_in, DeviceHandle};
use crate::error::{BusError, Result};

/// Register stride in bytes.
pub const WORD_SIZE: usize = 4;

/// Base addresses with a live mapping in this process.
static LIVE_BASES: Mutex<BTreeSet<u64>> = Mutex::new(BTreeSet::new());

/// Marks a base address as mapped until dropped.
struct LiveClaim(u64);

impl LiveClaim {
    fn acquire(base_address: u64) -> Result<Self> {
        let mut live = LIVE_BASES.lock().unwrap_or_else(|e| e.into_inner());
        if !live.insert(base_address) {
            return Err(BusError::AlreadyMapped { base_address });
        }
        Ok(Self(base_address))
    }
}

impl Drop for LiveClaim {
    fn drop(&mut self) {
        let mut live = LIVE_BASES.lock().unwrap_or_else(|e| e.into_inner());
        live.remove(&self.0);
    }
}

/// An exclusively owned read-write, shared mapping of a register window.
///
/// The window is unmapped on drop. Word accessors panic on an index past the
/// end of the window: that is a programming error, not a device failure.
pub struct RegisterMap {
    base: NonNull<u32>,
    len: usize,
    base_address: u64,
    path: PathBuf,
    _claim: LiveClaim,
}

// SAFETY: the mapping is owned by this value alone and MMIO words may be
// accessed from any thread.
unsafe impl Send for RegisterMap {}

impl RegisterMap {
    /// Discover the device named by `config` and map its window.
    pub fn open(config: &BusConfig) -> Result<Self> {
        let handle = discover_in(&config.sysfs_root, &config.dev_root, &config.device_name)?;
        Self::open_and_map(&handle, config.base_address, config.window_size)
    }

    /// Open a discovered device and map `window_size` bytes of its window.
    pub fn open_and_map(
        handle: &DeviceHandle,
        base_address: u64,
        window_size: u64,
    ) -> Result<Self> {
        Self::map_path(&handle.path, base_address, window_size)
    }

    /// Open `path` with synchronous semantics and map `window_size` bytes from
    /// offset 0 (UIO map 0). `base_address` identifies the window.
    ///
    /// The descriptor is closed before returning, on success and on failure.
    pub fn map_path(path: impl AsRef<Path>, base_address: u64, window_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = usize::try_from(window_size).map_err(|_| BusError::MapFailed {
            path: path.clone(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "window size exceeds the address space",
            ),
        })?;

        let claim = LiveClaim::acquire(base_address)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|e| BusError::MapFailed {
                path: path.clone(),
                source: e,
            })?;

        // SAFETY: a fresh shared mapping of an open descriptor; the kernel
        // validates `len` and the descriptor.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(BusError::MapFailed {
                path,
                source: io::Error::last_os_error(),
            });
        }

        // The mapping stays valid after the descriptor is closed.
        drop(file);

        let Some(base) = NonNull::new(addr.cast::<u32>()) else {
            return Err(BusError::MapFailed {
                path,
                source: io::Error::other("mmap returned a null mapping"),
            });
        };

        info!(
            ?path,
            base_address = format_args!("{base_address:#x}"),
            len,
            "register window mapped"
        );

        Ok(Self {
            base,
            len,
            base_address,
            path,
            _claim: claim,
        })
    }

    /// Read the 32-bit word at `index`.
    pub fn read_word(&self, index: usize) -> u32 {
        self.check_index(index);
        // SAFETY: `index` is inside the live mapping and word-aligned (mmap
        // returns page-aligned memory).
        unsafe { ptr::read_volatile(self.base.as_ptr().add(index)) }
    }

    /// Write the 32-bit word at `index`. The device may react to every write.
    pub fn write_word(&mut self, index: usize, value: u32) {
        self.check_index(index);
        debug!(index, value = format_args!("{value:#010x}"), "register write");
        // SAFETY: as in `read_word`; `&mut self` gives exclusive access.
        unsafe { ptr::write_volatile(self.base.as_ptr().add(index), value) }
    }

    /// Number of addressable words in the window.
    pub fn word_count(&self) -> usize {
        self.len / WORD_SIZE
    }

    /// Window size in bytes.
    pub fn window_size(&self) -> usize {
        self.len
    }

    /// Physical base address this window was mapped for.
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    /// Device file backing the mapping.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_index(&self, index: usize) {
        let in_bounds = index
            .checked_mul(WORD_SIZE)
            .and_then(|offset| offset.checked_add(WORD_SIZE))
            .is_some_and(|end| end <= self.len);
        assert!(
            in_bounds,
            "register index {index} outside window of {} words",
            self.word_count()
        );
    }
}

impl Drop for RegisterMap {
    fn drop(&mut self) {
        // SAFETY: `base`/`len` describe exactly the mapping created in `map_path`.
        let rc = unsafe { libc::munmap(self.base.as_ptr().cast(), self.len) };
        if rc == 0 {
            debug!(path = ?self.path, "register window unmapped");
        } else {
            debug!(path = ?self.path, err = %io::Error::last_os_error(), "munmap failed");
        }
    }
}

impl std::fmt::Debug for RegisterMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterMap")
            .field("path", &self.path)
            .field("base_address", &format_args!("{:#x}", self.base_address))
            .field("window_size", &self.len)
            .finish()
    }
}
