use std::path::PathBuf;

use crate::discovery::{DEV_ROOT, UIO_CLASS_ROOT};

/// sysfs name the CGRA bitstream registers its UIO device under.
pub const DEFAULT_DEVICE_NAME: &str = "CGRA";

/// Physical base of the CGRA register window.
pub const DEFAULT_BASE_ADDRESS: u64 = 0x04_0000_0000;

/// Size of the CGRA register window in bytes.
pub const DEFAULT_WINDOW_SIZE: u64 = 0x01_0000_0000;

/// Where to look for the register device and how much of it to map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// UIO class directory to enumerate.
    pub sysfs_root: PathBuf,
    /// Directory holding the device special files.
    pub dev_root: PathBuf,
    /// Exact device name to match.
    pub device_name: String,
    /// Physical base address of the window.
    pub base_address: u64,
    /// Window size in bytes.
    pub window_size: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(UIO_CLASS_ROOT),
            dev_root: PathBuf::from(DEV_ROOT),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            base_address: DEFAULT_BASE_ADDRESS,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}
