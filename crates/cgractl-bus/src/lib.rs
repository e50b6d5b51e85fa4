//! Memory-mapped register access to the FPGA fabric.
//!
//! The register window is exposed by a UIO device:
//! - [`discover`] finds the device node whose sysfs `name` matches exactly
//! - [`RegisterMap::open_and_map`] maps its window read-write, shared
//! - [`RegisterMap::open`] does both from a [`BusConfig`]
//! - [`RegisterMap::read_word`] / [`RegisterMap::write_word`] access 32-bit words
//!
//! A `RegisterMap` is an owned value. The only process-wide state is the set
//! of base addresses currently mapped, which keeps each window single-owner.

pub mod config;
pub mod discovery;
pub mod error;

#[cfg(unix)]
pub mod map;

pub use config::{BusConfig, DEFAULT_BASE_ADDRESS, DEFAULT_DEVICE_NAME, DEFAULT_WINDOW_SIZE};
pub use discovery::{
    discover, discover_in, enumerate_in, DeviceHandle, DEV_ROOT, UIO_CLASS_ROOT,
};
pub use error::{BusError, Result};

#[cfg(unix)]
pub use map::{RegisterMap, WORD_SIZE};
