use std::path::PathBuf;

/// Errors that can occur while locating or mapping the register window.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// No UIO device carries the requested name, or the device class could
    /// not be enumerated at all.
    #[error("register device {name:?} not found")]
    DeviceNotFound {
        name: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The device node could not be opened or its window could not be mapped.
    #[error("failed to map {path}: {source}")]
    MapFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A mapping of this base address is already live in this process.
    #[error("register window at {base_address:#x} is already mapped")]
    AlreadyMapped { base_address: u64 },
}

pub type Result<T> = std::result::Result<T, BusError>;
