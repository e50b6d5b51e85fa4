use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BusError, Result};

/// sysfs class directory listing UIO devices.
pub const UIO_CLASS_ROOT: &str = "/sys/class/uio";

/// Directory holding the UIO device special files.
pub const DEV_ROOT: &str = "/dev";

/// A UIO device entry: its node name, its sysfs name, and its device file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Directory entry under the class root, e.g. `uio0`.
    pub node: String,
    /// Contents of `<node>/name` with the trailing newline removed.
    pub name: String,
    /// Device special file to open and map, e.g. `/dev/uio0`.
    pub path: PathBuf,
}

/// Find the register device named `logical_name` under the standard roots.
pub fn discover(logical_name: &str) -> Result<DeviceHandle> {
    discover_in(UIO_CLASS_ROOT, DEV_ROOT, logical_name)
}

/// Find the first device, in node-name order, whose name equals `logical_name`.
///
/// The comparison is exact and case-sensitive after stripping one trailing
/// newline; any other control characters must match too.
pub fn discover_in(
    sysfs_root: impl AsRef<Path>,
    dev_root: impl AsRef<Path>,
    logical_name: &str,
) -> Result<DeviceHandle> {
    let sysfs_root = sysfs_root.as_ref();
    let candidates =
        enumerate_in(sysfs_root, dev_root).map_err(|e| BusError::DeviceNotFound {
            name: logical_name.to_string(),
            source: Some(e),
        })?;

    let found = candidates
        .into_iter()
        .find(|candidate| candidate.name == logical_name)
        .ok_or_else(|| BusError::DeviceNotFound {
            name: logical_name.to_string(),
            source: None,
        })?;

    info!(node = %found.node, path = ?found.path, name = %found.name, "register device discovered");
    Ok(found)
}

/// List every readable UIO device under `sysfs_root`, sorted by node name.
///
/// Hidden entries are skipped, as are entries whose `name` file cannot be read.
pub fn enumerate_in(
    sysfs_root: impl AsRef<Path>,
    dev_root: impl AsRef<Path>,
) -> io::Result<Vec<DeviceHandle>> {
    let sysfs_root = sysfs_root.as_ref();
    let dev_root = dev_root.as_ref();

    let mut nodes: Vec<String> = fs::read_dir(sysfs_root)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|node| !node.starts_with('.'))
        .collect();
    nodes.sort();

    let mut devices = Vec::with_capacity(nodes.len());
    for node in nodes {
        let name_path = sysfs_root.join(&node).join("name");
        let raw = match fs::read_to_string(&name_path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = ?name_path, %err, "skipping unreadable uio entry");
                continue;
            }
        };
        devices.push(DeviceHandle {
            name: normalize_name(&raw).to_string(),
            path: dev_root.join(&node),
            node,
        });
    }

    Ok(devices)
}

fn normalize_name(raw: &str) -> &str {
    raw.strip_suffix('\n').unwrap_or(raw)
}
