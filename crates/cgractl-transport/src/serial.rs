use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::{read_full, write_once, Link};

/// Serial device the custom CPU's UART bridge enumerates as.
pub const DEFAULT_SERIAL_PATH: &str = "/dev/ttyUSB2";

/// Line rate of the remote unit.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial line configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line rate in bits per second. Frame format is always 8N1.
    pub baud_rate: u32,
    /// Upper bound on a single `read_exact`. `None` blocks until the bytes
    /// arrive or the channel fails.
    pub read_timeout: Option<Duration>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: None,
        }
    }
}

/// A tty opened in raw 8N1 mode.
///
/// Configuration is applied in full before the handle is returned; a device
/// that cannot be configured is closed and never handed out. The link closes
/// itself after any failed transfer.
pub struct SerialLink {
    file: Option<File>,
    path: PathBuf,
    config: SerialConfig,
}

impl SerialLink {
    /// Open `path` at `baud_rate` with no read timeout.
    pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(
            path,
            SerialConfig {
                baud_rate,
                ..SerialConfig::default()
            },
        )
    }

    /// Open `path` with explicit configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_to_speed(config.baud_rate)
            .ok_or(TransportError::UnsupportedBaud(config.baud_rate))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|e| TransportError::OpenFailed {
                path: path.clone(),
                source: e,
            })?;

        // `file` is dropped (closed) on the error path.
        configure_raw(&file, speed).map_err(|e| TransportError::Configure {
            path: path.clone(),
            source: e,
        })?;

        info!(?path, baud = config.baud_rate, "serial link configured (8N1, raw)");

        Ok(Self {
            file: Some(file),
            path,
            config,
        })
    }

    /// Write all of `bytes` in one transfer.
    pub fn write_exact(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(TransportError::Closed)?;
        let result = write_once(file, bytes);
        self.close_on_error(result)
    }

    /// Block until exactly `buf.len()` bytes have been read.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(TransportError::Closed)?;
        let result = match self.config.read_timeout {
            None => read_full(file, buf),
            Some(timeout) => {
                let mut reader = DeadlineReader {
                    file,
                    deadline: Instant::now() + timeout,
                };
                read_full(&mut reader, buf)
            }
        };
        self.close_on_error(result)
    }

    /// Change the read timeout for subsequent reads.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.config.read_timeout = timeout;
    }

    /// Whether the link can still carry traffic.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// The device path this link was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current line configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Release the device.
    pub fn close(mut self) {
        self.release();
    }

    fn close_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            debug!(path = ?self.path, %err, "closing serial link after failed transfer");
            self.release();
        }
        result
    }

    fn release(&mut self) {
        if self.file.take().is_some() {
            debug!(path = ?self.path, "serial link closed");
        }
    }
}

impl Link for SerialLink {
    fn write_exact(&mut self, bytes: &[u8]) -> Result<()> {
        SerialLink::write_exact(self, bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        SerialLink::read_exact(self, buf)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("path", &self.path)
            .field("baud_rate", &self.config.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Waits for readability with `poll(2)` before each read; reports
/// `TimedOut` once the deadline passes.
struct DeadlineReader<'a> {
    file: &'a mut File,
    deadline: Instant,
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if !wait_readable(self.file, remaining)? {
            return Err(io::Error::from(ErrorKind::TimedOut));
        }
        self.file.read(buf)
    }
}

fn wait_readable(file: &File, timeout: Duration) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    // SAFETY: `pfd` is a single valid pollfd for an open descriptor owned by `file`.
    let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
    if rc < 0 {
        // EINTR is retried by the read loop with the remaining time.
        return Err(io::Error::last_os_error());
    }
    Ok(rc > 0)
}

/// Apply 8N1, receiver enabled, modem lines ignored, no input/output/line
/// processing, then discard pending input and commit in one `tcsetattr`.
fn configure_raw(file: &File, speed: libc::speed_t) -> io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: termios is a plain C struct; all-zero is a valid starting value
    // and is fully overwritten by `tcgetattr` on success.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is open for the lifetime of `file` and `tio` is a valid
    // writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    tio.c_cflag = libc::CS8 | libc::CLOCAL | libc::CREAD;
    tio.c_iflag = libc::IGNPAR;
    tio.c_oflag = 0;
    tio.c_lflag = 0;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: `tio` is a valid termios and `speed` a termios speed constant.
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::cfsetospeed(&mut tio, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: `fd` is a valid open tty descriptor.
    if unsafe { libc::tcflush(fd, libc::TCIFLUSH) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: `fd` is a valid open tty descriptor and `tio` is initialized.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

fn baud_to_speed(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        #[cfg(target_os = "linux")]
        460_800 => libc::B460800,
        #[cfg(target_os = "linux")]
        921_600 => libc::B921600,
        #[cfg(target_os = "linux")]
        1_000_000 => libc::B1000000,
        #[cfg(target_os = "linux")]
        2_000_000 => libc::B2000000,
        #[cfg(target_os = "linux")]
        3_000_000 => libc::B3000000,
        #[cfg(target_os = "linux")]
        4_000_000 => libc::B4000000,
        _ => return None,
    };
    Some(speed)
}
