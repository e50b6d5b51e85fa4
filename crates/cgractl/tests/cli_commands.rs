#![cfg(all(unix, feature = "cli"))]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn cgractl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cgractl"));
    cmd.arg("--log-level").arg("error");
    for var in [
        "CGRACTL_SERIAL_PORT",
        "CGRACTL_BAUD",
        "CGRACTL_TIMEOUT",
        "CGRACTL_UIO_NAME",
        "CGRACTL_UIO_ROOT",
        "CGRACTL_DEV_ROOT",
        "CGRACTL_BASE_ADDRESS",
        "CGRACTL_WINDOW_SIZE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cgractl-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// A sysfs tree naming `uio0` "CGRA" and a one-page regular file standing in
/// for `/dev/uio0`. Returns (sysfs root, dev root).
fn fake_uio(dir: &std::path::Path) -> (PathBuf, PathBuf) {
    let sysfs = dir.join("sys");
    let dev = dir.join("dev");
    fs::create_dir_all(sysfs.join("uio0")).unwrap();
    fs::write(sysfs.join("uio0").join("name"), "CGRA\n").unwrap();
    fs::create_dir_all(&dev).unwrap();
    let node = fs::File::create(dev.join("uio0")).unwrap();
    node.set_len(4096).unwrap();
    (sysfs, dev)
}

#[test]
fn fixed_encode_json() {
    let output = cgractl()
        .args(["--format", "json", "fixed", "encode", "1.5", "-0.5"])
        .output()
        .expect("fixed encode should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"bits\":\"0x00C0\""));
    assert!(stdout.contains("\"bits\":\"0xFFC0\""));
    assert!(stdout.contains("\"direction\":\"encode\""));
}

#[test]
fn fixed_decode_raw() {
    let output = cgractl()
        .args(["--format", "raw", "fixed", "decode", "0x01E0"])
        .output()
        .expect("fixed decode should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "3.750\n");
}

#[test]
fn led_value_out_of_byte_range_is_rejected() {
    let output = cgractl()
        .args(["led", "-n", "300"])
        .output()
        .expect("led should run");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("300"));
}

#[test]
fn led_writes_word_zero() {
    let dir = unique_temp_dir("led");
    let (sysfs, dev) = fake_uio(&dir);

    let output = cgractl()
        .args(["--format", "json", "led", "-n", "42"])
        .arg("--uio-root")
        .arg(&sysfs)
        .arg("--dev-root")
        .arg(&dev)
        .args(["--window-size", "4096", "--base-address", "0x10000"])
        .output()
        .expect("led should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"value\":\"0x0000002A\""));

    let bytes = fs::read(dev.join("uio0")).unwrap();
    assert_eq!(u32::from_ne_bytes(bytes[0..4].try_into().unwrap()), 42);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn reg_write_then_read() {
    let dir = unique_temp_dir("reg");
    let (sysfs, dev) = fake_uio(&dir);
    let bus_args = |cmd: &mut Command| {
        cmd.arg("--uio-root")
            .arg(&sysfs)
            .arg("--dev-root")
            .arg(&dev)
            .args(["--window-size", "4096"]);
    };

    let mut write = cgractl();
    write.args(["reg", "write", "3", "0xDEADBEEF"]);
    bus_args(&mut write);
    let output = write.output().expect("reg write should run");
    assert!(output.status.success());

    let mut read = cgractl();
    read.args(["--format", "raw", "reg", "read", "3"]);
    bus_args(&mut read);
    let output = read.output().expect("reg read should run");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0xDEADBEEF\n");

    let mut past_end = cgractl();
    past_end.args(["reg", "read", "1024"]);
    bus_args(&mut past_end);
    let output = past_end.output().expect("reg read should run");
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside the window"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn reg_read_without_device_is_not_found() {
    let dir = unique_temp_dir("nodev");

    let output = cgractl()
        .args(["reg", "read", "0", "--uio-root"])
        .arg(&dir)
        .output()
        .expect("reg read should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn exec_invalid_opcode_is_usage_error_before_opening_port() {
    let output = cgractl()
        .args(["exec", "-o", "9", "-a", "1", "--port", "/definitely/not/a/tty"])
        .output()
        .expect("exec should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid opcode"));
    assert!(!stderr.contains("/definitely/not/a/tty"));
}

#[test]
fn exec_missing_port_fails() {
    let output = cgractl()
        .args(["exec", "-o", "ADD", "-a", "1", "-b", "2", "--port", "/definitely/not/a/tty"])
        .output()
        .expect("exec should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("/definitely/not/a/tty"));
}

#[test]
fn version_prints_package_version() {
    let output = cgractl().arg("version").output().expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("cgractl {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[cfg(target_os = "linux")]
mod pty {
    use std::ffi::CStr;
    use std::fs::{File, OpenOptions};
    use std::io::{Read, Write};
    use std::os::fd::FromRawFd;
    use std::os::unix::fs::OpenOptionsExt;
    use std::path::{Path, PathBuf};

    use super::cgractl;

    /// Open a pseudo-terminal pair; returns the master and the slave path.
    fn open_pty() -> (File, PathBuf) {
        // SAFETY: plain libc calls on a freshly opened master descriptor; every
        // return value is checked before use.
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0, "posix_openpt failed");
            assert_eq!(libc::grantpt(master), 0);
            assert_eq!(libc::unlockpt(master), 0);
            let mut name = [0 as libc::c_char; 128];
            assert_eq!(libc::ptsname_r(master, name.as_mut_ptr(), name.len()), 0);
            let path = CStr::from_ptr(name.as_ptr())
                .to_string_lossy()
                .into_owned();
            (File::from_raw_fd(master), PathBuf::from(path))
        }
    }

    /// Keeps the slave side open so the master never sees a hangup while the
    /// child process opens and closes it.
    fn hold_open(slave: &Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(slave)
            .unwrap()
    }

    #[test]
    fn exec_add_over_serial() {
        let (mut master, slave) = open_pty();
        let _slave_guard = hold_open(&slave);

        let alu = std::thread::spawn(move || {
            let mut frame = [0u8; 5];
            master.read_exact(&mut frame).unwrap();
            master.write_all(&[0x01, 0xE0]).unwrap();
            frame
        });

        let output = cgractl()
            .args(["--format", "raw", "exec", "-o", "ADD", "-a", "1.5", "-b", "2.25"])
            .arg("--port")
            .arg(&slave)
            .args(["--timeout", "5s"])
            .output()
            .expect("exec should run");

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(alu.join().unwrap(), [0x01, 0x00, 0xC0, 0x01, 0x20]);
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            "3.750\nBINARY16=0000000111100000\n"
        );
    }

    #[test]
    fn exec_times_out_without_reply() {
        let (_master, slave) = open_pty();
        let _slave_guard = hold_open(&slave);

        let output = cgractl()
            .args(["exec", "-o", "XOR", "-a", "ff", "-b", "0f"])
            .arg("--port")
            .arg(&slave)
            .args(["--timeout", "100ms"])
            .output()
            .expect("exec should run");

        assert_eq!(output.status.code(), Some(124));
        assert!(String::from_utf8_lossy(&output.stderr).contains("timed out"));
    }
}
