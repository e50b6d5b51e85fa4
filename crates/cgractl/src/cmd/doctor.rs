use std::fs::OpenOptions;

use cgractl_bus::{discover_in, DeviceHandle, RegisterMap};
use cgractl_transport::SerialLink;
use serde::Serialize;

use crate::cmd::{BusArgs, DoctorArgs, SerialArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let mut checks = vec![uio_class_check(&args.bus)];

    let device = match discover_in(&args.bus.uio_root, &args.bus.dev_root, &args.bus.uio_name) {
        Ok(handle) => {
            checks.push(CheckResult::new(
                "uio_device",
                CheckStatus::Pass,
                format!("{:?} is {}", handle.name, handle.node),
            ));
            Some(handle)
        }
        Err(err) => {
            checks.push(CheckResult::new("uio_device", CheckStatus::Fail, err.to_string()));
            None
        }
    };
    checks.push(device_node_check(device.as_ref()));
    checks.push(register_window_check(&args.bus, device.is_some(), args.map));
    checks.push(serial_port_check(&args.serial));
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };
    print_doctor(&output, format);

    Ok(if has_fail { HEALTH_CHECK_FAILED } else { SUCCESS })
}

fn uio_class_check(bus: &BusArgs) -> CheckResult {
    let root = &bus.uio_root;
    if root.is_dir() {
        CheckResult::new("uio_class", CheckStatus::Pass, format!("{} present", root.display()))
    } else {
        CheckResult::new(
            "uio_class",
            CheckStatus::Fail,
            format!("{} missing (is the uio driver loaded?)", root.display()),
        )
    }
}

fn device_node_check(device: Option<&DeviceHandle>) -> CheckResult {
    let Some(device) = device else {
        return CheckResult::new("device_node", CheckStatus::Skip, "no device discovered");
    };
    match OpenOptions::new().read(true).write(true).open(&device.path) {
        Ok(_) => CheckResult::new(
            "device_node",
            CheckStatus::Pass,
            format!("{} opens read-write", device.path.display()),
        ),
        Err(err) => CheckResult::new(
            "device_node",
            CheckStatus::Fail,
            format!("{}: {err}", device.path.display()),
        ),
    }
}

fn register_window_check(bus: &BusArgs, discovered: bool, map: bool) -> CheckResult {
    if !map {
        return CheckResult::new("register_window", CheckStatus::Skip, "pass --map to map it");
    }
    if !discovered {
        return CheckResult::new("register_window", CheckStatus::Skip, "no device discovered");
    }
    match RegisterMap::open(&bus.config()) {
        Ok(map) => CheckResult::new(
            "register_window",
            CheckStatus::Pass,
            format!("{} words at {:#x}", map.word_count(), map.base_address()),
        ),
        Err(err) => CheckResult::new("register_window", CheckStatus::Fail, err.to_string()),
    }
}

fn serial_port_check(serial: &SerialArgs) -> CheckResult {
    let config = match serial.config() {
        Ok(config) => config,
        Err(err) => return CheckResult::new("serial_port", CheckStatus::Fail, err.message),
    };
    match SerialLink::open_with_config(&serial.port, config) {
        Ok(link) => {
            let detail = format!(
                "{} configured at {} 8N1",
                link.path().display(),
                link.config().baud_rate
            );
            link.close();
            CheckResult::new("serial_port", CheckStatus::Pass, detail)
        }
        Err(err) => CheckResult::new("serial_port", CheckStatus::Fail, err.to_string()),
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("cgractl doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn bus_at(root: &str) -> BusArgs {
        BusArgs {
            uio_name: "CGRA".to_string(),
            uio_root: PathBuf::from(root),
            dev_root: PathBuf::from("/dev"),
            base_address: 0,
            window_size: 4096,
        }
    }

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }

    #[test]
    fn missing_class_directory_fails() {
        let check = uio_class_check(&bus_at("/definitely/not/sysfs/uio"));
        assert_eq!(check.status, CheckStatus::Fail);
    }

    #[test]
    fn window_check_is_opt_in() {
        let bus = bus_at("/definitely/not/sysfs/uio");
        assert_eq!(register_window_check(&bus, true, false).status, CheckStatus::Skip);
        assert_eq!(register_window_check(&bus, false, true).status, CheckStatus::Skip);
    }

    #[test]
    fn missing_serial_port_fails() {
        let serial = SerialArgs {
            port: PathBuf::from("/definitely/not/a/tty"),
            baud: 115_200,
            timeout: None,
        };
        let check = serial_port_check(&serial);
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.detail.contains("/definitely/not/a/tty"));
    }
}
