use cgractl_frame::{FRAC_BITS, MAX_VALUE, MIN_VALUE};
use cgractl_transport::{DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("cgractl {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: cgractl");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", target_triple());
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "fixed_point: Q8.{FRAC_BITS} ({MIN_VALUE:.3} to {MAX_VALUE:.3})"
    );
    println!("serial_default: {DEFAULT_SERIAL_PATH} @ {DEFAULT_BAUD_RATE} 8N1");

    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("CGRACTL_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        ("arm", "linux") => "armv7-unknown-linux-gnueabihf".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_looks_like_triple() {
        let target = target_triple();
        assert!(target.split('-').count() >= 3);
    }
}
