use cgractl_frame::{FixedValue16, OpCode};
use cgractl_protocol::{Session, SessionConfig};
use cgractl_transport::Link;
use tracing::info;

use crate::cmd::{parse_opcode, parse_operand_for, ExecArgs};
use crate::exit::{protocol_error, CliResult, SUCCESS};
use crate::output::{print_report, ExchangeReport, OutputFormat};

pub fn run(args: ExecArgs, format: OutputFormat) -> CliResult<i32> {
    // Everything is validated before the port is opened.
    let opcode = parse_opcode(&args.opcode, args.no_validate)?;
    let a = parse_operand_for(opcode, &args.a, "a")?;
    let b = parse_operand_for(opcode, &args.b, "b")?;

    let link = args.serial.open()?;
    let config = SessionConfig {
        validate_opcodes: !args.no_validate,
    };
    let mut session = Session::with_config(link, config);

    let report = exchange(&mut session, opcode, a, b)?;
    print_report(&report, format);
    Ok(SUCCESS)
}

/// Run one exchange and describe it as it went over the wire.
pub fn exchange<L: Link>(
    session: &mut Session<L>,
    opcode: u8,
    a: FixedValue16,
    b: FixedValue16,
) -> CliResult<ExchangeReport> {
    let result = session
        .execute_raw(opcode, a.to_bits(), b.to_bits())
        .map_err(|err| protocol_error("exchange failed", err))?;

    let sent_b = match OpCode::try_from(opcode) {
        Ok(op) if op.is_unary() => 0,
        _ => b.to_bits(),
    };
    info!(
        opcode,
        a = format_args!("{:#06x}", a.to_bits()),
        b = format_args!("{sent_b:#06x}"),
        result = format_args!("{result:#06x}"),
        "exchange complete"
    );
    Ok(ExchangeReport::new(opcode, a.to_bits(), sent_b, result))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    use cgractl_transport::StreamLink;

    use super::*;
    use crate::exit::{TRANSPORT_ERROR, USAGE};

    /// Answers one command frame with `reply` and returns the frame it saw.
    fn one_shot_remote(reply: [u8; 2]) -> (UnixStream, std::thread::JoinHandle<[u8; 5]>) {
        let (local, mut remote) = UnixStream::pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut frame = [0u8; 5];
            remote.read_exact(&mut frame).unwrap();
            remote.write_all(&reply).unwrap();
            frame
        });
        (local, handle)
    }

    #[test]
    fn add_reports_real_result() {
        let (local, remote) = one_shot_remote([0x01, 0xE0]);
        let mut session = Session::new(StreamLink::new(local));

        let report = exchange(
            &mut session,
            1,
            FixedValue16::encode(1.5),
            FixedValue16::encode(2.25),
        )
        .unwrap();

        assert_eq!(remote.join().unwrap(), [0x01, 0x00, 0xC0, 0x01, 0x20]);
        assert_eq!(report.result.value, "3.750");
        assert_eq!(report.result.binary16, "0000000111100000");
    }

    #[test]
    fn unary_report_shows_zero_b() {
        let (local, remote) = one_shot_remote([0xFF, 0x00]);
        let mut session = Session::new(StreamLink::new(local));

        let report = exchange(
            &mut session,
            6,
            FixedValue16::from_bits(0x00FF),
            FixedValue16::from_bits(0x1234),
        )
        .unwrap();

        assert_eq!(remote.join().unwrap(), [0x06, 0x00, 0xFF, 0x00, 0x00]);
        assert_eq!(report.b.bits, "0x0000");
        assert_eq!(report.result.value, "0xFF00");
    }

    #[test]
    fn invalid_opcode_is_usage_error_without_traffic() {
        let (local, mut remote) = UnixStream::pair().unwrap();
        let mut session = Session::new(StreamLink::new(local));

        let err = exchange(&mut session, 8, FixedValue16::ZERO, FixedValue16::ZERO).unwrap_err();
        assert_eq!(err.code, USAGE);

        drop(session);
        let mut leftover = Vec::new();
        remote.read_to_end(&mut leftover).unwrap();
        assert!(leftover.is_empty());
    }

    #[test]
    fn hangup_is_transport_error() {
        let (local, remote) = UnixStream::pair().unwrap();
        drop(remote);
        let mut session = Session::new(StreamLink::new(local));

        let err = exchange(&mut session, 1, FixedValue16::ZERO, FixedValue16::ZERO).unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
