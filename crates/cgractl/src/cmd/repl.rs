use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cgractl_frame::{
    check_range, parse_hex_word, parse_real, FixedValue16, FrameError, OpCode, MAX_VALUE,
    MIN_VALUE,
};
use cgractl_protocol::Session;
use cgractl_transport::Link;
use tracing::info;

use crate::cmd::exec::exchange;
use crate::cmd::ReplArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS};
use crate::output::{render, OutputFormat};

pub fn run(args: ReplArgs, format: OutputFormat) -> CliResult<i32> {
    let link = args.serial.open()?;
    let mut session = Session::new(link);

    let stop = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(stop.clone())?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let completed = run_session(stdin.lock(), &mut stdout, &mut session, &stop, format)?;
    info!(completed, "session ended");
    Ok(SUCCESS)
}

/// Prompt for commands on `input` and run them one at a time until end of
/// input, `quit`, or `stop` is raised. Returns the number of exchanges run.
///
/// Bad input is reported and the command is asked for again; a failed
/// exchange ends the session because the link is closed afterwards.
pub fn run_session<R, W, L>(
    input: R,
    out: W,
    session: &mut Session<L>,
    stop: &AtomicBool,
    format: OutputFormat,
) -> CliResult<u64>
where
    R: BufRead,
    W: Write,
    L: Link,
{
    let mut prompt = Prompter {
        input,
        out,
        line: String::new(),
    };
    let started = session.completed();

    while !stop.load(Ordering::SeqCst) {
        let Some(opcode) = prompt.ask("Opcode (0-7 or mnemonic, quit to exit): ")? else {
            break;
        };
        if stop.load(Ordering::SeqCst) || matches!(opcode.as_str(), "quit" | "exit") {
            break;
        }
        let op = match opcode.parse::<OpCode>() {
            Ok(op) => op,
            Err(err) => {
                prompt.say(&format!("error: {err}"))?;
                continue;
            }
        };

        let a = match prompt.operand(op, "a")? {
            None => break,
            Some(Ok(a)) => a,
            Some(Err(err)) => {
                prompt.say(&format!("error: {err}"))?;
                continue;
            }
        };
        let b = if op.is_unary() {
            FixedValue16::ZERO
        } else {
            match prompt.operand(op, "b")? {
                None => break,
                Some(Ok(b)) => b,
                Some(Err(err)) => {
                    prompt.say(&format!("error: {err}"))?;
                    continue;
                }
            }
        };
        if stop.load(Ordering::SeqCst) {
            break;
        }

        prompt.say(&format!("\nOpcode: {op} ({})", op.as_u8()))?;
        prompt.say(&encoded_line("a", op, a))?;
        if !op.is_unary() {
            prompt.say(&encoded_line("b", op, b))?;
        }

        let report = exchange(session, op.as_u8(), a, b)?;
        prompt.say(&render(&report, format))?;
        prompt.say("")?;
    }

    Ok(session.completed() - started)
}

fn encoded_line(label: &str, op: OpCode, value: FixedValue16) -> String {
    let shown = if op.is_arithmetic() {
        value.to_string()
    } else {
        format!("0x{value:04X}")
    };
    format!("{label} = {shown} -> 0x{value:04X} -> {value:016b}")
}

/// Parse an interactive operand. Reals outside the Q8.7 range are rejected
/// rather than clamped.
fn parse_strict(op: OpCode, input: &str) -> Result<FixedValue16, FrameError> {
    if op.is_arithmetic() {
        let value = check_range(parse_real(input)?)?;
        Ok(FixedValue16::encode(value))
    } else {
        parse_hex_word(input).map(FixedValue16::from_bits)
    }
}

struct Prompter<R, W> {
    input: R,
    out: W,
    line: String,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Ask until a non-blank answer arrives. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> CliResult<Option<String>> {
        loop {
            write!(self.out, "{prompt}").map_err(|err| io_error("write failed", err))?;
            self.out
                .flush()
                .map_err(|err| io_error("write failed", err))?;

            self.line.clear();
            let n = self
                .input
                .read_line(&mut self.line)
                .map_err(|err| io_error("read failed", err))?;
            if n == 0 {
                return Ok(None);
            }
            let answer = self.line.trim();
            if !answer.is_empty() {
                return Ok(Some(answer.to_string()));
            }
        }
    }

    /// Ask for operand `label` of `op`. The inner result carries a parse error.
    fn operand(
        &mut self,
        op: OpCode,
        label: &str,
    ) -> CliResult<Option<Result<FixedValue16, FrameError>>> {
        let prompt = if op.is_arithmetic() {
            format!("Enter {label} ({MIN_VALUE:.3} to {MAX_VALUE:.3}): ")
        } else {
            format!("Enter {label} (hex word): ")
        };
        Ok(self.ask(&prompt)?.map(|answer| parse_strict(op, &answer)))
    }

    fn say(&mut self, text: &str) -> CliResult<()> {
        writeln!(self.out, "{text}").map_err(|err| io_error("write failed", err))
    }
}

fn install_interrupt_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if stop.swap(true, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
        eprintln!("\ninterrupted: finishing the current command (Ctrl-C again to quit now)");
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::os::unix::net::UnixStream;
    use std::thread::JoinHandle;

    use cgractl_transport::StreamLink;

    use super::*;
    use crate::exit::TRANSPORT_ERROR;

    /// Answers ADD and XOR frames until the host hangs up; returns the
    /// opcodes it saw.
    fn spawn_alu(mut remote: UnixStream) -> JoinHandle<Vec<u8>> {
        std::thread::spawn(move || {
            let mut seen = Vec::new();
            let mut frame = [0u8; 5];
            while remote.read_exact(&mut frame).is_ok() {
                let a = u16::from_be_bytes([frame[1], frame[2]]);
                let b = u16::from_be_bytes([frame[3], frame[4]]);
                let c = match frame[0] {
                    1 => (a as i16).wrapping_add(b as i16) as u16,
                    7 => a ^ b,
                    _ => 0,
                };
                seen.push(frame[0]);
                if remote.write_all(&c.to_be_bytes()).is_err() {
                    break;
                }
            }
            seen
        })
    }

    fn session_over(local: UnixStream) -> Session<StreamLink<UnixStream>> {
        Session::new(StreamLink::new(local))
    }

    #[test]
    fn runs_commands_until_end_of_input() {
        let (local, remote) = UnixStream::pair().unwrap();
        let alu = spawn_alu(remote);
        let mut session = session_over(local);
        let stop = AtomicBool::new(false);
        let mut out = Vec::new();

        let input = Cursor::new("ADD\n1.5\n2.25\n\nxor\n00ff\n0x0f0f\n");
        let completed =
            run_session(input, &mut out, &mut session, &stop, OutputFormat::Raw).unwrap();
        drop(session);

        assert_eq!(completed, 2);
        assert_eq!(alu.join().unwrap(), vec![1, 7]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a = 1.500 -> 0x00C0 -> 0000000011000000"));
        assert!(text.contains("3.750\nBINARY16=0000000111100000"));
        assert!(text.contains("b = 0x0F0F -> 0x0F0F -> 0000111100001111"));
        assert!(text.contains("0x0FF0\nBINARY16=0000111111110000"));
    }

    #[test]
    fn out_of_range_operand_is_rejected_not_clamped() {
        let (local, remote) = UnixStream::pair().unwrap();
        let alu = spawn_alu(remote);
        let mut session = session_over(local);
        let stop = AtomicBool::new(false);
        let mut out = Vec::new();

        let input = Cursor::new("1\n300\n9\nADD\n-256\n0.5\n");
        let completed =
            run_session(input, &mut out, &mut session, &stop, OutputFormat::Raw).unwrap();
        drop(session);

        assert_eq!(completed, 1);
        assert_eq!(alu.join().unwrap(), vec![1]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("out of range"));
        assert!(text.contains("invalid opcode"));
        assert!(text.contains("-255.500"));
    }

    #[test]
    fn unary_opcode_skips_second_operand() {
        let (local, remote) = UnixStream::pair().unwrap();
        let alu = std::thread::spawn(move || {
            let mut remote = remote;
            let mut frame = [0u8; 5];
            remote.read_exact(&mut frame).unwrap();
            remote.write_all(&[0xFF, 0x00]).unwrap();
            frame
        });
        let mut session = session_over(local);
        let stop = AtomicBool::new(false);
        let mut out = Vec::new();

        let input = Cursor::new("NOT\n00ff\nquit\n");
        let completed =
            run_session(input, &mut out, &mut session, &stop, OutputFormat::Pretty).unwrap();

        assert_eq!(completed, 1);
        assert_eq!(alu.join().unwrap(), [0x06, 0x00, 0xFF, 0x00, 0x00]);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Enter b"));
        assert!(text.contains("NOT 0x00FF -> 0xFF00"));
    }

    #[test]
    fn raised_stop_flag_ends_before_prompting() {
        let (local, _remote) = UnixStream::pair().unwrap();
        let mut session = session_over(local);
        let stop = AtomicBool::new(true);
        let mut out = Vec::new();

        let completed = run_session(
            Cursor::new("ADD\n1\n1\n"),
            &mut out,
            &mut session,
            &stop,
            OutputFormat::Raw,
        )
        .unwrap();
        assert_eq!(completed, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn failed_exchange_ends_session() {
        let (local, remote) = UnixStream::pair().unwrap();
        drop(remote);
        let mut session = session_over(local);
        let stop = AtomicBool::new(false);

        let err = run_session(
            Cursor::new("ADD\n1\n1\nADD\n2\n2\n"),
            Vec::new(),
            &mut session,
            &stop,
            OutputFormat::Raw,
        )
        .unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert_eq!(session.completed(), 0);
        assert!(!session.link().is_open());
    }
}
