use std::path::PathBuf;
use std::time::Duration;

use cgractl_bus::{
    BusConfig, RegisterMap, DEFAULT_BASE_ADDRESS, DEFAULT_DEVICE_NAME, DEFAULT_WINDOW_SIZE,
    DEV_ROOT, UIO_CLASS_ROOT,
};
use cgractl_frame::{parse_hex_word, parse_operand, FixedValue16, OpCode};
use cgractl_transport::{SerialConfig, SerialLink, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};
use clap::{Args, Subcommand};

use crate::exit::{bus_error, frame_error, transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod doctor;
pub mod exec;
pub mod fixed;
pub mod led;
pub mod reg;
pub mod repl;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one command to the ALU and print its result.
    Exec(ExecArgs),
    /// Prompt for commands and run them over one serial link.
    Repl(ReplArgs),
    /// Write a value to the LED register (word 0).
    Led(LedArgs),
    /// Read or write a word in the register window.
    #[command(subcommand)]
    Reg(RegCommand),
    /// Convert between reals and Q8.7 words without touching hardware.
    #[command(subcommand)]
    Fixed(FixedCommand),
    /// Check that the register device and serial port are usable.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Exec(args) => exec::run(args, format),
        Command::Repl(args) => repl::run(args, format),
        Command::Led(args) => led::run(args, format),
        Command::Reg(command) => reg::run(command, format),
        Command::Fixed(command) => fixed::run(command, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the register window lives.
#[derive(Args, Debug, Clone)]
pub struct BusArgs {
    /// UIO device name to match under the class directory.
    #[arg(long, env = "CGRACTL_UIO_NAME", default_value = DEFAULT_DEVICE_NAME)]
    pub uio_name: String,
    /// UIO class directory to enumerate.
    #[arg(long, env = "CGRACTL_UIO_ROOT", default_value = UIO_CLASS_ROOT)]
    pub uio_root: PathBuf,
    /// Directory holding the UIO device files.
    #[arg(long, env = "CGRACTL_DEV_ROOT", default_value = DEV_ROOT)]
    pub dev_root: PathBuf,
    /// Physical base address of the register window.
    #[arg(long, env = "CGRACTL_BASE_ADDRESS", value_parser = parse_u64, default_value_t = DEFAULT_BASE_ADDRESS)]
    pub base_address: u64,
    /// Bytes of the window to map.
    #[arg(long, env = "CGRACTL_WINDOW_SIZE", value_parser = parse_u64, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: u64,
}

impl BusArgs {
    pub fn config(&self) -> BusConfig {
        BusConfig {
            sysfs_root: self.uio_root.clone(),
            dev_root: self.dev_root.clone(),
            device_name: self.uio_name.clone(),
            base_address: self.base_address,
            window_size: self.window_size,
        }
    }

    pub fn map(&self) -> CliResult<RegisterMap> {
        RegisterMap::open(&self.config()).map_err(|err| bus_error("register window", err))
    }
}

/// How to reach the ALU.
#[derive(Args, Debug, Clone)]
pub struct SerialArgs {
    /// Serial device wired to the ALU.
    #[arg(long, short = 'p', env = "CGRACTL_SERIAL_PORT", default_value = DEFAULT_SERIAL_PATH)]
    pub port: PathBuf,
    /// Line rate in bits per second.
    #[arg(long, env = "CGRACTL_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Give up on a response after this long (e.g. 2s, 500ms). Default: wait forever.
    #[arg(long, env = "CGRACTL_TIMEOUT", value_name = "DURATION")]
    pub timeout: Option<String>,
}

impl SerialArgs {
    pub fn config(&self) -> CliResult<SerialConfig> {
        let read_timeout = self.timeout.as_deref().map(parse_duration).transpose()?;
        Ok(SerialConfig {
            baud_rate: self.baud,
            read_timeout,
        })
    }

    pub fn open(&self) -> CliResult<SerialLink> {
        let config = self.config()?;
        SerialLink::open_with_config(&self.port, config)
            .map_err(|err| transport_error("serial port", err))
    }
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Opcode: a mnemonic (ADD, XOR, ...) or its number.
    #[arg(short = 'o', long = "opcode", value_name = "OPCODE")]
    pub opcode: String,
    /// First operand: a real for ADD/SUB/MUL, a hex word otherwise.
    #[arg(short = 'a', value_name = "A", allow_negative_numbers = true)]
    pub a: String,
    /// Second operand; ignored by NOP and NOT.
    #[arg(short = 'b', value_name = "B", default_value = "0", allow_negative_numbers = true)]
    pub b: String,
    /// Send opcodes outside 0..=7 instead of rejecting them.
    #[arg(long)]
    pub no_validate: bool,
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct ReplArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
}

#[derive(Args, Debug)]
pub struct LedArgs {
    /// Value to show on the LEDs.
    #[arg(short = 'n', long = "value", value_name = "0-255")]
    pub value: u8,
    #[command(flatten)]
    pub bus: BusArgs,
}

#[derive(Subcommand, Debug)]
pub enum RegCommand {
    /// Read one 32-bit word.
    Read {
        /// Word index (byte offset / 4).
        #[arg(value_parser = parse_usize)]
        index: usize,
        #[command(flatten)]
        bus: BusArgs,
    },
    /// Write one 32-bit word.
    Write {
        /// Word index (byte offset / 4).
        #[arg(value_parser = parse_usize)]
        index: usize,
        /// Value, decimal or 0x-prefixed hex.
        #[arg(value_parser = parse_u32)]
        value: u32,
        #[command(flatten)]
        bus: BusArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum FixedCommand {
    /// Encode reals into Q8.7 words.
    Encode {
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,
        /// Reject out-of-range values instead of clamping them.
        #[arg(long)]
        strict: bool,
    },
    /// Decode Q8.7 words (hex) into reals.
    Decode {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub bus: BusArgs,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Also map the register window.
    #[arg(long)]
    pub map: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Resolve an opcode given as a mnemonic or a number.
///
/// Numbers outside the instruction set are returned as-is when `permissive`.
pub fn parse_opcode(input: &str, permissive: bool) -> CliResult<u8> {
    match input.parse::<OpCode>() {
        Ok(op) => Ok(op.as_u8()),
        Err(err) => match input.trim().parse::<u8>() {
            Ok(raw) if permissive => Ok(raw),
            _ => Err(frame_error("invalid opcode", err)),
        },
    }
}

/// Parse an operand for `opcode`; unknown opcodes take hex words.
pub fn parse_operand_for(opcode: u8, input: &str, label: &str) -> CliResult<FixedValue16> {
    let parsed = match OpCode::try_from(opcode) {
        Ok(op) => parse_operand(op, input),
        Err(_) => parse_hex_word(input).map(FixedValue16::from_bits),
    };
    parsed.map_err(|err| frame_error(&format!("invalid operand {label}"), err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

fn parse_u64(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => input.replace('_', "").parse(),
    };
    parsed.map_err(|err| format!("{input:?}: {err}"))
}

fn parse_u32(input: &str) -> Result<u32, String> {
    let value = parse_u64(input)?;
    u32::try_from(value).map_err(|_| format!("{input:?} does not fit in 32 bits"))
}

fn parse_usize(input: &str) -> Result<usize, String> {
    let value = parse_u64(input)?;
    usize::try_from(value).map_err(|_| format!("{input:?} is too large"))
}
