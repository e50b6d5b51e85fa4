use cgractl_frame::{check_range, parse_hex_word, parse_real, FixedValue16, FrameError};
use serde::Serialize;

use crate::cmd::FixedCommand;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
struct FixedEntry {
    input: String,
    value: String,
    bits: String,
    binary16: String,
    clamped: bool,
}

impl FixedEntry {
    fn new(input: &str, word: FixedValue16, clamped: bool) -> Self {
        Self {
            input: input.to_string(),
            value: word.to_string(),
            bits: format!("0x{word:04X}"),
            binary16: format!("{word:016b}"),
            clamped,
        }
    }
}

#[derive(Debug, Serialize)]
struct FixedReport {
    direction: &'static str,
    values: Vec<FixedEntry>,
}

impl Report for FixedReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["INPUT", "VALUE", "HEX", "BINARY16", "CLAMPED"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|e| {
                vec![
                    e.input.clone(),
                    e.value.clone(),
                    e.bits.clone(),
                    e.binary16.clone(),
                    if e.clamped { "yes" } else { "" }.to_string(),
                ]
            })
            .collect()
    }

    fn pretty(&self) -> String {
        self.values
            .iter()
            .map(|e| {
                let note = if e.clamped { " (clamped)" } else { "" };
                format!("{} -> {} -> {} -> {}{note}", e.input, e.value, e.bits, e.binary16)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Encoded words for `encode`, reals for `decode`, one per line.
    fn raw(&self) -> String {
        self.values
            .iter()
            .map(|e| match self.direction {
                "encode" => e.bits.as_str(),
                _ => e.value.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn run(command: FixedCommand, format: OutputFormat) -> CliResult<i32> {
    let report = match command {
        FixedCommand::Encode { values, strict } => encode_all(&values, strict)?,
        FixedCommand::Decode { words } => decode_all(&words)?,
    };
    print_report(&report, format);
    Ok(SUCCESS)
}

fn encode_all(values: &[String], strict: bool) -> CliResult<FixedReport> {
    let mut entries = Vec::with_capacity(values.len());
    for input in values {
        let real = parse_real(input).map_err(|err| frame_error("invalid value", err))?;
        let clamped = check_range(real).is_err();
        if strict && clamped {
            return Err(frame_error("invalid value", FrameError::OutOfRange(real)));
        }
        entries.push(FixedEntry::new(input, FixedValue16::encode(real), clamped));
    }
    Ok(FixedReport {
        direction: "encode",
        values: entries,
    })
}

fn decode_all(words: &[String]) -> CliResult<FixedReport> {
    let mut entries = Vec::with_capacity(words.len());
    for input in words {
        let bits = parse_hex_word(input).map_err(|err| frame_error("invalid word", err))?;
        entries.push(FixedEntry::new(input, FixedValue16::from_bits(bits), false));
    }
    Ok(FixedReport {
        direction: "decode",
        values: entries,
    })
}
