use std::io::IsTerminal;
use std::path::Path;

use cgractl_frame::{AluValue, OpCode};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A command result renderable in every [`OutputFormat`].
pub trait Report: Serialize {
    fn header(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
    fn pretty(&self) -> String;
    fn raw(&self) -> String;
}

pub fn render<R: Report>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(report.header());
            for row in report.rows() {
                table.add_row(row);
            }
            table.to_string()
        }
        OutputFormat::Pretty => report.pretty(),
        OutputFormat::Raw => report.raw(),
    }
}

pub fn print_report<R: Report>(report: &R, format: OutputFormat) {
    println!("{}", render(report, format));
}

/// One 16-bit word as the ALU sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordReport {
    pub value: String,
    pub bits: String,
    pub binary16: String,
}

impl WordReport {
    pub fn new(value: AluValue) -> Self {
        let bits = value.bits();
        Self {
            value: value.to_string(),
            bits: format!("0x{bits:04X}"),
            binary16: format!("{bits:016b}"),
        }
    }

    fn row(&self, label: &str) -> Vec<String> {
        vec![
            label.to_string(),
            self.value.clone(),
            self.bits.clone(),
            self.binary16.clone(),
        ]
    }
}

/// Operands and result of one ALU exchange.
#[derive(Debug, Serialize)]
pub struct ExchangeReport {
    pub opcode: Option<&'static str>,
    pub opcode_value: u8,
    pub a: WordReport,
    pub b: WordReport,
    pub result: WordReport,
}

impl ExchangeReport {
    /// Operands and result are shown as reals for arithmetic opcodes and as
    /// bit patterns otherwise.
    pub fn new(opcode_value: u8, a: u16, b: u16, result: u16) -> Self {
        let op = OpCode::try_from(opcode_value).ok();
        Self {
            opcode: op.map(OpCode::mnemonic),
            opcode_value,
            a: WordReport::new(AluValue::interpret(op, a)),
            b: WordReport::new(AluValue::interpret(op, b)),
            result: WordReport::new(AluValue::interpret(op, result)),
        }
    }

    fn is_unary(&self) -> bool {
        OpCode::try_from(self.opcode_value).is_ok_and(OpCode::is_unary)
    }
}

impl Report for ExchangeReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["", "VALUE", "HEX", "BINARY16"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![
            vec![
                "opcode".to_string(),
                self.opcode.unwrap_or("?").to_string(),
                format!("0x{:02X}", self.opcode_value),
                format!("{:08b}", self.opcode_value),
            ],
            self.a.row("a"),
            self.b.row("b"),
            self.result.row("c"),
        ]
    }

    fn pretty(&self) -> String {
        let opcode = match self.opcode {
            Some(mnemonic) => mnemonic.to_string(),
            None => format!("OP{}", self.opcode_value),
        };
        let operands = if self.is_unary() {
            self.a.value.clone()
        } else {
            format!("{}, {}", self.a.value, self.b.value)
        };
        format!(
            "{opcode} {operands} -> {} ({}, {})",
            self.result.value, self.result.bits, self.result.binary16
        )
    }

    /// The result line followed by its bit pattern, for line-oriented callers.
    fn raw(&self) -> String {
        format!("{}\nBINARY16={}", self.result.value, self.result.binary16)
    }
}

/// A single register access.
#[derive(Debug, Serialize)]
pub struct RegisterReport {
    pub device: String,
    pub base_address: String,
    pub access: &'static str,
    pub index: usize,
    pub offset: String,
    pub value: String,
    pub decimal: u32,
}

impl RegisterReport {
    pub fn new(
        device: &Path,
        base_address: u64,
        access: &'static str,
        index: usize,
        value: u32,
    ) -> Self {
        Self {
            device: device.display().to_string(),
            base_address: format!("{base_address:#x}"),
            access,
            index,
            offset: format!("{:#x}", index.saturating_mul(cgractl_bus::WORD_SIZE)),
            value: format!("0x{value:08X}"),
            decimal: value,
        }
    }
}

impl Report for RegisterReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["DEVICE", "ACCESS", "WORD", "OFFSET", "VALUE", "DECIMAL"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.device.clone(),
            self.access.to_string(),
            self.index.to_string(),
            self.offset.clone(),
            self.value.clone(),
            self.decimal.to_string(),
        ]]
    }

    fn pretty(&self) -> String {
        format!(
            "{} word {} (+{}) {} {}",
            self.access,
            self.index,
            self.offset,
            if self.access == "read" { "=" } else { "<-" },
            self.value
        )
    }

    fn raw(&self) -> String {
        self.value.clone()
    }
}
