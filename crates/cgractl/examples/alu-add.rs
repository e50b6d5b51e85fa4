//! Send one ADD to the ALU and print the result.
//!
//! Run with:
//!   cargo run --example alu-add -- /dev/ttyUSB2 1.5 2.25

use cgractl::frame::{FixedValue16, OpCode};
use cgractl::protocol::Session;
use cgractl::transport::{SerialLink, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| DEFAULT_SERIAL_PATH.to_string());
    let a: f64 = args.next().as_deref().unwrap_or("1.5").parse()?;
    let b: f64 = args.next().as_deref().unwrap_or("2.25").parse()?;

    let link = SerialLink::open(&port, DEFAULT_BAUD_RATE)?;
    let mut session = Session::new(link);

    let (a, b) = (FixedValue16::encode(a), FixedValue16::encode(b));
    eprintln!("a = {a} -> 0x{a:04X} -> {a:016b}");
    eprintln!("b = {b} -> 0x{b:04X} -> {b:016b}");

    let c = session.execute(OpCode::Add, a, b)?;
    println!("c = {c} -> 0x{c:04X} -> {c:016b}");
    Ok(())
}
