//! Count through the LED register once.
//!
//! Run with (needs access to the UIO device):
//!   cargo run --example led-blink

use std::thread;
use std::time::Duration;

use cgractl::bus::{BusConfig, RegisterMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut map = RegisterMap::open(&BusConfig::default())?;
    eprintln!("mapped {map:?}");

    for value in 0..=255u32 {
        map.write_word(0, value);
        thread::sleep(Duration::from_millis(20));
    }
    map.write_word(0, 0);
    Ok(())
}
