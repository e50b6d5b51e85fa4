use tracing::info;

use crate::cmd::LedArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, RegisterReport};

/// Word holding the LED value.
pub const LED_WORD: usize = 0;

pub fn run(args: LedArgs, format: OutputFormat) -> CliResult<i32> {
    let mut map = args.bus.map()?;
    let value = u32::from(args.value);
    map.write_word(LED_WORD, value);
    info!(value, "led register written");

    let report = RegisterReport::new(map.path(), map.base_address(), "write", LED_WORD, value);
    print_report(&report, format);
    Ok(SUCCESS)
}
