use cgractl_bus::RegisterMap;

use crate::cmd::RegCommand;
use crate::exit::{CliError, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, RegisterReport};

pub fn run(command: RegCommand, format: OutputFormat) -> CliResult<i32> {
    let report = match command {
        RegCommand::Read { index, bus } => {
            let map = bus.map()?;
            check_index(&map, index)?;
            let value = map.read_word(index);
            RegisterReport::new(map.path(), map.base_address(), "read", index, value)
        }
        RegCommand::Write { index, value, bus } => {
            let mut map = bus.map()?;
            check_index(&map, index)?;
            map.write_word(index, value);
            RegisterReport::new(map.path(), map.base_address(), "write", index, value)
        }
    };
    print_report(&report, format);
    Ok(SUCCESS)
}

/// `RegisterMap` treats an out-of-window index as a bug; reject it as input
/// here instead.
fn check_index(map: &RegisterMap, index: usize) -> CliResult<()> {
    if index < map.word_count() {
        Ok(())
    } else {
        Err(CliError::usage(format!(
            "word index {index} is outside the window ({} words)",
            map.word_count()
        )))
    }
}
