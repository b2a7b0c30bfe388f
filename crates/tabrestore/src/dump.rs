use std::io::{self, Write};
use std::path::PathBuf;

use tabrestore_command::ids::{self, UPDATE_TAB_NAVIGATION};
use tabrestore_command::{CommandFrame, CommandLogReader, LogConfig, SessionType};
use tabrestore_navigation::{NavigationError, UpdateTabNavigation};
use tabrestore_pickle::ByteOrder;
use tracing::{debug, info, warn};

use crate::exit::{navigation_error, read_error, write_error, CliResult, SUCCESS};
use crate::output::{OutputFormat, Printer};

pub struct DumpOptions {
    pub path: PathBuf,
    pub session_type: SessionType,
    pub byte_order: ByteOrder,
    pub read_chunk_size: usize,
}

pub fn run(options: DumpOptions, format: OutputFormat) -> CliResult<i32> {
    let config = LogConfig {
        byte_order: options.byte_order,
        read_chunk_size: options.read_chunk_size,
    };
    let mut reader =
        CommandLogReader::open_with_config(&options.path, config).map_err(read_error)?;
    let commands = reader
        .read(options.session_type)
        .into_result()
        .map_err(read_error)?;
    info!(path = %options.path.display(), count = commands.len(), "read command log");

    let stdout = io::stdout();
    let printer = Printer::new(stdout.lock(), format);
    print_commands(&commands, options.byte_order, printer)?;
    Ok(SUCCESS)
}

fn print_commands<W: Write>(
    commands: &[CommandFrame],
    order: ByteOrder,
    mut printer: Printer<W>,
) -> CliResult<W> {
    for command in commands {
        match command.id() {
            UPDATE_TAB_NAVIGATION => match UpdateTabNavigation::from_command(command, order) {
                Ok(update) => printer.navigation(&update).map_err(write_error)?,
                Err(err @ NavigationError::Field { .. }) => {
                    warn!(error = %err, "skipping unreadable navigation");
                }
                Err(err) => return Err(navigation_error(err)),
            },
            id if ids::is_known(id) => {
                debug!(id, name = ids::command_name(id), "skipping command");
            }
            id => printer.unknown_command(id).map_err(write_error)?,
        }
    }
    printer.finish().map_err(write_error)
}

#[cfg(test)]
mod tests {
    use tabrestore_command::ids::{PINNED_STATE, WINDOW};
    use tabrestore_navigation::NavigationRecord;
    use tabrestore_pickle::Pickle;

    use super::*;
    use crate::exit::FAILURE;

    fn navigation(tab_id: i32, title: &str) -> CommandFrame {
        let record = NavigationRecord {
            index: 0,
            title: title.to_string(),
            virtual_url: format!("https://example.com/{tab_id}"),
            ..NavigationRecord::default()
        };
        UpdateTabNavigation::new(tab_id, record)
            .to_command(ByteOrder::Little)
            .unwrap()
    }

    fn render(commands: &[CommandFrame]) -> CliResult<String> {
        let printer = Printer::new(Vec::new(), OutputFormat::Pretty);
        let out = print_commands(commands, ByteOrder::Little, printer)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn known_ids_are_skipped_and_unknown_reported() {
        let commands = vec![
            navigation(1, "first"),
            CommandFrame::from_contents(WINDOW, &[0; 4]).unwrap(),
            CommandFrame::from_contents(PINNED_STATE, &[1]).unwrap(),
            CommandFrame::from_contents(200, &[]).unwrap(),
            navigation(2, "second"),
        ];
        let out = render(&commands).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "first");
        assert_eq!(lines[3], "https://example.com/1");
        assert_eq!(lines[4], "Unknown command 200");
        assert_eq!(lines[5], "second");
    }

    #[test]
    fn unreadable_tab_id_fails() {
        let empty = Pickle::new();
        let commands = vec![CommandFrame::from_pickle(UPDATE_TAB_NAVIGATION, &empty).unwrap()];
        let err = render(&commands).unwrap_err();
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn navigation_missing_fields_is_skipped() {
        let mut pickle = Pickle::new();
        pickle.write_i32(5).unwrap();
        pickle.write_i32(0).unwrap();
        let commands = vec![
            CommandFrame::from_pickle(UPDATE_TAB_NAVIGATION, &pickle).unwrap(),
            navigation(6, "kept"),
        ];
        let out = render(&commands).unwrap();
        assert_eq!(out.lines().next(), Some("kept"));
    }
}
