mod dump;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tabrestore_command::{SessionType, DEFAULT_READ_CHUNK_SIZE};
use tabrestore_pickle::ByteOrder;

use crate::dump::DumpOptions;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "tabrestore",
    version,
    about = "Print the tabs stored in a Chrome tab restore file"
)]
struct Cli {
    /// Path of the Chrome tabs file.
    #[arg(long, value_name = "FILE", env = "TABRESTORE_PATH")]
    path: PathBuf,

    /// Service that wrote the file.
    #[arg(long, value_name = "TYPE", default_value = "tab-restore")]
    session_type: SessionKind,

    /// Output format.
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    format: OutputFormat,

    /// Byte order of the file.
    #[arg(long, value_name = "ORDER", default_value = "little")]
    byte_order: Endian,

    /// Initial read window in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    read_chunk_size: usize,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SessionKind {
    TabRestore,
    Session,
}

impl From<SessionKind> for SessionType {
    fn from(kind: SessionKind) -> Self {
        match kind {
            SessionKind::TabRestore => SessionType::TabRestore,
            SessionKind::Session => SessionType::SessionRestore,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Endian {
    Little,
    Big,
}

impl From<Endian> for ByteOrder {
    fn from(endian: Endian) -> Self {
        match endian {
            Endian::Little => ByteOrder::Little,
            Endian::Big => ByteOrder::Big,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let options = DumpOptions {
        path: cli.path,
        session_type: cli.session_type.into(),
        byte_order: cli.byte_order.into(),
        read_chunk_size: cli.read_chunk_size,
    };

    match dump::run(options, cli.format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            println!("{err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_with_defaults() {
        let cli = Cli::try_parse_from(["tabrestore", "--path", "/tmp/Last Tabs"])
            .expect("path should parse");

        assert_eq!(cli.path, PathBuf::from("/tmp/Last Tabs"));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert_eq!(cli.byte_order, Endian::Little);
        assert_eq!(cli.session_type, SessionKind::TabRestore);
        assert_eq!(cli.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
    }

    #[test]
    fn parses_explicit_options() {
        let cli = Cli::try_parse_from([
            "tabrestore",
            "--path",
            "tabs",
            "--format",
            "json",
            "--byte-order",
            "big",
            "--session-type",
            "session",
            "--log-level",
            "debug",
        ])
        .expect("options should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(ByteOrder::from(cli.byte_order), ByteOrder::Big);
        assert_eq!(SessionType::from(cli.session_type), SessionType::SessionRestore);
        assert_eq!(cli.log_level, LogLevel::Debug);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Cli::try_parse_from(["tabrestore", "--path", "tabs", "--format", "xml"])
            .expect_err("unknown format should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
