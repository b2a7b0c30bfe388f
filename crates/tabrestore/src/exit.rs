use std::fmt;

use tabrestore_command::FrameError;
use tabrestore_navigation::NavigationError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;

pub const READ_FAILED: &str = "Could not read commands from tabs file.";

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn read_error(err: FrameError) -> CliError {
    CliError::new(FAILURE, format!("{READ_FAILED}\ncause: {err}"))
}

pub fn navigation_error(err: NavigationError) -> CliError {
    match err {
        NavigationError::TabId(source) => {
            CliError::new(FAILURE, format!("Could not read tab id: {source}"))
        }
        NavigationError::MissingPayload { id } => {
            CliError::new(FAILURE, format!("Could not create pickle for command {id}."))
        }
        other => CliError::new(FAILURE, other.to_string()),
    }
}

pub fn write_error(err: std::io::Error) -> CliError {
    CliError::new(FAILURE, format!("failed to write output: {err}"))
}
