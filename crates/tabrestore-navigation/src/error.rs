use tabrestore_pickle::PickleError;

/// Errors that can occur while decoding or encoding navigation commands.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// A mandatory navigation field could not be read.
    #[error("failed to read navigation {field}: {source}")]
    Field {
        field: &'static str,
        source: PickleError,
    },

    /// The tab id that leads a navigation update could not be read.
    #[error("failed to read tab id: {0}")]
    TabId(PickleError),

    /// The command carries no usable pickle.
    #[error("command {id} has no pickled payload")]
    MissingPayload { id: u8 },

    /// The command is not a navigation update.
    #[error("command {id} is not a navigation update")]
    UnexpectedCommand { id: u8 },

    /// Writing a navigation failed.
    #[error("failed to write navigation: {0}")]
    Pickle(#[from] PickleError),

    /// The written navigation does not fit in a command.
    #[error("failed to build navigation command: {0}")]
    Command(#[from] tabrestore_command::FrameError),
}

pub type Result<T> = std::result::Result<T, NavigationError>;
