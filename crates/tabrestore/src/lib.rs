//! Decode Chrome tab restore and session command logs.
//!
//! # Crate Structure
//!
//! - [`pickle`]: Chrome's aligned binary serialization (buffer and cursor)
//! - [`command`]: command frames and the command log reader/writer
//! - [`navigation`]: pickled navigation entries and `UPDATE_TAB_NAVIGATION`

/// Re-export pickle types.
pub mod pickle {
    pub use tabrestore_pickle::*;
}

/// Re-export command log types.
pub mod command {
    pub use tabrestore_command::*;
}

/// Re-export navigation types.
pub mod navigation {
    pub use tabrestore_navigation::*;
}
