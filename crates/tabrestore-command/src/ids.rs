//! Command ids written by the tab restore service.
//!
//! Only [`UPDATE_TAB_NAVIGATION`] payloads are decoded; the other ids are
//! recognized so callers can skip them quietly.

/// Which service wrote the command log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionType {
    SessionRestore,
    #[default]
    TabRestore,
}

/// A tab id followed by a pickled navigation entry.
pub const UPDATE_TAB_NAVIGATION: u8 = 1;

pub const RESTORED_ENTRY: u8 = 2;

pub const WINDOW: u8 = 3;

pub const SELECTED_NAVIGATION_IN_TAB: u8 = 4;

pub const PINNED_STATE: u8 = 5;

pub const SET_EXTENSION_APP_ID: u8 = 6;

pub const SET_WINDOW_APP_NAME: u8 = 7;

pub const SET_TAB_USER_AGENT_OVERRIDE: u8 = 8;

/// Reserved id Chrome writes for commands it could not classify.
pub const UNKNOWN: u8 = 9;

/// Returns a human-readable name for a tab restore command id.
pub fn command_name(id: u8) -> Option<&'static str> {
    let name = match id {
        UPDATE_TAB_NAVIGATION => "UPDATE_TAB_NAVIGATION",
        RESTORED_ENTRY => "RESTORED_ENTRY",
        WINDOW => "WINDOW",
        SELECTED_NAVIGATION_IN_TAB => "SELECTED_NAVIGATION_IN_TAB",
        PINNED_STATE => "PINNED_STATE",
        SET_EXTENSION_APP_ID => "SET_EXTENSION_APP_ID",
        SET_WINDOW_APP_NAME => "SET_WINDOW_APP_NAME",
        SET_TAB_USER_AGENT_OVERRIDE => "SET_TAB_USER_AGENT_OVERRIDE",
        UNKNOWN => "UNKNOWN",
        _ => return None,
    };
    Some(name)
}

/// Returns true if the id belongs to the tab restore command table.
pub fn is_known(id: u8) -> bool {
    command_name(id).is_some()
}
