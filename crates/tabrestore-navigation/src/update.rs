use tabrestore_command::ids::UPDATE_TAB_NAVIGATION;
use tabrestore_command::CommandFrame;
use tabrestore_pickle::{ByteOrder, Pickle, PickleCursor};
use tracing::debug;

use crate::error::{NavigationError, Result};
use crate::record::NavigationRecord;

/// Payload of an `UPDATE_TAB_NAVIGATION` command: the owning tab and the
/// navigation entry itself.
#[derive(Debug, Clone)]
pub struct UpdateTabNavigation {
    pub tab_id: i32,
    pub navigation: NavigationRecord,
}

impl UpdateTabNavigation {
    pub fn new(tab_id: i32, navigation: NavigationRecord) -> Self {
        Self { tab_id, navigation }
    }

    /// Decode a navigation update from a command's pickled contents.
    pub fn from_command(command: &CommandFrame, order: ByteOrder) -> Result<Self> {
        if command.id() != UPDATE_TAB_NAVIGATION {
            return Err(NavigationError::UnexpectedCommand { id: command.id() });
        }

        let pickle = command.as_pickle_with_order(order);
        if !pickle.is_valid() {
            return Err(NavigationError::MissingPayload { id: command.id() });
        }

        let mut cursor = PickleCursor::new(&pickle);
        let tab_id = cursor.read_i32().map_err(NavigationError::TabId)?;
        let navigation = NavigationRecord::read_from(&mut cursor)?;
        debug!(
            tab_id,
            index = navigation.index,
            revision = ?navigation.revision,
            "decoded navigation update"
        );
        Ok(Self { tab_id, navigation })
    }

    /// Encode as an `UPDATE_TAB_NAVIGATION` command.
    pub fn to_command(&self, order: ByteOrder) -> Result<CommandFrame> {
        let mut pickle = Pickle::with_byte_order(order);
        pickle.write_i32(self.tab_id)?;
        self.navigation.write_to(&mut pickle)?;
        Ok(CommandFrame::from_pickle(UPDATE_TAB_NAVIGATION, &pickle)?)
    }
}
