//! Navigation entries as Chrome pickles them into session commands.
//!
//! The entry format grew over several schema revisions. Decoding reads the
//! mandatory leading fields strictly and every later field only as far as the
//! payload goes; see [`SchemaRevision`].

pub mod error;
pub mod record;
pub mod referrer;
pub mod transition;
pub mod update;

pub use error::{NavigationError, Result};
pub use record::{NavigationRecord, SchemaRevision, HAS_POST_DATA};
pub use referrer::{Referrer, ReferrerPolicy};
pub use transition::{CoreTransition, PageTransition};
pub use update::UpdateTabNavigation;
