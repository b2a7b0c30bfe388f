use std::time::SystemTime;

use tabrestore_pickle::{Pickle, PickleCursor, PickleError};
use tracing::{trace, warn};

use crate::error::{NavigationError, Result};
use crate::referrer::{Referrer, ReferrerPolicy};
use crate::transition::PageTransition;

/// `type_mask` bit set when the navigation carried POST data.
pub const HAS_POST_DATA: i32 = 1;

/// On-disk revisions of the navigation pickle, oldest first.
///
/// Each revision appends one field to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaRevision {
    /// index, virtual URL, title, content state, transition type.
    Base,
    /// Adds `type_mask` (bit 0: has POST data).
    TypeMask,
    /// Adds the referrer URL.
    ReferrerUrl,
    /// Adds the referrer policy.
    ReferrerPolicy,
    /// Adds the original request URL.
    OriginalRequestUrl,
    /// Adds the user agent override flag.
    UserAgentOverride,
}

impl SchemaRevision {
    pub const LATEST: SchemaRevision = SchemaRevision::UserAgentOverride;
}

/// A navigation entry as persisted by the session and tab restore services.
#[derive(Debug, Clone)]
pub struct NavigationRecord {
    /// Position in the tab's navigation list; only meaningful when non-negative.
    pub index: i32,
    pub virtual_url: String,
    pub title: String,
    /// Renderer state blob, kept opaque.
    pub content_state: Vec<u8>,
    pub transition_type: PageTransition,
    pub has_post_data: bool,
    /// `None` when the payload predates `type_mask`.
    pub referrer: Option<Referrer>,
    pub original_request_url: String,
    pub is_overriding_user_agent: bool,
    /// When the record was decoded; the format does not persist a timestamp.
    pub timestamp: SystemTime,
    /// Newest revision whose fields were present.
    pub revision: SchemaRevision,
}

impl Default for NavigationRecord {
    fn default() -> Self {
        Self {
            index: -1,
            virtual_url: String::new(),
            title: String::new(),
            content_state: Vec::new(),
            transition_type: PageTransition::default(),
            has_post_data: false,
            referrer: None,
            original_request_url: String::new(),
            is_overriding_user_agent: false,
            timestamp: SystemTime::now(),
            revision: SchemaRevision::Base,
        }
    }
}

impl NavigationRecord {
    /// Whether `index` refers to a real position.
    pub fn is_valid(&self) -> bool {
        self.index >= 0
    }

    /// Decode a navigation from `cursor`.
    ///
    /// The five base fields are required. Later fields are read in order until
    /// the first one that is missing or malformed; it and everything after it
    /// keep their defaults while the fields already read stay as decoded.
    pub fn read_from(cursor: &mut PickleCursor<'_>) -> Result<Self> {
        let index = cursor.read_i32().map_err(field("index"))?;
        let virtual_url = cursor.read_string().map_err(field("virtual_url"))?;
        let title = cursor.read_string16().map_err(field("title"))?;
        let content_state = cursor.read_data().map_err(field("content_state"))?.to_vec();
        let transition_type = cursor.read_i32().map_err(field("transition_type"))?;

        let mut record = Self {
            index,
            virtual_url,
            title,
            content_state,
            transition_type: PageTransition::from(transition_type),
            ..Self::default()
        };

        record.read_optional_fields(cursor);
        Ok(record)
    }

    /// Returns `None` at the first optional field that could not be read.
    fn read_optional_fields(&mut self, cursor: &mut PickleCursor<'_>) -> Option<()> {
        let type_mask = optional(cursor.read_i32(), "type_mask")?;
        self.revision = SchemaRevision::TypeMask;
        self.has_post_data = type_mask & HAS_POST_DATA != 0;
        self.referrer = Some(Referrer::default());

        let url = optional(cursor.read_string(), "referrer_url")?;
        self.referrer = Some(Referrer::new(url, ReferrerPolicy::default()));
        self.revision = SchemaRevision::ReferrerUrl;

        let policy = optional(cursor.read_i32(), "referrer_policy")?;
        if let Some(referrer) = self.referrer.as_mut() {
            referrer.policy = ReferrerPolicy::from(policy);
        }
        self.revision = SchemaRevision::ReferrerPolicy;

        self.original_request_url = optional(cursor.read_string(), "original_request_url")?;
        self.revision = SchemaRevision::OriginalRequestUrl;

        self.is_overriding_user_agent = optional(cursor.read_bool(), "is_overriding_user_agent")?;
        self.revision = SchemaRevision::UserAgentOverride;
        Some(())
    }

    /// Encode the navigation in the latest schema revision.
    pub fn write_to(&self, pickle: &mut Pickle<'_>) -> Result<()> {
        self.write_revision(pickle, SchemaRevision::LATEST)
    }

    /// Encode the navigation as a writer of `revision` would have.
    pub fn write_revision(&self, pickle: &mut Pickle<'_>, revision: SchemaRevision) -> Result<()> {
        pickle.write_i32(self.index)?;
        pickle.write_string(&self.virtual_url)?;
        pickle.write_string16(&self.title)?;
        pickle.write_data(&self.content_state)?;
        pickle.write_i32(i32::from(self.transition_type))?;

        let referrer = self.referrer.clone().unwrap_or_default();
        if revision >= SchemaRevision::TypeMask {
            let type_mask = if self.has_post_data { HAS_POST_DATA } else { 0 };
            pickle.write_i32(type_mask)?;
        }
        if revision >= SchemaRevision::ReferrerUrl {
            pickle.write_string(&referrer.url)?;
        }
        if revision >= SchemaRevision::ReferrerPolicy {
            pickle.write_i32(i32::from(referrer.policy))?;
        }
        if revision >= SchemaRevision::OriginalRequestUrl {
            pickle.write_string(&self.original_request_url)?;
        }
        if revision >= SchemaRevision::UserAgentOverride {
            pickle.write_bool(self.is_overriding_user_agent)?;
        }
        Ok(())
    }
}

fn field(name: &'static str) -> impl FnOnce(PickleError) -> NavigationError {
    move |source| NavigationError::Field { field: name, source }
}

fn optional<T>(result: tabrestore_pickle::Result<T>, name: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_truncation() => {
            trace!(field = name, error = %err, "optional navigation field absent");
            None
        }
        Err(err) => {
            warn!(field = name, error = %err, "malformed optional navigation field");
            None
        }
    }
}
