mod content;
pub use content::{content_length, ContentKind};

mod error;
pub use error::Error;

mod node;
pub use node::{Author, Node, NodeId, ReviewMeta, Submitted};

mod page;
pub use page::{Page, ReviewStats, RootList, RootStats, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

mod reaction;
pub use reaction::{ReactAction, ReactResponse, ReactionCounts, Verb};

mod report;
pub use report::{Ack, Report, ReportReason};

mod subject;
pub use subject::{ChapterId, Family, NewsId, NovelId, SubjectRef};

mod user;
pub use user::{AuthToken, User, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewContent {
    pub content: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewReview {
    pub content: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub is_recommended: bool,
}

// The validate functions are there to refuse input that the storage layer
// could not faithfully round-trip, independently of any business rule.
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Validates both the storage constraints and the minimum length for `kind`
pub fn validate_content(s: &str, kind: ContentKind) -> Result<(), Error> {
    validate_string(s)?;
    kind.check(s)
}
