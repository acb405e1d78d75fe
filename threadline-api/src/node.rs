use std::fmt;

use crate::{SubjectRef, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,

    /// Set when the author wrote the work this thread is about
    #[serde(default)]
    pub is_author: bool,

    #[serde(default)]
    pub is_vip: bool,

    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReviewMeta {
    pub rating: Option<u8>,
    pub is_recommended: bool,
}

/// One comment, reply or review, as sent by the collaborator
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Node {
    pub id: NodeId,
    pub subject: SubjectRef,
    pub parent_id: Option<NodeId>,
    pub author: Author,
    pub content: String,
    pub created_at: Time,
    #[serde(default)]
    pub edited_at: Option<Time>,
    pub like_count: u64,
    pub dislike_count: u64,

    /// Number of direct replies as known by the collaborator when it answered
    #[serde(default)]
    pub reply_count: Option<u64>,

    #[serde(default)]
    pub review: Option<ReviewMeta>,
}

/// Answer to a root or reply submission
///
/// When `node` is missing, the caller is expected to reload the parent's
/// scope to see the new entry.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Submitted {
    pub id: NodeId,
    #[serde(default)]
    pub node: Option<Node>,
}
