use std::sync::Arc;

use crate::{
    api::{self, Author, NodeId, ReactionCounts, ReviewMeta, SubjectRef, Time},
    ChildCount,
};

/// A node of the in-memory tree
///
/// `children` is `None` until the replies have been loaded at least once,
/// which is distinct from a loaded node without replies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub subject: SubjectRef,
    pub parent_id: Option<NodeId>,
    pub author: Author,
    pub content: String,
    pub created_at: Time,
    pub edited_at: Option<Time>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub review: Option<ReviewMeta>,

    pub child_count: ChildCount,
    pub children: Option<Vec<Arc<Node>>>,
}

impl From<api::Node> for Node {
    fn from(n: api::Node) -> Node {
        Node {
            id: n.id,
            subject: n.subject,
            parent_id: n.parent_id,
            author: n.author,
            content: n.content,
            created_at: n.created_at,
            edited_at: n.edited_at,
            like_count: n.like_count,
            dislike_count: n.dislike_count,
            review: n.review,
            child_count: ChildCount::from_estimate(n.reply_count),
            children: None,
        }
    }
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn counts(&self) -> ReactionCounts {
        ReactionCounts {
            like_count: self.like_count,
            dislike_count: self.dislike_count,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    pub fn display_count(&self) -> u64 {
        self.child_count.display()
    }
}
