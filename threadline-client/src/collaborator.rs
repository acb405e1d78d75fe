use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    api::{self, NodeId, Page, ReactResponse, ReportReason, ReviewMeta, RootList, SubjectRef, Verb},
    Error,
};

/// Everything the engine needs from the outside world for one subject
///
/// The engine implements tree handling exactly once and is parameterized
/// over this adapter; it never knows which family of nodes it works on.
#[async_trait]
pub trait Collaborator: Send + Sync {
    fn subject(&self) -> SubjectRef;

    async fn list_roots(&self, page: Page) -> Result<RootList, Error>;

    /// Direct replies of `node`, oldest first, with their reply count estimate
    async fn load_children(&self, node: NodeId, page: Page) -> Result<Vec<api::Node>, Error>;

    /// Reply counts for many nodes at once, ids the collaborator does not
    /// know are omitted from the result
    async fn count_replies(&self, nodes: &[NodeId]) -> Result<BTreeMap<NodeId, u64>, Error>;

    /// Posts a new root; `review` only matters for the reviews of a novel
    async fn submit_root(
        &self,
        content: String,
        review: Option<ReviewMeta>,
    ) -> Result<api::Submitted, Error>;

    async fn submit_reply(&self, parent: NodeId, content: String)
        -> Result<api::Submitted, Error>;

    async fn edit(&self, node: NodeId, content: String) -> Result<api::Node, Error>;

    async fn react(&self, node: NodeId, verb: Verb) -> Result<ReactResponse, Error>;

    async fn report(&self, node: NodeId, reason: ReportReason) -> Result<(), Error>;
}
