use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use threadline_client::{
    api::{
        self, AuthToken, NodeId, Page, ReactResponse, Report, ReportReason, ReviewMeta, RootList,
        SubjectRef, Verb,
    },
    Collaborator, Error,
};

use crate::MockServer;

/// `Collaborator` talking to a `MockServer` in the same process
///
/// Every call yields to the runtime first, so that concurrent engine
/// operations actually interleave. Failures can be injected with
/// `fail_next`, and the calls that reached the server are recorded.
#[derive(Clone)]
pub struct MockCollaborator {
    server: Arc<Mutex<MockServer>>,
    subject: SubjectRef,
    token: Option<AuthToken>,
    failures: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl MockCollaborator {
    pub fn new(
        server: Arc<Mutex<MockServer>>,
        subject: SubjectRef,
        token: Option<AuthToken>,
    ) -> MockCollaborator {
        MockCollaborator {
            server,
            subject,
            token,
            failures: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn server(&self) -> &Arc<Mutex<MockServer>> {
        &self.server
    }

    /// Makes the next `n` calls fail as if the network was down
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Names of the operations that reached the server, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear()
    }

    async fn io(&self, op: &'static str) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!(op, "injecting network failure");
            return Err(Error::TransientNetwork(format!("{op}: connection reset")));
        }
        self.calls.lock().push(op);
        Ok(())
    }

    fn token(&self) -> Result<AuthToken, Error> {
        self.token.ok_or(Error::AuthRequired)
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    fn subject(&self) -> SubjectRef {
        self.subject
    }

    async fn list_roots(&self, page: Page) -> Result<RootList, Error> {
        self.io("list_roots").await?;
        Ok(self.server.lock().list_roots(self.subject, page)?)
    }

    async fn load_children(&self, node: NodeId, page: Page) -> Result<Vec<api::Node>, Error> {
        self.io("load_children").await?;
        Ok(self
            .server
            .lock()
            .load_children(self.subject.family(), node, page)?)
    }

    async fn count_replies(&self, nodes: &[NodeId]) -> Result<BTreeMap<NodeId, u64>, Error> {
        self.io("count_replies").await?;
        Ok(self.server.lock().count_replies(self.subject.family(), nodes))
    }

    async fn submit_root(
        &self,
        content: String,
        review: Option<ReviewMeta>,
    ) -> Result<api::Submitted, Error> {
        let token = self.token()?;
        self.io("submit_root").await?;
        Ok(self
            .server
            .lock()
            .submit_root(token, self.subject, content, review)?)
    }

    async fn submit_reply(
        &self,
        parent: NodeId,
        content: String,
    ) -> Result<api::Submitted, Error> {
        let token = self.token()?;
        self.io("submit_reply").await?;
        Ok(self
            .server
            .lock()
            .submit_reply(token, self.subject.family(), parent, content)?)
    }

    async fn edit(&self, node: NodeId, content: String) -> Result<api::Node, Error> {
        let token = self.token()?;
        self.io("edit").await?;
        Ok(self
            .server
            .lock()
            .edit(token, self.subject.family(), node, content)?)
    }

    async fn react(&self, node: NodeId, verb: Verb) -> Result<ReactResponse, Error> {
        let token = self.token()?;
        self.io("react").await?;
        Ok(self
            .server
            .lock()
            .react(token, self.subject.family(), node, verb)?)
    }

    async fn report(&self, node: NodeId, reason: ReportReason) -> Result<(), Error> {
        let token = self.token()?;
        self.io("report").await?;
        let report = Report {
            family: self.subject.family(),
            node,
            reason,
        };
        self.server.lock().report(token, report)?;
        Ok(())
    }
}
