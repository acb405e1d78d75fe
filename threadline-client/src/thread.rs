use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    api::{
        ContentKind, NodeId, Page, ReactAction, ReactionCounts, ReportReason, ReviewMeta,
        SubjectRef, Verb,
    },
    composer::{self, Hint},
    Collaborator, EditSession, EditState, Error, Node, Patch, Tree,
};

/// Whether the replies of a node are shown
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expansion {
    Loading,
    Open,
    Failed(Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReactOutcome {
    pub action: ReactAction,
    /// Counts of the node after the reaction, if it is still in the tree
    pub counts: Option<ReactionCounts>,
}

struct State {
    tree: Tree,
    edit: EditSession,
    expansions: HashMap<NodeId, Expansion>,
    page: Page,
}

impl State {
    /// Forgets the expansion state of nodes that left the tree
    fn prune(&mut self) {
        let mut alive = HashSet::new();
        self.tree.walk(|n, _| {
            alive.insert(n.id);
        });
        self.expansions.retain(|id, _| alive.contains(id));
    }
}

/// Nodes for which the collaborator gave no reply count at all
fn unestimated(nodes: &[Arc<Node>]) -> Vec<NodeId> {
    nodes
        .iter()
        .filter(|n| n.child_count.exact().is_none() && n.child_count.estimated().is_none())
        .map(|n| n.id)
        .collect()
}

/// The threaded tree of one subject, and every operation on it
///
/// All methods take `&self`: the state lock is only ever held between two
/// suspension points, so any number of operations can be in flight at once
/// (eg. expanding two siblings concurrently). Each response only touches the
/// nodes it is about.
pub struct Thread<C> {
    collab: C,
    subject: SubjectRef,
    state: Mutex<State>,
}

impl<C: Collaborator> Thread<C> {
    pub fn new(collab: C) -> Thread<C> {
        let subject = collab.subject();
        Thread {
            collab,
            subject,
            state: Mutex::new(State {
                tree: Tree::new(),
                edit: EditSession::new(),
                expansions: HashMap::new(),
                page: Page::default(),
            }),
        }
    }

    pub fn collaborator(&self) -> &C {
        &self.collab
    }

    pub fn subject(&self) -> SubjectRef {
        self.subject
    }

    /// Snapshot of the tree, sharing every node with the live one
    pub fn tree(&self) -> Tree {
        self.state.lock().tree.clone()
    }

    pub fn display_count(&self, id: NodeId) -> Option<u64> {
        self.state.lock().tree.find(id).map(|n| n.display_count())
    }

    fn kind_for(&self, parent: Option<NodeId>) -> ContentKind {
        self.subject.content_kind(parent.is_none())
    }

    pub fn can_submit(&self, content: &str, parent: Option<NodeId>) -> bool {
        composer::can_submit(content, self.kind_for(parent))
    }

    pub fn hint(&self, content: &str, parent: Option<NodeId>) -> Hint {
        Hint::new(content, self.kind_for(parent))
    }

    /// Lists the roots of the subject, then probes the reply count of the
    /// roots for which the collaborator gave no estimate
    pub async fn mount(&self, page: Page) -> Result<(), Error> {
        let page = page.clamped();
        let list = self.collab.list_roots(page).await?;
        let missing = {
            let mut st = self.state.lock();
            st.page = page;
            st.tree.replace_roots(list);
            st.prune();
            unestimated(&st.tree.roots)
        };
        self.probe_counts(missing).await;
        Ok(())
    }

    /// Runs the batched reply count probe; a failure leaves the counts unknown
    async fn probe_counts(&self, ids: Vec<NodeId>) {
        if ids.is_empty() {
            return;
        }
        match self.collab.count_replies(&ids).await {
            Ok(counts) => {
                let mut st = self.state.lock();
                for (id, n) in counts {
                    st.tree.patch(id, Patch::Estimate(n));
                }
            }
            Err(e) => tracing::warn!(?e, subject=%self.subject, "failed probing reply counts"),
        }
    }

    /// Lists the roots again, on the page last mounted
    pub async fn reload_roots(&self) -> Result<(), Error> {
        let page = self.state.lock().page;
        self.mount(page).await
    }

    /// Replaces the replies of `id` with a fresh listing of all of them, then
    /// probes the reply count of those that came without one
    ///
    /// On failure the previous replies, loaded or not, are left untouched.
    pub async fn load_children(&self, id: NodeId) -> Result<(), Error> {
        let mut page = Page::largest();
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        loop {
            let batch = self.collab.load_children(id, page).await?;
            let full = batch.len() >= page.limit as usize;
            let mut grew = false;
            for n in batch {
                if seen.insert(n.id) {
                    all.push(n);
                    grew = true;
                }
            }
            if !full || !grew {
                break;
            }
            page = page.next();
        }
        let missing = {
            let mut st = self.state.lock();
            if !st.tree.patch(id, Patch::Children(all)) {
                return Ok(());
            }
            st.prune();
            st.tree
                .find(id)
                .and_then(|n| n.children.as_deref())
                .map(unestimated)
                .unwrap_or_default()
        };
        self.probe_counts(missing).await;
        Ok(())
    }

    pub async fn expand(&self, id: NodeId) -> Result<(), Error> {
        {
            let mut st = self.state.lock();
            if st.tree.find(id).is_none() {
                return Err(Error::NotFound(id));
            }
            st.expansions.insert(id, Expansion::Loading);
        }
        let res = self.load_children(id).await;
        let mut st = self.state.lock();
        // a collapse while loading wins
        if let Some(e) = st.expansions.get_mut(&id) {
            if *e == Expansion::Loading {
                *e = match &res {
                    Ok(()) => Expansion::Open,
                    Err(err) => Expansion::Failed(err.clone()),
                };
            }
        }
        res
    }

    pub fn collapse(&self, id: NodeId) {
        self.state.lock().expansions.remove(&id);
    }

    pub fn expansion(&self, id: NodeId) -> Option<Expansion> {
        self.state.lock().expansions.get(&id).cloned()
    }

    pub fn is_open(&self, id: NodeId) -> bool {
        matches!(self.expansion(id), Some(Expansion::Open))
    }

    /// Reloads whatever list `parent` designates: its replies if it is in
    /// the tree, the roots otherwise
    async fn reload_scope(&self, parent: Option<NodeId>) -> Result<(), Error> {
        let parent = parent.filter(|p| self.state.lock().tree.find(*p).is_some());
        match parent {
            Some(p) => self.load_children(p).await,
            None => self.reload_roots().await,
        }
    }

    /// Sends one reaction and brings the node's counts up to date
    ///
    /// Counts returned by the collaborator are patched in directly. Without
    /// them, the list the node belongs to is reloaded. On any failure the
    /// displayed counts stay what they were.
    pub async fn react(&self, id: NodeId, verb: Verb) -> Result<ReactOutcome, Error> {
        let parent = match self.state.lock().tree.find(id) {
            Some(n) => n.parent_id,
            None => return Err(Error::NotFound(id)),
        };
        let resp = self.collab.react(id, verb).await?;
        if !resp.success {
            return Err(Error::ServerRejected(format!("{verb} was not applied")));
        }
        if resp.action.verb() != verb {
            return Err(Error::ServerRejected(format!(
                "{verb} was answered with {:?}",
                resp.action
            )));
        }
        if resp.action.is_repeat() {
            tracing::debug!(?id, %verb, "reaction was already recorded");
        }
        match resp.data {
            Some(counts) => {
                self.state.lock().tree.patch(id, Patch::Counts(counts));
            }
            None => {
                tracing::warn!(?id, "reaction returned no counts, reloading its list");
                self.reload_scope(parent).await?;
            }
        }
        Ok(ReactOutcome {
            action: resp.action,
            counts: self.state.lock().tree.find(id).map(|n| n.counts()),
        })
    }

    /// Submits a new root, returning its id
    pub async fn submit_root(&self, content: &str) -> Result<NodeId, Error> {
        self.submit_root_with(content, None).await
    }

    /// Submits a review with its rating, only possible on a novel
    pub async fn submit_review(&self, content: &str, review: ReviewMeta) -> Result<NodeId, Error> {
        if !matches!(self.subject, SubjectRef::Novel(_)) {
            return Err(Error::ServerRejected(format!(
                "{} does not take reviews",
                self.subject
            )));
        }
        self.submit_root_with(content, Some(review)).await
    }

    async fn submit_root_with(
        &self,
        content: &str,
        review: Option<ReviewMeta>,
    ) -> Result<NodeId, Error> {
        composer::check(content, self.kind_for(None))?;
        let sub = self
            .collab
            .submit_root(String::from(content), review)
            .await?;
        match sub.node {
            Some(n) => {
                let newest_first = self.subject.newest_first();
                self.state.lock().tree.push_root(n, newest_first);
            }
            None => self.reload_roots().await?,
        }
        Ok(sub.id)
    }

    /// Submits a reply to `parent`, returning its id
    pub async fn submit_reply(&self, parent: NodeId, content: &str) -> Result<NodeId, Error> {
        composer::check(content, self.kind_for(Some(parent)))?;
        if self.state.lock().tree.find(parent).is_none() {
            return Err(Error::NotFound(parent));
        }
        let sub = self
            .collab
            .submit_reply(parent, String::from(content))
            .await?;
        match sub.node {
            Some(n) => {
                self.state.lock().tree.patch(parent, Patch::ReplyAdded(n));
            }
            None => self.load_children(parent).await?,
        }
        Ok(sub.id)
    }

    /// Starts editing `id`, abandoning any other edit of this tree
    pub fn begin_edit(&self, id: NodeId) -> Result<(), Error> {
        let mut st = self.state.lock();
        let content = match st.tree.find(id) {
            Some(n) => n.content.clone(),
            None => return Err(Error::NotFound(id)),
        };
        st.edit.begin(id, content);
        Ok(())
    }

    pub fn set_draft(&self, draft: String) -> bool {
        self.state.lock().edit.set_draft(draft)
    }

    pub fn cancel_edit(&self) {
        self.state.lock().edit.cancel()
    }

    pub fn edit_state(&self) -> EditState {
        self.state.lock().edit.state().clone()
    }

    /// Saves the current draft, returning the edited node if there was one
    ///
    /// On success the new content is patched in and the node's list is
    /// reloaded; a failure of that reload is only logged. On failure the
    /// draft goes back to the edit box.
    pub async fn save_edit(&self) -> Result<Option<NodeId>, Error> {
        let ticket = {
            let mut st = self.state.lock();
            let id = match st.edit.node() {
                Some(id) => id,
                None => return Ok(None),
            };
            let is_root = match st.tree.find(id) {
                Some(n) => n.is_root(),
                None => {
                    st.edit.cancel();
                    return Err(Error::NotFound(id));
                }
            };
            match st.edit.submit(self.subject.content_kind(is_root))? {
                Some(t) => t,
                None => return Ok(None),
            }
        };
        match self.collab.edit(ticket.node, ticket.draft.clone()).await {
            Ok(node) => {
                let parent = {
                    let mut st = self.state.lock();
                    if !st.edit.succeeded(&ticket) {
                        tracing::debug!(id=?ticket.node, "edit saved after its session was replaced");
                    }
                    st.tree.patch(
                        ticket.node,
                        Patch::Content {
                            content: node.content,
                            edited_at: node.edited_at,
                        },
                    );
                    node.parent_id
                };
                if let Err(e) = self.reload_scope(parent).await {
                    tracing::warn!(?e, id=?ticket.node, "failed reloading after edit");
                }
                Ok(Some(ticket.node))
            }
            Err(e) => {
                self.state.lock().edit.failed(ticket);
                Err(e)
            }
        }
    }

    pub async fn report(&self, id: NodeId, reason: ReportReason) -> Result<(), Error> {
        self.collab.report(id, reason).await
    }
}
