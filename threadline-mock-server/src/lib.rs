use std::collections::{BTreeMap, HashMap};

use threadline_client::api::{
    self, Ack, Author, AuthToken, ChapterId, Error, Family, NodeId, Page, ReactAction,
    ReactResponse, ReactionCounts, Report, ReviewMeta, RootList, RootStats, SubjectRef, Submitted,
    Time, User, UserId, Verb,
};

mod collaborator;
pub use collaborator::MockCollaborator;

/// Where the mock server takes its timestamps from
#[derive(Clone, Debug)]
pub enum Clock {
    System,
    /// Starts at the given time and moves one second forward at each use,
    /// so that two servers fed the same operations stay identical
    Steady(Time),
}

impl Clock {
    pub fn steady() -> Clock {
        Clock::Steady(Time::default())
    }

    fn tick(&mut self) -> Time {
        match self {
            Clock::System => chrono::Utc::now(),
            Clock::Steady(t) => {
                *t += chrono::Duration::seconds(1);
                *t
            }
        }
    }
}

/// Initial contents of a server
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Seed {
    pub users: Vec<SeedUser>,
    pub nodes: Vec<api::Node>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedUser {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub token: Option<AuthToken>,
}

/// In-memory collaborator with the same semantics as the real one
pub struct MockServer {
    clock: Clock,
    users: BTreeMap<UserId, User>,
    sessions: HashMap<AuthToken, UserId>,
    nodes: BTreeMap<NodeId, api::Node>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    reactions: HashMap<(NodeId, UserId), Verb>,
    reports: Vec<(UserId, Report)>,
    next_id: u64,

    /// Answer reactions without the resulting counts, like older collaborators
    pub omit_reaction_counts: bool,

    /// Answer submissions with the created node, instead of only its id
    pub embed_created_nodes: bool,
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::with_clock(Clock::System)
    }

    pub fn with_clock(clock: Clock) -> MockServer {
        MockServer {
            clock,
            users: BTreeMap::new(),
            sessions: HashMap::new(),
            nodes: BTreeMap::new(),
            children: BTreeMap::new(),
            reactions: HashMap::new(),
            reports: Vec::new(),
            next_id: 1,
            omit_reaction_counts: false,
            embed_created_nodes: true,
        }
    }

    pub fn from_seed(seed: Seed, clock: Clock) -> Result<MockServer, Error> {
        let mut res = MockServer::with_clock(clock);
        for u in seed.users {
            res.users.insert(
                u.id,
                User {
                    id: u.id,
                    name: u.name,
                },
            );
            if let Some(token) = u.token {
                res.open_session(u.id, token)?;
            }
        }
        for mut n in seed.nodes {
            api::validate_string(&n.content)?;
            if let Some(parent) = n.parent_id {
                if !res.nodes.contains_key(&parent) {
                    return Err(Error::NotFound(parent));
                }
            }
            n.reply_count = None;
            res.next_id = res.next_id.max(n.id.0 + 1);
            res.insert(n);
        }
        tracing::debug!(
            users = res.users.len(),
            nodes = res.nodes.len(),
            "loaded seed"
        );
        Ok(res)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn reports(&self) -> &[(UserId, Report)] {
        &self.reports
    }

    pub fn create_user(&mut self, name: String) -> Result<User, Error> {
        api::validate_string(&name)?;
        let id = UserId(self.users.keys().next_back().map(|u| u.0 + 1).unwrap_or(1));
        let user = User { id, name };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn open_session(&mut self, user: UserId, token: AuthToken) -> Result<(), Error> {
        if !self.users.contains_key(&user) {
            return Err(Error::Unauthenticated);
        }
        self.sessions.insert(token, user);
        Ok(())
    }

    fn resolve(&self, token: AuthToken) -> Result<&User, Error> {
        self.sessions
            .get(&token)
            .and_then(|u| self.users.get(u))
            .ok_or(Error::Unauthenticated)
    }

    pub fn whoami(&self, token: AuthToken) -> Result<User, Error> {
        self.resolve(token).cloned()
    }

    fn insert(&mut self, n: api::Node) {
        if let Some(parent) = n.parent_id {
            self.children.entry(parent).or_default().push(n.id);
        }
        self.nodes.insert(n.id, n);
    }

    fn node(&self, family: Family, id: NodeId) -> Result<&api::Node, Error> {
        self.nodes
            .get(&id)
            .filter(|n| n.subject.family() == family)
            .ok_or(Error::NotFound(id))
    }

    fn reply_count(&self, id: NodeId) -> u64 {
        self.children.get(&id).map(|c| c.len() as u64).unwrap_or(0)
    }

    /// The node as sent on the wire, with its reply count filled in
    fn wire(&self, n: &api::Node) -> api::Node {
        let mut res = n.clone();
        res.reply_count = Some(self.reply_count(n.id));
        res
    }

    /// Replies of `id`, oldest first
    fn replies(&self, id: NodeId) -> Vec<&api::Node> {
        let mut res = self
            .children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|c| self.nodes.get(c))
            .collect::<Vec<_>>();
        res.sort_by_key(|n| (n.created_at, n.id));
        res
    }

    fn paginate(&self, nodes: &[&api::Node], page: Page) -> Vec<api::Node> {
        let page = page.clamped();
        nodes
            .iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .map(|n| self.wire(n))
            .collect()
    }

    pub fn list_roots(&self, subject: SubjectRef, page: Page) -> Result<RootList, Error> {
        if let SubjectRef::Review(review) = subject {
            let nodes = self.load_children(Family::Review, review, page)?;
            let stats = RootStats::summarize(self.replies(review));
            return Ok(RootList { nodes, stats });
        }
        let mut roots = self
            .nodes
            .values()
            .filter(|n| n.parent_id.is_none() && n.subject == subject)
            .collect::<Vec<_>>();
        roots.sort_by_key(|n| std::cmp::Reverse((n.created_at, n.id)));
        Ok(RootList {
            nodes: self.paginate(&roots, page),
            stats: RootStats::summarize(roots.iter().copied()),
        })
    }

    pub fn load_children(
        &self,
        family: Family,
        id: NodeId,
        page: Page,
    ) -> Result<Vec<api::Node>, Error> {
        self.node(family, id)?;
        Ok(self.paginate(&self.replies(id), page))
    }

    pub fn count_replies(&self, family: Family, ids: &[NodeId]) -> BTreeMap<NodeId, u64> {
        ids.iter()
            .filter(|id| self.node(family, **id).is_ok())
            .map(|id| (*id, self.reply_count(*id)))
            .collect()
    }

    pub fn paragraph_counts(&self, chapter: ChapterId) -> BTreeMap<u32, u64> {
        let mut res = BTreeMap::new();
        for n in self.nodes.values().filter(|n| n.parent_id.is_none()) {
            if let SubjectRef::Paragraph { chapter: c, index } = n.subject {
                if c == chapter {
                    *res.entry(index).or_insert(0) += 1;
                }
            }
        }
        res
    }

    fn create(
        &mut self,
        user: UserId,
        subject: SubjectRef,
        parent_id: Option<NodeId>,
        content: String,
        review: Option<ReviewMeta>,
    ) -> Result<Submitted, Error> {
        api::validate_content(&content, subject.content_kind(parent_id.is_none()))?;
        let author = self
            .users
            .get(&user)
            .map(|u| Author {
                id: u.id,
                name: u.name.clone(),
                is_author: false,
                is_vip: false,
                avatar: None,
            })
            .ok_or(Error::Unauthenticated)?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let node = api::Node {
            id,
            subject,
            parent_id,
            author,
            content,
            created_at: self.clock.tick(),
            edited_at: None,
            like_count: 0,
            dislike_count: 0,
            reply_count: None,
            review,
        };
        let sent = self.wire(&node);
        self.insert(node);
        tracing::debug!(?id, ?parent_id, %subject, "created node");
        Ok(Submitted {
            id,
            node: self.embed_created_nodes.then_some(sent),
        })
    }

    pub fn submit_root(
        &mut self,
        token: AuthToken,
        subject: SubjectRef,
        content: String,
        review: Option<ReviewMeta>,
    ) -> Result<Submitted, Error> {
        let user = self.resolve(token)?.id;
        match subject {
            SubjectRef::Review(review) => {
                self.submit_reply(token, Family::Review, review, content)
            }
            SubjectRef::Novel(_) => {
                let review = review.unwrap_or(ReviewMeta {
                    rating: None,
                    is_recommended: false,
                });
                self.create(user, subject, None, content, Some(review))
            }
            _ => self.create(user, subject, None, content, None),
        }
    }

    pub fn submit_reply(
        &mut self,
        token: AuthToken,
        family: Family,
        parent: NodeId,
        content: String,
    ) -> Result<Submitted, Error> {
        let user = self.resolve(token)?.id;
        let subject = self.node(family, parent)?.subject;
        self.create(user, subject, Some(parent), content, None)
    }

    /// Replaces the content of a node, which only its author may do
    pub fn edit(
        &mut self,
        token: AuthToken,
        family: Family,
        id: NodeId,
        content: String,
    ) -> Result<api::Node, Error> {
        let user = self.resolve(token)?.id;
        let node = self.node(family, id)?;
        if node.author.id != user {
            return Err(Error::PermissionDenied);
        }
        api::validate_content(&content, node.subject.content_kind(node.parent_id.is_none()))?;
        let edited_at = self.clock.tick();
        let node = self.nodes.get_mut(&id).ok_or(Error::NotFound(id))?;
        node.content = content;
        node.edited_at = Some(edited_at);
        let node = node.clone();
        Ok(self.wire(&node))
    }

    /// Records the viewer's reaction, at most one per viewer and node
    ///
    /// Repeating a reaction changes nothing; reacting the other way moves
    /// the reaction, and both counters, in one go.
    pub fn react(
        &mut self,
        token: AuthToken,
        family: Family,
        id: NodeId,
        verb: Verb,
    ) -> Result<ReactResponse, Error> {
        let user = self.resolve(token)?.id;
        self.node(family, id)?;
        let previous = self.reactions.insert((id, user), verb);
        let node = self.nodes.get_mut(&id).ok_or(Error::NotFound(id))?;
        let already = previous == Some(verb);
        if !already {
            if let Some(prev) = previous {
                *counter(node, prev) -= 1;
            }
            *counter(node, verb) += 1;
        }
        let counts = ReactionCounts {
            like_count: node.like_count,
            dislike_count: node.dislike_count,
        };
        Ok(ReactResponse {
            success: true,
            action: ReactAction::new(verb, already),
            data: (!self.omit_reaction_counts).then_some(counts),
        })
    }

    pub fn report(&mut self, token: AuthToken, report: Report) -> Result<Ack, Error> {
        let user = self.resolve(token)?.id;
        match self.nodes.get(&report.node) {
            None => return Err(Error::InvalidReport(String::from("Invalid remark_id"))),
            Some(n) if n.subject.family() != report.family => {
                return Err(Error::InvalidReport(String::from("Invalid type")))
            }
            Some(_) => (),
        }
        self.reports.push((user, report));
        Ok(Ack { success: true })
    }
}

fn counter(node: &mut api::Node, verb: Verb) -> &mut u64 {
    match verb {
        Verb::Like => &mut node.like_count,
        Verb::Dislike => &mut node.dislike_count,
    }
}
