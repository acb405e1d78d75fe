use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::{self, NodeId, ReactionCounts, ReviewStats, RootList, RootStats, Time},
    Node,
};

/// A change to exactly one node, addressed by id
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// Authoritative reaction counts, as returned by a reaction
    Counts(ReactionCounts),

    /// New content after an edit, never touches replies or counts
    Content {
        content: String,
        edited_at: Option<Time>,
    },

    /// Full list of direct replies, replacing any previous one
    Children(Vec<api::Node>),

    /// Reply count obtained without loading the replies
    Estimate(u64),

    /// A reply that was just submitted to this node
    ReplyAdded(api::Node),
}

/// Threaded tree of one subject
///
/// Nodes are shared behind `Arc`s: patching a node copies the path from the
/// root to it, and every subtree off that path stays pointer-equal to the one
/// in the previous version of the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    pub roots: Vec<Arc<Node>>,
    pub stats: RootStats,
}

impl Tree {
    pub fn new() -> Tree {
        Tree::default()
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        find_in(&self.roots, id)
    }

    /// Applies `patch` to node `id`, returning whether the node was found
    ///
    /// A node that is not in the tree (eg. deleted meanwhile) is not an
    /// error: the patch is dropped and the tree is left untouched.
    pub fn patch(&mut self, id: NodeId, patch: Patch) -> bool {
        if let Patch::Estimate(_) = patch {
            match self.find(id) {
                None => return false,
                // nothing would change, keep the path shared
                Some(n) if n.child_count.exact().is_some() => return true,
                Some(_) => (),
            }
        }
        match self.node_mut(id) {
            Some(node) => {
                apply(node, patch);
                true
            }
            None => {
                tracing::debug!(?id, "dropping patch for node not in tree");
                false
            }
        }
    }

    pub fn patched(&self, id: NodeId, patch: Patch) -> Tree {
        let mut res = self.clone();
        res.patch(id, patch);
        res
    }

    /// Replaces the root list, keeping the loaded replies of surviving roots
    pub fn replace_roots(&mut self, list: RootList) {
        self.roots = merge_list(&self.roots, list.nodes);
        self.stats = list.stats;
    }

    /// Adds a just-submitted root, at the top of the list if roots are
    /// listed newest first and at the bottom otherwise
    pub fn push_root(&mut self, node: api::Node, newest_first: bool) -> bool {
        if self.roots.iter().any(|r| r.id == node.id) {
            return false;
        }
        self.stats.total += 1;
        if let Some(r) = &node.review {
            self.stats
                .reviews
                .get_or_insert_with(ReviewStats::default)
                .add(r);
        }
        let node = Arc::new(Node::from(node));
        match newest_first {
            true => self.roots.insert(0, node),
            false => self.roots.push(node),
        }
        true
    }

    /// Calls `f` on every node with its depth, parents before their replies
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize),
    {
        walk_in(&self.roots, 0, &mut f)
    }

    pub fn len(&self) -> usize {
        let mut res = 0;
        self.walk(|_, _| res += 1);
        res
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let path = path_to(&self.roots, id)?;
        let (first, rest) = path.split_first()?;
        let mut node = Arc::make_mut(self.roots.get_mut(*first)?);
        for i in rest {
            node = Arc::make_mut(node.children.as_mut()?.get_mut(*i)?);
        }
        Some(node)
    }
}

fn apply(node: &mut Node, patch: Patch) {
    match patch {
        Patch::Counts(c) => {
            node.like_count = c.like_count;
            node.dislike_count = c.dislike_count;
        }
        Patch::Content { content, edited_at } => {
            node.content = content;
            node.edited_at = edited_at;
        }
        Patch::Children(list) => {
            let merged = merge_list(node.children.as_deref().unwrap_or(&[]), list);
            node.child_count.set_exact(merged.len() as u64);
            node.children = Some(merged);
        }
        Patch::Estimate(n) => {
            node.child_count.offer_estimate(n);
        }
        Patch::ReplyAdded(reply) => match &mut node.children {
            Some(children) => {
                if !children.iter().any(|c| c.id == reply.id) {
                    children.push(Arc::new(Node::from(reply)));
                }
                node.child_count.set_exact(children.len() as u64);
            }
            None => node.child_count.bump_estimate(),
        },
    }
}

/// Builds the new version of a node list from a fresh server listing
///
/// The listing decides which nodes exist and in which order. Nodes that were
/// already there keep their loaded replies, and stay the very same `Arc` when
/// nothing about them changed.
fn merge_list(old: &[Arc<Node>], fresh: Vec<api::Node>) -> Vec<Arc<Node>> {
    let old = old.iter().map(|n| (n.id, n)).collect::<HashMap<_, _>>();
    let mut seen = HashSet::with_capacity(fresh.len());
    fresh
        .into_iter()
        .filter(|n| seen.insert(n.id))
        .map(|n| {
            let mut new = Node::from(n);
            match old.get(&new.id) {
                None => Arc::new(new),
                Some(prev) => {
                    if let Some(children) = &prev.children {
                        new.children = Some(children.clone());
                        new.child_count.set_exact(children.len() as u64);
                    }
                    if prev.as_ref() == &new {
                        Arc::clone(prev)
                    } else {
                        Arc::new(new)
                    }
                }
            }
        })
        .collect()
}

fn find_in(nodes: &[Arc<Node>], id: NodeId) -> Option<&Node> {
    for n in nodes {
        if n.id == id {
            return Some(n);
        }
        if let Some(res) = n.children.as_deref().and_then(|c| find_in(c, id)) {
            return Some(res);
        }
    }
    None
}

fn path_to(nodes: &[Arc<Node>], id: NodeId) -> Option<Vec<usize>> {
    for (i, n) in nodes.iter().enumerate() {
        if n.id == id {
            return Some(vec![i]);
        }
        if let Some(mut path) = n.children.as_deref().and_then(|c| path_to(c, id)) {
            path.insert(0, i);
            return Some(path);
        }
    }
    None
}

fn walk_in<F>(nodes: &[Arc<Node>], depth: usize, f: &mut F)
where
    F: FnMut(&Node, usize),
{
    for n in nodes {
        f(n, depth);
        if let Some(children) = &n.children {
            walk_in(children, depth + 1, f);
        }
    }
}
