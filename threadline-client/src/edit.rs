use crate::{
    api::{ContentKind, NodeId},
    composer, Error,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EditState {
    Idle,
    Editing { node: NodeId, draft: String },
    /// The draft is kept so that a failed save can restore it
    Saving { node: NodeId, draft: String },
}

/// Proof that a save was started, to be handed back with its outcome
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaveTicket {
    pub node: NodeId,
    pub draft: String,
    generation: u64,
}

/// The single in-place edit of a tree
///
/// Each `begin` or `cancel` starts a new generation, so that the outcome of
/// a save belonging to an abandoned session is recognized and ignored.
#[derive(Clone, Debug)]
pub struct EditSession {
    state: EditState,
    generation: u64,
}

impl Default for EditSession {
    fn default() -> EditSession {
        EditSession::new()
    }
}

impl EditSession {
    pub fn new() -> EditSession {
        EditSession {
            state: EditState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn node(&self) -> Option<NodeId> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing { node, .. } | EditState::Saving { node, .. } => Some(*node),
        }
    }

    /// Starts editing `node`, silently dropping any other edit
    pub fn begin(&mut self, node: NodeId, content: String) {
        if let Some(prev) = self.node() {
            tracing::debug!(?prev, ?node, "abandoning previous edit");
        }
        self.generation += 1;
        self.state = EditState::Editing {
            node,
            draft: content,
        };
    }

    /// Returns false if there is no draft to update
    pub fn set_draft(&mut self, new: String) -> bool {
        match &mut self.state {
            EditState::Editing { draft, .. } => {
                *draft = new;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = EditState::Idle;
    }

    /// Moves to `Saving` if the draft is long enough for `kind`
    ///
    /// Returns `Ok(None)` when there is nothing to save. On validation
    /// failure the session stays in `Editing` with its draft.
    pub fn submit(&mut self, kind: ContentKind) -> Result<Option<SaveTicket>, Error> {
        let (node, draft) = match &self.state {
            EditState::Editing { node, draft } => (*node, draft.clone()),
            _ => return Ok(None),
        };
        composer::check(&draft, kind)?;
        self.state = EditState::Saving {
            node,
            draft: draft.clone(),
        };
        Ok(Some(SaveTicket {
            node,
            draft,
            generation: self.generation,
        }))
    }

    /// Returns whether `ticket` was still the current session
    pub fn succeeded(&mut self, ticket: &SaveTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = EditState::Idle;
        true
    }

    /// Puts the draft back for the user to retry, if the session is current
    pub fn failed(&mut self, ticket: SaveTicket) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.state = EditState::Editing {
            node: ticket.node,
            draft: ticket.draft,
        };
        true
    }

    fn is_current(&self, ticket: &SaveTicket) -> bool {
        self.generation == ticket.generation
            && matches!(&self.state, EditState::Saving { node, .. } if *node == ticket.node)
    }
}
