mod collaborator;
pub use collaborator::Collaborator;

mod composer;
pub use composer::Hint;

mod count;
pub use count::ChildCount;

mod edit;
pub use edit::{EditSession, EditState, SaveTicket};

mod error;
pub use error::Error;

pub mod http;

mod node;
pub use node::Node;

mod thread;
pub use thread::{Expansion, ReactOutcome, Thread};

mod tree;
pub use tree::{Patch, Tree};

pub mod api {
    pub use threadline_api::*;
}
