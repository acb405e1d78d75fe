use crate::api::{self, NodeId};

/// Failure of an engine operation
///
/// Every operation that fails leaves the tree as it was before the call.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Content must be at least {min} characters, got {got}")]
    Validation { min: usize, got: usize },

    #[error("Please login first")]
    AuthRequired,

    #[error("Node {0} does not exist")]
    NotFound(NodeId),

    #[error("Network error, please retry: {0}")]
    TransientNetwork(String),

    #[error("{0}")]
    ServerRejected(String),
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientNetwork(_))
    }

    /// Whether the error should be shown to the user at all
    ///
    /// A vanished node is not an error from the user's perspective, it just
    /// disappears on the next reload of its scope.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::NotFound(_))
    }
}

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        match e {
            api::Error::Unauthenticated => Error::AuthRequired,
            api::Error::NotFound(id) => Error::NotFound(id),
            api::Error::ContentTooShort { min, got } => Error::Validation { min, got },
            e => Error::ServerRejected(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::TransientNetwork(e.to_string())
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Error {
        Error::TransientNetwork(e.to_string())
    }
}
