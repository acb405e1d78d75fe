use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Like,
    Dislike,
}

impl Verb {
    /// Path segment of the react endpoint
    pub fn segment(&self) -> &'static str {
        match self {
            Verb::Like => "like",
            Verb::Dislike => "dislike",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Verb, String> {
        match s {
            "like" => Ok(Verb::Like),
            "dislike" => Ok(Verb::Dislike),
            _ => Err(format!("unknown reaction {s:?}, expected like or dislike")),
        }
    }
}

/// What the collaborator did with a reaction
///
/// `Liked` and `Disliked` are also reported when the viewer switched from the
/// opposite reaction, in which case both counters moved.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactAction {
    Liked,
    AlreadyLiked,
    Disliked,
    AlreadyDisliked,
}

impl ReactAction {
    pub fn new(verb: Verb, already: bool) -> ReactAction {
        match (verb, already) {
            (Verb::Like, false) => ReactAction::Liked,
            (Verb::Like, true) => ReactAction::AlreadyLiked,
            (Verb::Dislike, false) => ReactAction::Disliked,
            (Verb::Dislike, true) => ReactAction::AlreadyDisliked,
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            ReactAction::Liked | ReactAction::AlreadyLiked => Verb::Like,
            ReactAction::Disliked | ReactAction::AlreadyDisliked => Verb::Dislike,
        }
    }

    pub fn is_repeat(&self) -> bool {
        matches!(self, ReactAction::AlreadyLiked | ReactAction::AlreadyDisliked)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReactionCounts {
    #[serde(rename = "likeCount", alias = "like_count", alias = "likes")]
    pub like_count: u64,
    #[serde(rename = "dislikeCount", alias = "dislike_count", alias = "dislikes")]
    pub dislike_count: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReactResponse {
    pub success: bool,
    pub action: ReactAction,

    /// Authoritative counts after the reaction, omitted by older collaborators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReactionCounts>,
}
