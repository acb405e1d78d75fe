use std::fmt;

use crate::{
    api::{self, ContentKind},
    Error,
};

/// Whether `content` is long enough to be submitted as `kind`
///
/// Pure, meant to be called on every keystroke.
pub fn can_submit(content: &str, kind: ContentKind) -> bool {
    kind.accepts(content)
}

/// Validation run right before anything reaches the collaborator
pub fn check(content: &str, kind: ContentKind) -> Result<(), Error> {
    match api::validate_content(content, kind) {
        Ok(()) => Ok(()),
        Err(api::Error::ContentTooShort { min, got }) => Err(Error::Validation { min, got }),
        Err(e) => Err(Error::ServerRejected(e.to_string())),
    }
}

/// Length hint shown next to the composer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Hint {
    pub chars: usize,
    pub min: usize,
}

impl Hint {
    pub fn new(content: &str, kind: ContentKind) -> Hint {
        Hint {
            chars: api::content_length(content),
            min: kind.min_length(),
        }
    }

    pub fn is_enough(&self) -> bool {
        self.chars >= self.min
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} characters, minimum {}", self.chars, self.min)
    }
}
