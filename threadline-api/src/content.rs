use crate::Error;

/// What a piece of content is, which decides how long it must be
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Comment,
    Reply,
    Review,
}

impl ContentKind {
    pub fn min_length(&self) -> usize {
        match self {
            ContentKind::Comment => 10,
            ContentKind::Reply => 10,
            ContentKind::Review => 100,
        }
    }

    pub fn accepts(&self, content: &str) -> bool {
        content_length(content) >= self.min_length()
    }

    pub fn check(&self, content: &str) -> Result<(), Error> {
        let got = content_length(content);
        let min = self.min_length();
        match got >= min {
            true => Ok(()),
            false => Err(Error::ContentTooShort { min, got }),
        }
    }
}

/// Number of characters that count towards the minimum length
pub fn content_length(content: &str) -> usize {
    content.trim().chars().count()
}
