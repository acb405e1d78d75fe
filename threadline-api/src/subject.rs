use std::{fmt, str::FromStr};

use crate::ContentKind;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct ChapterId(pub u64);

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct NewsId(pub u64);

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct NovelId(pub u64);

/// Which node table a node lives in
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    #[serde(rename = "comment")]
    ChapterComment,
    NewsComment,
    ParagraphComment,
    Review,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::ChapterComment,
        Family::NewsComment,
        Family::ParagraphComment,
        Family::Review,
    ];

    fn prefix(&self) -> &'static str {
        match self {
            Family::ChapterComment => "/api/comment",
            Family::NewsComment => "/api/newscomment",
            Family::ParagraphComment => "/api/paragraph-comment",
            Family::Review => "/api/review",
        }
    }

    // The path builders take any Display so that the server can pass in its
    // route placeholders and share the exact same paths.

    pub fn node_path(&self, id: impl fmt::Display) -> String {
        format!("{}/{}", self.prefix(), id)
    }

    pub fn replies_path(&self, id: impl fmt::Display) -> String {
        match self {
            Family::Review => format!("{}/{}/comments", self.prefix(), id),
            _ => format!("{}/{}/replies", self.prefix(), id),
        }
    }

    pub fn reply_path(&self, id: impl fmt::Display) -> String {
        match self {
            Family::Review => format!("{}/{}/comment", self.prefix(), id),
            _ => format!("{}/{}/reply", self.prefix(), id),
        }
    }

    pub fn react_path(&self, id: impl fmt::Display, verb: impl fmt::Display) -> String {
        format!("{}/{}/{}", self.prefix(), id, verb)
    }

    pub fn reply_counts_path(&self) -> String {
        format!("{}/reply-counts", self.prefix())
    }
}

/// What a root list belongs to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRef {
    Chapter(ChapterId),
    News(NewsId),
    Paragraph { chapter: ChapterId, index: u32 },
    /// Roots are the reviews of a novel
    Novel(NovelId),
    /// Roots are the direct replies of one review
    Review(crate::NodeId),
}

impl SubjectRef {
    pub fn family(&self) -> Family {
        match self {
            SubjectRef::Chapter(_) => Family::ChapterComment,
            SubjectRef::News(_) => Family::NewsComment,
            SubjectRef::Paragraph { .. } => Family::ParagraphComment,
            SubjectRef::Novel(_) | SubjectRef::Review(_) => Family::Review,
        }
    }

    /// Kind of content of a node in this subject's tree
    pub fn content_kind(&self, is_root: bool) -> ContentKind {
        match (self, is_root) {
            (_, false) | (SubjectRef::Review(_), true) => ContentKind::Reply,
            (SubjectRef::Novel(_), true) => ContentKind::Review,
            (_, true) => ContentKind::Comment,
        }
    }

    /// Roots are listed newest first, except replies which read oldest first
    pub fn newest_first(&self) -> bool {
        !matches!(self, SubjectRef::Review(_))
    }

    pub fn roots_path(&self) -> String {
        match self {
            SubjectRef::Chapter(c) => format!("/api/chapter/{}/comments", c.0),
            SubjectRef::News(n) => format!("/api/news/{}/comments", n.0),
            SubjectRef::Paragraph { chapter, index } => {
                format!("/api/chapter/{}/paragraph/{}/comments", chapter.0, index)
            }
            SubjectRef::Novel(n) => format!("/api/novel/{}/reviews", n.0),
            SubjectRef::Review(r) => Family::Review.replies_path(r),
        }
    }

    pub fn submit_path(&self) -> String {
        match self {
            SubjectRef::Chapter(c) => format!("/api/chapter/{}/comment", c.0),
            SubjectRef::News(n) => format!("/api/news/{}/comment", n.0),
            SubjectRef::Paragraph { .. } => self.roots_path(),
            SubjectRef::Novel(n) => format!("/api/novel/{}/review", n.0),
            SubjectRef::Review(r) => Family::Review.reply_path(r),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectRef::Chapter(c) => write!(f, "chapter:{}", c.0),
            SubjectRef::News(n) => write!(f, "news:{}", n.0),
            SubjectRef::Paragraph { chapter, index } => {
                write!(f, "paragraph:{}:{}", chapter.0, index)
            }
            SubjectRef::Novel(n) => write!(f, "novel:{}", n.0),
            SubjectRef::Review(r) => write!(f, "review:{}", r.0),
        }
    }
}

impl FromStr for SubjectRef {
    type Err = String;

    fn from_str(s: &str) -> Result<SubjectRef, String> {
        let parts = s.split(':').collect::<Vec<_>>();
        let num = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| format!("{p:?} in subject {s:?} is not a number"))
        };
        match parts.as_slice() {
            ["chapter", c] => Ok(SubjectRef::Chapter(ChapterId(num(*c)?))),
            ["news", n] => Ok(SubjectRef::News(NewsId(num(*n)?))),
            ["paragraph", c, i] => Ok(SubjectRef::Paragraph {
                chapter: ChapterId(num(*c)?),
                index: u32::try_from(num(*i)?)
                    .map_err(|_| format!("paragraph index in {s:?} is too large"))?,
            }),
            ["novel", n] => Ok(SubjectRef::Novel(NovelId(num(*n)?))),
            ["review", r] => Ok(SubjectRef::Review(crate::NodeId(num(*r)?))),
            _ => Err(format!(
                "unknown subject {s:?}, expected chapter:ID, news:ID, paragraph:CHAPTER:INDEX, novel:ID or review:ID"
            )),
        }
    }
}
