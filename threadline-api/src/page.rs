use crate::{Node, ReviewMeta};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Page {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Page {
    fn default() -> Page {
        Page {
            page: first_page(),
            limit: default_limit(),
        }
    }
}

impl Page {
    /// A page as large as the collaborator will serve
    pub fn largest() -> Page {
        Page {
            page: 1,
            limit: MAX_PAGE_SIZE,
        }
    }

    /// Brings out-of-range values back to what the collaborator serves
    pub fn clamped(self) -> Page {
        Page {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn next(self) -> Page {
        Page {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }

    pub fn offset(&self) -> usize {
        let p = self.clamped();
        (p.page as usize - 1) * p.limit as usize
    }

    pub fn query(&self) -> [(&'static str, u32); 2] {
        [("page", self.page), ("limit", self.limit)]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RootStats {
    pub total: u64,
    /// Rounded percentage of roots that got at least one like
    pub like_rate: u8,
    pub total_likes: u64,
    /// Only set when some of the roots are reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<ReviewStats>,
}

/// Aggregates over the ratings and recommendations of reviews
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReviewStats {
    pub count: u64,
    /// Reviews that came with a rating
    pub rated_count: u64,
    pub rating_total: u64,
    pub recommended_count: u64,
}

impl ReviewStats {
    pub fn add(&mut self, review: &ReviewMeta) {
        self.count += 1;
        if let Some(r) = review.rating {
            self.rated_count += 1;
            self.rating_total += r as u64;
        }
        if review.is_recommended {
            self.recommended_count += 1;
        }
    }

    pub fn average_rating(&self) -> Option<f64> {
        match self.rated_count {
            0 => None,
            n => Some(self.rating_total as f64 / n as f64),
        }
    }

    /// Rounded percentage of reviews that recommend the novel
    pub fn recommendation_rate(&self) -> u8 {
        percent(self.recommended_count, self.count)
    }
}

fn percent(part: u64, total: u64) -> u8 {
    match total {
        0 => 0,
        _ => ((part * 200 + total) / (total * 2)) as u8,
    }
}

impl RootStats {
    pub fn summarize<'a, I>(nodes: I) -> RootStats
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let (mut total, mut liked, mut total_likes) = (0u64, 0u64, 0u64);
        let mut reviews = None;
        for n in nodes {
            total += 1;
            total_likes += n.like_count;
            if n.like_count > 0 {
                liked += 1;
            }
            if let Some(r) = &n.review {
                reviews.get_or_insert_with(ReviewStats::default).add(r);
            }
        }
        RootStats {
            total,
            like_rate: percent(liked, total),
            total_likes,
            reviews,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RootList {
    pub nodes: Vec<Node>,
    #[serde(flatten)]
    pub stats: RootStats,
}
