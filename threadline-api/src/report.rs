use std::{fmt, str::FromStr};

use crate::{Family, NodeId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ReportReason {
    Spoilers,
    #[serde(rename = "Abuse or harassment")]
    Abuse,
    Spam,
    #[serde(rename = "Copyright infringement")]
    Copyright,
    #[serde(rename = "Discrimination (racism, sexism, etc.)")]
    Discrimination,
    #[serde(rename = "Request to delete a comment that you created")]
    DeleteOwn,
}

impl ReportReason {
    pub const ALL: [ReportReason; 6] = [
        ReportReason::Spoilers,
        ReportReason::Abuse,
        ReportReason::Spam,
        ReportReason::Copyright,
        ReportReason::Discrimination,
        ReportReason::DeleteOwn,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            ReportReason::Spoilers => "spoilers",
            ReportReason::Abuse => "abuse",
            ReportReason::Spam => "spam",
            ReportReason::Copyright => "copyright",
            ReportReason::Discrimination => "discrimination",
            ReportReason::DeleteOwn => "delete-own",
        }
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ReportReason {
    type Err = String;

    fn from_str(s: &str) -> Result<ReportReason, String> {
        ReportReason::ALL
            .into_iter()
            .find(|r| r.keyword() == s)
            .ok_or_else(|| {
                let known = ReportReason::ALL.map(|r| r.keyword()).join(", ");
                format!("unknown report reason {s:?}, expected one of {known}")
            })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub family: Family,
    #[serde(rename = "remark_id")]
    pub node: NodeId,
    #[serde(rename = "report")]
    pub reason: ReportReason,
}

/// Acknowledgement-only answer
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Ack {
    pub success: bool,
}
