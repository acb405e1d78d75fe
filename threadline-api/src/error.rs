use anyhow::{anyhow, Context};
use serde_json::json;

use crate::NodeId;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Please login first")]
    Unauthenticated,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Node {0} does not exist")]
    NotFound(NodeId),

    #[error("Content must be at least {min} characters, got {got}")]
    ContentTooShort { min: usize, got: usize },

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("{0}")]
    Rejected(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ContentTooShort { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidReport(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::Unauthenticated => json!({
                "message": "please login first",
                "type": "unauthenticated",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(id) => json!({
                "message": "node does not exist",
                "type": "not-found",
                "id": id,
            }),
            Error::ContentTooShort { min, got } => json!({
                "message": format!("content must be at least {min} characters"),
                "type": "content-too-short",
                "min": min,
                "got": got,
            }),
            Error::InvalidReport(why) => json!({
                "message": why,
                "type": "invalid-report",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::Rejected(msg) => json!({
                "message": msg,
                "type": "rejected",
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = || {
            String::from(
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )
        };
        let number = |field: &str| {
            data.get(field)
                .and_then(|n| n.as_u64())
                .ok_or_else(|| anyhow!("error field {field:?} is not a number"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(message()),
                "unauthenticated" => Error::Unauthenticated,
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(NodeId(number("id")?)),
                "content-too-short" => Error::ContentTooShort {
                    min: number("min")? as usize,
                    got: number("got")? as usize,
                },
                "invalid-report" => Error::InvalidReport(message()),
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "rejected" => Error::Rejected(message()),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
