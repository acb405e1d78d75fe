//! `Collaborator` talking to a threadline server over HTTP

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::{
    api::{
        self, AuthToken, ChapterId, NodeId, Page, ReactResponse, Report, ReportReason, ReviewMeta,
        RootList, RootStats, SubjectRef, User, Verb,
    },
    Collaborator, Error,
};

const MAX_RETRIES: u32 = 3;

pub struct HttpCollaborator {
    host: String,
    subject: SubjectRef,
    token: Option<AuthToken>,
    // Requests that are not safe to send twice must not go through `retrying`
    plain: reqwest::Client,
    retrying: ClientWithMiddleware,
}

impl HttpCollaborator {
    pub fn new(host: String, subject: SubjectRef, token: Option<AuthToken>) -> HttpCollaborator {
        let plain = reqwest::Client::new();
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let retrying = ClientBuilder::new(plain.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        HttpCollaborator {
            host,
            subject,
            token,
            plain,
            retrying,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn paged(&self, path: &str, page: Page) -> String {
        let query = page
            .clamped()
            .query()
            .map(|(k, v)| format!("{k}={v}"))
            .join("&");
        format!("{}{}?{}", self.host, path, query)
    }

    fn token(&self) -> Result<&AuthToken, Error> {
        self.token.as_ref().ok_or(Error::AuthRequired)
    }

    async fn get<T>(&self, url: String) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!(%url, "GET");
        parse(self.retrying.get(url).send().await?).await
    }

    /// Sends an idempotent authenticated write, retrying transient failures
    async fn idempotent<B, T>(&self, method: reqwest::Method, url: String, body: &B) -> Result<T, Error>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!(%method, %url, "idempotent write");
        let body = serde_json::to_vec(body).map_err(|e| Error::ServerRejected(e.to_string()))?;
        let mut req = self
            .retrying
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.0);
        }
        parse(req.send().await?).await
    }

    /// Sends a write at most once
    async fn post_once<B, T>(&self, url: String, body: &B) -> Result<T, Error>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!(%url, "POST");
        let resp = self
            .plain
            .post(url)
            .bearer_auth(self.token()?.0)
            .json(body)
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn whoami(&self) -> Result<User, Error> {
        let resp = self
            .plain
            .get(self.url("/api/whoami"))
            .bearer_auth(self.token()?.0)
            .send()
            .await?;
        parse(resp).await
    }

    /// Number of comments on each paragraph of `chapter` that has any
    pub async fn paragraph_comment_counts(
        &self,
        chapter: ChapterId,
    ) -> Result<BTreeMap<u32, u64>, Error> {
        self.get(self.url(&format!("/api/chapter/{}/paragraph-comments", chapter.0)))
            .await
    }
}

async fn parse<T>(resp: reqwest::Response) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
{
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let body = resp.bytes().await?;
    match api::Error::parse(&body) {
        Ok(e) => Err(Error::from(e)),
        Err(e) if status.is_server_error() => {
            tracing::warn!(?e, %status, "server failed without a typed error");
            Err(Error::TransientNetwork(format!("server returned {status}")))
        }
        Err(e) => {
            tracing::warn!(?e, %status, "server refused request without a typed error");
            Err(Error::ServerRejected(format!("server returned {status}")))
        }
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    fn subject(&self) -> SubjectRef {
        self.subject
    }

    async fn list_roots(&self, page: Page) -> Result<RootList, Error> {
        let url = self.paged(&self.subject.roots_path(), page);
        match self.subject {
            // the replies of a review come without stats
            SubjectRef::Review(_) => {
                let nodes: Vec<api::Node> = self.get(url).await?;
                let stats = RootStats::summarize(&nodes);
                Ok(RootList { nodes, stats })
            }
            _ => self.get(url).await,
        }
    }

    async fn load_children(&self, node: NodeId, page: Page) -> Result<Vec<api::Node>, Error> {
        let path = self.subject.family().replies_path(node);
        self.get(self.paged(&path, page)).await
    }

    async fn count_replies(&self, nodes: &[NodeId]) -> Result<BTreeMap<NodeId, u64>, Error> {
        let url = self.url(&self.subject.family().reply_counts_path());
        self.idempotent(reqwest::Method::POST, url, &nodes).await
    }

    async fn submit_root(
        &self,
        content: String,
        review: Option<ReviewMeta>,
    ) -> Result<api::Submitted, Error> {
        let url = self.url(&self.subject.submit_path());
        match self.subject {
            SubjectRef::Novel(_) => {
                let review = api::NewReview {
                    content,
                    rating: review.and_then(|r| r.rating),
                    is_recommended: review.map_or(false, |r| r.is_recommended),
                };
                self.post_once(url, &review).await
            }
            _ => self.post_once(url, &api::NewContent { content }).await,
        }
    }

    async fn submit_reply(
        &self,
        parent: NodeId,
        content: String,
    ) -> Result<api::Submitted, Error> {
        let url = self.url(&self.subject.family().reply_path(parent));
        self.post_once(url, &api::NewContent { content }).await
    }

    async fn edit(&self, node: NodeId, content: String) -> Result<api::Node, Error> {
        self.token()?;
        let url = self.url(&self.subject.family().node_path(node));
        self.idempotent(reqwest::Method::PUT, url, &api::NewContent { content })
            .await
    }

    async fn react(&self, node: NodeId, verb: Verb) -> Result<ReactResponse, Error> {
        self.token()?;
        let url = self.url(&self.subject.family().react_path(node, verb));
        let resp: ReactResponse = self.idempotent(reqwest::Method::POST, url, &()).await?;
        if !resp.success {
            return Err(Error::ServerRejected(format!("{verb} on {node} was refused")));
        }
        Ok(resp)
    }

    async fn report(&self, node: NodeId, reason: ReportReason) -> Result<(), Error> {
        let report = Report {
            family: self.subject.family(),
            node,
            reason,
        };
        let ack: api::Ack = self.post_once(self.url("/api/report"), &report).await?;
        match ack.success {
            true => Ok(()),
            false => Err(Error::ServerRejected(String::from("report was not accepted"))),
        }
    }
}
