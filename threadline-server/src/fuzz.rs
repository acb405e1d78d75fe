use std::{collections::BTreeMap, fmt::Debug, panic::AssertUnwindSafe};

use axum::{
    extract::FromRequestParts,
    http::{self, request},
};
use threadline_api::{
    Ack, AuthToken, ChapterId, Error as ApiError, Family, NewContent, NewReview, NewsId, Node,
    NodeId, NovelId, Page, ReactResponse, Report, ReportReason, ReviewMeta, RootList, SubjectRef,
    Submitted, User, Uuid, Verb,
};
use tower::{Service, ServiceExt};

use crate::*;

macro_rules! do_tokio_test {
    ( $name:ident, generator: $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
    ( $name:ident, $typ:ty, $fn:expr ) => {
        do_tokio_test!($name, generator: bolero::generator::gen::<$typ>(), $fn);
    };
}

do_tokio_test!(fuzz_preauth_extractor, String, |token| async move {
    if let Ok(req) = http::Request::builder()
        .method(http::Method::GET)
        .uri("/")
        .header(http::header::AUTHORIZATION, token)
        .body(())
    {
        let mut req = req.into_parts().0;
        let res = PreAuth::from_request_parts(&mut req, &()).await;
        match res {
            Ok(_) => (),
            Err(Error::Api(ApiError::Unauthenticated)) => (),
            Err(e) => panic!("got unexpected error: {e}"),
        }
    }
});

// Few enough ids that generated operations often hit existing nodes
fn node(n: u8) -> NodeId {
    NodeId(n as u64 % 32)
}

fn subject(kind: u8, a: u8, b: u8) -> SubjectRef {
    match kind % 5 {
        0 => SubjectRef::Chapter(ChapterId(a as u64 % 4)),
        1 => SubjectRef::News(NewsId(a as u64 % 4)),
        2 => SubjectRef::Paragraph {
            chapter: ChapterId(a as u64 % 4),
            index: b as u32 % 8,
        },
        3 => SubjectRef::Novel(NovelId(a as u64 % 4)),
        _ => SubjectRef::Review(node(a)),
    }
}

fn family(n: u8) -> Family {
    Family::ALL[n as usize % Family::ALL.len()]
}

/// Generated material for one operation: a selector, three small numbers,
/// an optional session, a flag and some text
type RawOp = (u8, u8, u8, u8, Option<u8>, bool, String);

#[derive(Clone, Debug)]
enum FuzzOp {
    Whoami {
        sid: Option<u8>,
    },
    ListRoots {
        subject: SubjectRef,
        page: u8,
        limit: u8,
    },
    LoadChildren {
        family: Family,
        node: NodeId,
        page: u8,
        limit: u8,
    },
    CountReplies {
        family: Family,
        nodes: Vec<NodeId>,
    },
    ParagraphCounts {
        chapter: ChapterId,
    },
    SubmitRoot {
        sid: Option<u8>,
        subject: SubjectRef,
        content: String,
        review: ReviewMeta,
    },
    SubmitReply {
        sid: Option<u8>,
        family: Family,
        parent: NodeId,
        content: String,
    },
    Edit {
        sid: Option<u8>,
        family: Family,
        node: NodeId,
        content: String,
    },
    React {
        sid: Option<u8>,
        family: Family,
        node: NodeId,
        verb: Verb,
    },
    Report {
        sid: Option<u8>,
        report: Report,
    },
}

impl FuzzOp {
    fn decode((kind, a, b, c, sid, flag, text): RawOp) -> FuzzOp {
        let short = || text.chars().take(20).collect::<String>();
        match kind % 10 {
            0 => FuzzOp::Whoami { sid },
            1 => FuzzOp::ListRoots {
                subject: subject(a, b, c),
                page: b % 4,
                limit: c,
            },
            2 => FuzzOp::LoadChildren {
                family: family(a),
                node: node(b),
                page: c % 4,
                limit: c,
            },
            3 => FuzzOp::CountReplies {
                family: family(a),
                nodes: text.bytes().take(8).map(node).collect(),
            },
            4 => FuzzOp::ParagraphCounts {
                chapter: ChapterId(a as u64 % 4),
            },
            5 => FuzzOp::SubmitRoot {
                sid,
                subject: subject(a, b, c),
                content: text.chars().take(120).collect(),
                review: ReviewMeta {
                    rating: Some(c % 6).filter(|r| *r > 0),
                    is_recommended: flag,
                },
            },
            6 => FuzzOp::SubmitReply {
                sid,
                family: family(a),
                parent: node(b),
                content: short(),
            },
            7 => FuzzOp::Edit {
                sid,
                family: family(a),
                node: node(b),
                content: short(),
            },
            8 => FuzzOp::React {
                sid,
                family: family(a),
                node: node(b),
                verb: match flag {
                    true => Verb::Like,
                    false => Verb::Dislike,
                },
            },
            _ => FuzzOp::Report {
                sid,
                report: Report {
                    family: family(a),
                    node: node(b),
                    reason: ReportReason::ALL[c as usize % ReportReason::ALL.len()],
                },
            },
        }
    }
}

async fn call<Resp>(
    app: &mut Router,
    req: request::Request<axum::body::Body>,
) -> Result<Resp, ApiError>
where
    Resp: for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status == http::StatusCode::OK {
        return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            panic!("failed parsing resp body: {err}, body is {body:?}")
        }));
    }
    Err(ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}")))
}

async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    token: Option<AuthToken>,
    body: Option<&Req>,
) -> Result<Resp, ApiError>
where
    Req: serde::Serialize,
    Resp: for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new().method(method).uri(uri);
    let req = match token {
        Some(token) => req.header(http::header::AUTHORIZATION, format!("bearer {}", token.0)),
        None => req,
    };
    let req = match body {
        Some(body) => req
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(body).expect("serializing request body to json"),
            )),
        None => req.body(axum::body::Body::empty()),
    }
    .expect("building request");
    call(app, req).await
}

fn compare<T>(name: &str, app_res: Result<T, ApiError>, mock_res: Result<T, ApiError>)
where
    T: Debug + PartialEq,
{
    assert_eq!(
        app_res, mock_res,
        "app and mock did not return the same result for {name}"
    );
}

fn paged(path: String, page: u8, limit: u8) -> (String, Page) {
    let page = Page {
        page: page as u32,
        limit: limit as u32,
    };
    (format!("{path}?page={}&limit={}", page.page, page.limit), page)
}

struct ComparativeFuzzer {
    app: Router,
    mock: MockServer,
    tokens: Vec<AuthToken>,
}

impl ComparativeFuzzer {
    fn new() -> ComparativeFuzzer {
        let mut app_server = MockServer::with_clock(Clock::steady());
        let mut mock = MockServer::with_clock(Clock::steady());
        let mut tokens = Vec::new();
        for name in ["alice", "bob", "carol"] {
            let token = AuthToken(Uuid::new_v4());
            for s in [&mut app_server, &mut mock] {
                let user = s.create_user(String::from(name)).expect("creating user");
                s.open_session(user.id, token).expect("opening session");
            }
            tokens.push(token);
        }
        ComparativeFuzzer {
            app: app(Store::new(app_server)),
            mock,
            tokens,
        }
    }

    fn token(&self, sid: Option<u8>) -> Option<AuthToken> {
        sid.map(|s| self.tokens[s as usize % self.tokens.len()])
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        const NOBODY: Option<&()> = None;
        match op {
            FuzzOp::Whoami { sid } => {
                let tok = self.token(sid);
                compare::<User>(
                    "Whoami",
                    run_on_app(&mut self.app, "GET", "/api/whoami", tok, NOBODY).await,
                    self.mock.whoami(tok.unwrap_or_else(AuthToken::stub)),
                )
            }
            FuzzOp::ListRoots {
                subject,
                page,
                limit,
            } => {
                let (uri, page) = paged(subject.roots_path(), page, limit);
                match subject {
                    // the replies of a review come as a bare list
                    SubjectRef::Review(_) => compare::<Vec<Node>>(
                        "ListRoots",
                        run_on_app(&mut self.app, "GET", &uri, None, NOBODY).await,
                        self.mock.list_roots(subject, page).map(|l| l.nodes),
                    ),
                    _ => compare::<RootList>(
                        "ListRoots",
                        run_on_app(&mut self.app, "GET", &uri, None, NOBODY).await,
                        self.mock.list_roots(subject, page),
                    ),
                }
            }
            FuzzOp::LoadChildren {
                family,
                node,
                page,
                limit,
            } => {
                let (uri, page) = paged(family.replies_path(node), page, limit);
                compare::<Vec<Node>>(
                    "LoadChildren",
                    run_on_app(&mut self.app, "GET", &uri, None, NOBODY).await,
                    self.mock.load_children(family, node, page),
                )
            }
            FuzzOp::CountReplies { family, nodes } => compare::<BTreeMap<NodeId, u64>>(
                "CountReplies",
                run_on_app(
                    &mut self.app,
                    "POST",
                    &family.reply_counts_path(),
                    None,
                    Some(&nodes),
                )
                .await,
                Ok(self.mock.count_replies(family, &nodes)),
            ),
            FuzzOp::ParagraphCounts { chapter } => {
                let uri = format!("/api/chapter/{}/paragraph-comments", chapter.0);
                compare::<BTreeMap<u32, u64>>(
                    "ParagraphCounts",
                    run_on_app(&mut self.app, "GET", &uri, None, NOBODY).await,
                    Ok(self.mock.paragraph_counts(chapter)),
                )
            }
            FuzzOp::SubmitRoot {
                sid,
                subject,
                content,
                review,
            } => {
                let tok = self.token(sid);
                let uri = subject.submit_path();
                let (app_res, review) = match subject {
                    SubjectRef::Novel(_) => {
                        let body = NewReview {
                            content: content.clone(),
                            rating: review.rating,
                            is_recommended: review.is_recommended,
                        };
                        let res = run_on_app(&mut self.app, "POST", &uri, tok, Some(&body)).await;
                        (res, Some(review))
                    }
                    _ => {
                        let body = NewContent {
                            content: content.clone(),
                        };
                        let res = run_on_app(&mut self.app, "POST", &uri, tok, Some(&body)).await;
                        (res, None)
                    }
                };
                compare::<Submitted>(
                    "SubmitRoot",
                    app_res,
                    self.mock.submit_root(
                        tok.unwrap_or_else(AuthToken::stub),
                        subject,
                        content,
                        review,
                    ),
                )
            }
            FuzzOp::SubmitReply {
                sid,
                family,
                parent,
                content,
            } => {
                let tok = self.token(sid);
                let body = NewContent {
                    content: content.clone(),
                };
                let uri = family.reply_path(parent);
                compare::<Submitted>(
                    "SubmitReply",
                    run_on_app(&mut self.app, "POST", &uri, tok, Some(&body)).await,
                    self.mock.submit_reply(
                        tok.unwrap_or_else(AuthToken::stub),
                        family,
                        parent,
                        content,
                    ),
                )
            }
            FuzzOp::Edit {
                sid,
                family,
                node,
                content,
            } => {
                let tok = self.token(sid);
                let body = NewContent {
                    content: content.clone(),
                };
                let uri = family.node_path(node);
                compare::<Node>(
                    "Edit",
                    run_on_app(&mut self.app, "PUT", &uri, tok, Some(&body)).await,
                    self.mock
                        .edit(tok.unwrap_or_else(AuthToken::stub), family, node, content),
                )
            }
            FuzzOp::React {
                sid,
                family,
                node,
                verb,
            } => {
                let tok = self.token(sid);
                let uri = family.react_path(node, verb);
                compare::<ReactResponse>(
                    "React",
                    run_on_app(&mut self.app, "POST", &uri, tok, NOBODY).await,
                    self.mock
                        .react(tok.unwrap_or_else(AuthToken::stub), family, node, verb),
                )
            }
            FuzzOp::Report { sid, report } => {
                let tok = self.token(sid);
                compare::<Ack>(
                    "Report",
                    run_on_app(&mut self.app, "POST", "/api/report", tok, Some(&report)).await,
                    self.mock
                        .report(tok.unwrap_or_else(AuthToken::stub), report.clone()),
                )
            }
        }
    }
}

do_tokio_test!(
    compare_with_mock,
    generator: bolero::generator::gen_with::<Vec<RawOp>>().len(1..100usize),
    |test: Vec<RawOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new();
        for op in test {
            fuzzer.execute_fuzz_op(FuzzOp::decode(op)).await;
        }
    }
);
