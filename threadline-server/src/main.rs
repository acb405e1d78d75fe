use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use threadline_api::{Family, NewContent, NodeId, Page, Verb};
use threadline_mock_server::{Clock, MockServer, Seed};

mod error;
mod extractors;
mod handlers;

#[cfg(test)]
mod fuzz;

use error::Error;
use extractors::{PreAuth, Store};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(long, default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    /// JSON file with the initial users and nodes, as made by generate-test-data
    #[structopt(long)]
    seed: Option<PathBuf>,

    /// Answer submissions with the new node's id only, never the node itself
    #[structopt(long)]
    refresh_signal_only: bool,

    /// Answer reactions without the resulting counts
    #[structopt(long)]
    omit_reaction_counts: bool,
}

pub fn app(store: Store) -> Router {
    let mut router = Router::new()
        .route("/api/whoami", get(handlers::whoami))
        .route("/api/report", post(handlers::report))
        .route("/api/chapter/:id/comments", get(handlers::chapter_roots))
        .route("/api/chapter/:id/comment", post(handlers::submit_chapter))
        .route(
            "/api/chapter/:id/paragraph/:index/comments",
            get(handlers::paragraph_roots).post(handlers::submit_paragraph),
        )
        .route(
            "/api/chapter/:id/paragraph-comments",
            get(handlers::paragraph_counts),
        )
        .route("/api/news/:id/comments", get(handlers::news_roots))
        .route("/api/news/:id/comment", post(handlers::submit_news))
        .route("/api/novel/:id/reviews", get(handlers::novel_roots))
        .route("/api/novel/:id/review", post(handlers::submit_review));

    for family in Family::ALL {
        router = router
            .route(
                &family.node_path(":id"),
                put(
                    move |auth: PreAuth,
                          store: State<Store>,
                          id: Path<NodeId>,
                          data: Json<NewContent>| {
                        handlers::edit(family, auth, store, id, data)
                    },
                ),
            )
            .route(
                &family.replies_path(":id"),
                get(
                    move |store: State<Store>, id: Path<NodeId>, page: Query<Page>| {
                        handlers::load_children(family, store, id, page)
                    },
                ),
            )
            .route(
                &family.reply_path(":id"),
                post(
                    move |auth: PreAuth,
                          store: State<Store>,
                          parent: Path<NodeId>,
                          data: Json<NewContent>| {
                        handlers::submit_reply(family, auth, store, parent, data)
                    },
                ),
            )
            .route(
                &family.reply_counts_path(),
                post(move |store: State<Store>, ids: Json<Vec<NodeId>>| {
                    handlers::count_replies(family, store, ids)
                }),
            );
        for verb in [Verb::Like, Verb::Dislike] {
            router = router.route(
                &family.react_path(":id", verb),
                post(move |auth: PreAuth, store: State<Store>, id: Path<NodeId>| {
                    handlers::react(family, verb, auth, store, id)
                }),
            );
        }
    }

    router
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(store)
}

fn load_seed(path: &std::path::Path) -> anyhow::Result<Seed> {
    let data = std::fs::read(path).with_context(|| format!("reading seed file {path:?}"))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing seed file {path:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let seed = match &opt.seed {
        Some(path) => load_seed(path)?,
        None => Seed::default(),
    };
    let mut server = MockServer::from_seed(seed, Clock::System).context("loading seed")?;
    server.embed_created_nodes = !opt.refresh_signal_only;
    server.omit_reaction_counts = opt.omit_reaction_counts;
    tracing::info!(
        nodes = server.num_nodes(),
        refresh_signal_only = opt.refresh_signal_only,
        omit_reaction_counts = opt.omit_reaction_counts,
        "store ready"
    );

    let app = app(Store::new(server));

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
