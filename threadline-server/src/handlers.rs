use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use threadline_api::{
    Ack, ChapterId, Family, NewContent, NewReview, NewsId, Node, NodeId, NovelId, Page,
    ReactResponse, Report, ReviewMeta, RootList, SubjectRef, Submitted, User, Verb,
};

use crate::{extractors::*, Error};

pub async fn whoami(
    PreAuth(token): PreAuth,
    State(store): State<Store>,
) -> Result<Json<User>, Error> {
    let user = store.read().await.whoami(token)?;
    Ok(Json(user))
}

async fn roots(store: &Store, subject: SubjectRef, page: Page) -> Result<Json<RootList>, Error> {
    Ok(Json(store.read().await.list_roots(subject, page)?))
}

pub async fn chapter_roots(
    State(store): State<Store>,
    Path(id): Path<ChapterId>,
    Query(page): Query<Page>,
) -> Result<Json<RootList>, Error> {
    roots(&store, SubjectRef::Chapter(id), page).await
}

pub async fn news_roots(
    State(store): State<Store>,
    Path(id): Path<NewsId>,
    Query(page): Query<Page>,
) -> Result<Json<RootList>, Error> {
    roots(&store, SubjectRef::News(id), page).await
}

pub async fn paragraph_roots(
    State(store): State<Store>,
    Path((chapter, index)): Path<(ChapterId, u32)>,
    Query(page): Query<Page>,
) -> Result<Json<RootList>, Error> {
    roots(&store, SubjectRef::Paragraph { chapter, index }, page).await
}

pub async fn novel_roots(
    State(store): State<Store>,
    Path(id): Path<NovelId>,
    Query(page): Query<Page>,
) -> Result<Json<RootList>, Error> {
    roots(&store, SubjectRef::Novel(id), page).await
}

pub async fn paragraph_counts(
    State(store): State<Store>,
    Path(chapter): Path<ChapterId>,
) -> Json<BTreeMap<u32, u64>> {
    let counts = store.read().await.paragraph_counts(chapter);
    Json(counts)
}

async fn submit_root(
    store: &Store,
    PreAuth(token): PreAuth,
    subject: SubjectRef,
    content: String,
    review: Option<ReviewMeta>,
) -> Result<Json<Submitted>, Error> {
    Ok(Json(
        store
            .write()
            .await
            .submit_root(token, subject, content, review)?,
    ))
}

pub async fn submit_chapter(
    auth: PreAuth,
    State(store): State<Store>,
    Path(id): Path<ChapterId>,
    Json(data): Json<NewContent>,
) -> Result<Json<Submitted>, Error> {
    submit_root(&store, auth, SubjectRef::Chapter(id), data.content, None).await
}

pub async fn submit_news(
    auth: PreAuth,
    State(store): State<Store>,
    Path(id): Path<NewsId>,
    Json(data): Json<NewContent>,
) -> Result<Json<Submitted>, Error> {
    submit_root(&store, auth, SubjectRef::News(id), data.content, None).await
}

pub async fn submit_paragraph(
    auth: PreAuth,
    State(store): State<Store>,
    Path((chapter, index)): Path<(ChapterId, u32)>,
    Json(data): Json<NewContent>,
) -> Result<Json<Submitted>, Error> {
    let subject = SubjectRef::Paragraph { chapter, index };
    submit_root(&store, auth, subject, data.content, None).await
}

pub async fn submit_review(
    auth: PreAuth,
    State(store): State<Store>,
    Path(id): Path<NovelId>,
    Json(data): Json<NewReview>,
) -> Result<Json<Submitted>, Error> {
    let meta = ReviewMeta {
        rating: data.rating,
        is_recommended: data.is_recommended,
    };
    submit_root(&store, auth, SubjectRef::Novel(id), data.content, Some(meta)).await
}

// The handlers below are shared by every family, the routes bind `family`

pub async fn load_children(
    family: Family,
    State(store): State<Store>,
    Path(id): Path<NodeId>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Node>>, Error> {
    let nodes = store.read().await.load_children(family, id, page)?;
    Ok(Json(nodes))
}

pub async fn count_replies(
    family: Family,
    State(store): State<Store>,
    Json(ids): Json<Vec<NodeId>>,
) -> Json<BTreeMap<NodeId, u64>> {
    let counts = store.read().await.count_replies(family, &ids);
    Json(counts)
}

pub async fn submit_reply(
    family: Family,
    PreAuth(token): PreAuth,
    State(store): State<Store>,
    Path(parent): Path<NodeId>,
    Json(data): Json<NewContent>,
) -> Result<Json<Submitted>, Error> {
    let res = store
        .write()
        .await
        .submit_reply(token, family, parent, data.content)?;
    Ok(Json(res))
}

pub async fn edit(
    family: Family,
    PreAuth(token): PreAuth,
    State(store): State<Store>,
    Path(id): Path<NodeId>,
    Json(data): Json<NewContent>,
) -> Result<Json<Node>, Error> {
    let node = store.write().await.edit(token, family, id, data.content)?;
    Ok(Json(node))
}

pub async fn react(
    family: Family,
    verb: Verb,
    PreAuth(token): PreAuth,
    State(store): State<Store>,
    Path(id): Path<NodeId>,
) -> Result<Json<ReactResponse>, Error> {
    let res = store.write().await.react(token, family, id, verb)?;
    Ok(Json(res))
}

pub async fn report(
    PreAuth(token): PreAuth,
    State(store): State<Store>,
    Json(data): Json<Report>,
) -> Result<Json<Ack>, Error> {
    let ack = store.write().await.report(token, data)?;
    Ok(Json(ack))
}
