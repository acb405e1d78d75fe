use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{self, request},
};
use threadline_api::{AuthToken, Uuid};
use threadline_mock_server::MockServer;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Error;

/// Shared node store behind the routes
#[derive(Clone)]
pub struct Store(Arc<RwLock<MockServer>>);

impl Store {
    pub fn new(server: MockServer) -> Store {
        Store(Arc::new(RwLock::new(server)))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, MockServer> {
        self.0.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, MockServer> {
        self.0.write().await
    }
}

/// Bearer token of the request, not yet checked against the sessions
pub struct PreAuth(pub AuthToken);

#[async_trait]
impl<S: Sync> FromRequestParts<S> for PreAuth {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<PreAuth, Error> {
        let auth = req
            .headers
            .get(http::header::AUTHORIZATION)
            .ok_or_else(Error::unauthenticated)?;
        let auth = auth.to_str().map_err(|_| Error::unauthenticated())?;
        let mut auth = auth.split(' ');
        if !auth
            .next()
            .ok_or_else(Error::unauthenticated)?
            .eq_ignore_ascii_case("bearer")
        {
            return Err(Error::unauthenticated());
        }
        let token = auth.next().ok_or_else(Error::unauthenticated)?;
        if auth.next().is_some() {
            return Err(Error::unauthenticated());
        }
        let token = Uuid::try_parse(token).map_err(|_| Error::unauthenticated())?;
        Ok(PreAuth(AuthToken(token)))
    }
}
