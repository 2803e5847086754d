#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod postgres;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use postgres::*;

use anyhow::Context as _;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Once};
use tour_search::api::create_router;
use tour_search::db::{InMemoryPackageStore, PackageRecord};
use tour_search::{AppState, Config};
use tower::ServiceExt;

static TRACING: Once = Once::new();

pub(crate) fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("TEST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Router over an in-memory catalog.
pub struct TestApp {
    pub router: Router,
    /// Shares its availability switch with the store behind `router`.
    pub store: InMemoryPackageStore,
}

impl TestApp {
    pub fn new(records: Vec<PackageRecord>) -> Self {
        Self::with_config(Config::default(), records)
    }

    pub fn with_config(config: Config, records: Vec<PackageRecord>) -> Self {
        init_tracing();
        let store = InMemoryPackageStore::new(records);
        let state = AppState::with_store(config, Arc::new(store.clone()));
        Self {
            router: create_router(state),
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        send(&self.router, method, path_and_query).await
    }

    /// GET and decode a JSON body.
    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        get_json(&self.router, path_and_query).await
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    path_and_query: &str,
) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
    let request = Request::builder()
        .method(method)
        .uri(path_and_query)
        .body(Body::empty())
        .context("build request")?;

    let response = router
        .clone()
        .oneshot(request)
        .await
        .context("router call")?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("read response body")?;
    Ok((status, headers, body))
}

pub async fn get_json(router: &Router, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
    let (status, _headers, body) = send(router, Method::GET, path_and_query).await?;
    let json = serde_json::from_slice(&body)
        .with_context(|| format!("decode JSON from {path_and_query}"))?;
    Ok((status, json))
}

pub async fn with_test_app<F>(records: Vec<PackageRecord>, f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a TestApp) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>,
{
    use futures::FutureExt as _;

    let app = TestApp::new(records);
    let result = AssertUnwindSafe(f(&app)).catch_unwind().await;

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
