//! HTTP feed endpoint
//!
//! - `GET /vehicle-positions`: protobuf feed
//! - `GET /vehicle-positions?debug`: the same snapshot as JSON
//! - `GET /health`: vehicle count, cursor and scheduler counters

use codec::encode_feed;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use types::FeedSnapshot;

use crate::error::ExportError;
use crate::stats::SchedulerStats;

pub const FEED_PATH: &str = "/vehicle-positions";
pub const HEALTH_PATH: &str = "/health";

const PROTOBUF: &str = "application/x-protobuf";
const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

pub struct FeedHttpServer {
    addr: SocketAddr,
    feed: watch::Receiver<Arc<FeedSnapshot>>,
    stats: Arc<SchedulerStats>,
}

impl FeedHttpServer {
    pub fn new(
        addr: SocketAddr,
        feed: watch::Receiver<Arc<FeedSnapshot>>,
        stats: Arc<SchedulerStats>,
    ) -> Self {
        Self { addr, feed, stats }
    }

    /// Bind the listener and serve until `cancel` fires
    ///
    /// Binding happens before this returns so an unusable address fails
    /// startup. Returns the bound address, useful when binding port 0.
    pub fn spawn(self, cancel: CancellationToken) -> Result<(SocketAddr, JoinHandle<()>), ExportError> {
        let builder = Server::try_bind(&self.addr).map_err(|e| ExportError::Bind {
            addr: self.addr,
            reason: e.to_string(),
        })?;

        let feed = self.feed;
        let stats = self.stats;
        let make_svc = make_service_fn(move |_conn| {
            let feed = feed.clone();
            let stats = Arc::clone(&stats);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle_request(req, feed.clone(), Arc::clone(&stats))
                }))
            }
        });

        let server = builder.serve(make_svc);
        let local_addr = server.local_addr();
        let server = server.with_graceful_shutdown(async move { cancel.cancelled().await });

        info!("Feed endpoint listening on http://{}", local_addr);
        info!("Endpoints: {}, {}", FEED_PATH, HEALTH_PATH);

        let handle = tokio::spawn(async move {
            if let Err(e) = server.await {
                error!("Feed endpoint error: {}", e);
            }
        });

        Ok((local_addr, handle))
    }
}

async fn handle_request(
    req: Request<Body>,
    feed: watch::Receiver<Arc<FeedSnapshot>>,
    stats: Arc<SchedulerStats>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path();
    let method = req.method();

    debug!("Feed request: {} {}", method, path);

    if method != Method::GET {
        return Ok(respond(StatusCode::METHOD_NOT_ALLOWED, TEXT, "Method not allowed"));
    }

    let snapshot = Arc::clone(&feed.borrow());

    let response = match path {
        FEED_PATH if wants_debug(req.uri().query()) => render_json(&*snapshot),
        FEED_PATH => respond(StatusCode::OK, PROTOBUF, encode_feed(&snapshot)),
        HEALTH_PATH => render_json(&serde_json::json!({
            "status": "healthy",
            "vehicles": snapshot.len(),
            "cursor_ms": snapshot.max_timestamp_ms(),
            "snapshot_created_at_ms": snapshot.created_at_ms(),
            "stats": stats.snapshot(),
        })),
        _ => respond(StatusCode::NOT_FOUND, TEXT, "Not found"),
    };

    Ok(response)
}

/// `?debug`, `?debug=1` and friends switch the feed to JSON
fn wants_debug(query: Option<&str>) -> bool {
    query.map_or(false, |query| {
        query
            .split('&')
            .any(|pair| pair == "debug" || pair.starts_with("debug="))
    })
}

fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> Response<Body> {
    match serde_json::to_vec_pretty(value) {
        Ok(body) => respond(StatusCode::OK, JSON, body),
        Err(e) => {
            let e = ExportError::from(e);
            error!("{}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, TEXT, e.to_string())
        }
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
