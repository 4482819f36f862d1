pub mod config;
pub mod error;
pub mod metrics;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use contentblocks_core::{
    clean, is_admin, is_script_injection, try_parse_json, ContentError, DeleteResponse,
    Document, UpdateResponse,
};
use contentblocks_storage::ContentProvider;
use error::{panic_response, ApiError};
use serde::Deserialize;
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ContentProvider>,
    // empty: writes are open to everyone
    pub admin_ips: Arc<Vec<IpAddr>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            provider,
            admin_ips: Arc::new(Vec::new()),
        }
    }

    pub fn with_admin_ips(mut self, ips: Vec<IpAddr>) -> Self {
        self.admin_ips = Arc::new(ips);
        self
    }
}

#[derive(Debug, Default, Deserialize, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ContentParams {
    pub q: Option<String>,
    pub script: Option<String>,
    pub admin: Option<String>,
}

impl ContentParams {
    fn allow_scripts(&self) -> bool {
        self.script.as_deref() == Some("1")
    }

    fn admin_flag(&self) -> bool {
        self.admin.as_deref() == Some("1")
    }
}

/// `Path` whose rejections render as `{"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ItemPath<T>(pub T);

type Remote = Option<ConnectInfo<SocketAddr>>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/content", post(create_content))
        .route("/content/find", get(find_content))
        .route(
            "/content/:item_id",
            get(get_content).put(update_content).delete(delete_content),
        )
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_text() -> impl IntoResponse {
    (StatusCode::OK, metrics::render())
}

fn observe<T>(op: &'static str, res: Result<T, ContentError>) -> Result<T, ApiError> {
    metrics::record(op, res.is_ok());
    res.map_err(|e| {
        warn!(op, error = %e, "content operation failed");
        ApiError(e)
    })
}

fn require_admin(app: &AppState, params: &ContentParams, remote: &Remote) -> Result<(), ContentError> {
    if app.admin_ips.is_empty() {
        return Ok(());
    }
    let ip = remote.as_ref().map(|ConnectInfo(addr)| addr.ip());
    if is_admin(ip, params.admin_flag(), &app.admin_ips) {
        Ok(())
    } else {
        Err(ContentError::Forbidden)
    }
}

/// Decodes a write payload and runs the script-tag check on it.
fn read_payload(body: &Bytes, params: &ContentParams) -> Result<Document, ContentError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ContentError::malformed(&String::from_utf8_lossy(body), e))?;
    let value = try_parse_json(text)?;
    if is_script_injection(&value, params.allow_scripts()) {
        return Err(ContentError::ScriptInjection);
    }
    match value {
        Value::Object(doc) => Ok(doc),
        _ => Err(ContentError::Invalid(
            "content block must be a JSON object".into(),
        )),
    }
}

async fn find_content(
    State(app): State<AppState>,
    params: ContentParams,
) -> Result<Json<Vec<Document>>, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["find"]).start_timer();
    let res = async {
        let query = clean(params.q.as_deref().unwrap_or("{}"))?;
        let items = app.provider.find(&query).await?;
        if items.is_empty() {
            return Err(ContentError::NoRecords);
        }
        Ok::<_, ContentError>(items)
    }
    .await;
    observe("find", res).map(Json)
}

async fn get_content(
    State(app): State<AppState>,
    ItemPath(item_id): ItemPath<String>,
) -> Result<Json<Document>, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["get"]).start_timer();
    observe("get", app.provider.find_one(&item_id).await).map(Json)
}

async fn create_content(
    State(app): State<AppState>,
    params: ContentParams,
    remote: Remote,
    body: Bytes,
) -> Result<Json<Document>, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["create"]).start_timer();
    let res = async {
        require_admin(&app, &params, &remote)?;
        let doc = read_payload(&body, &params)?;
        let saved = app.provider.save(doc).await?;
        info!(id = ?saved.get(contentblocks_core::ID_FIELD), "content block created");
        Ok::<_, ContentError>(saved)
    }
    .await;
    observe("create", res).map(Json)
}

async fn update_content(
    State(app): State<AppState>,
    ItemPath(item_id): ItemPath<String>,
    params: ContentParams,
    remote: Remote,
    body: Bytes,
) -> Result<Json<UpdateResponse>, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["update"]).start_timer();
    let res = async {
        require_admin(&app, &params, &remote)?;
        let doc = read_payload(&body, &params)?;
        let out = app.provider.update(&item_id, doc).await?;
        info!(id = %item_id, updated = out.updated, "content block updated");
        Ok::<_, ContentError>(UpdateResponse {
            document: Value::Object(out.document),
            updated: out.updated,
        })
    }
    .await;
    observe("update", res).map(Json)
}

async fn delete_content(
    State(app): State<AppState>,
    ItemPath(item_id): ItemPath<String>,
    params: ContentParams,
    remote: Remote,
) -> Result<Json<DeleteResponse>, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["delete"]).start_timer();
    let res = async {
        require_admin(&app, &params, &remote)?;
        let deleted = app.provider.delete(&item_id).await?;
        info!(id = %item_id, deleted, "content block deleted");
        Ok::<_, ContentError>(DeleteResponse {
            id: item_id.clone(),
            deleted,
        })
    }
    .await;
    observe("delete", res).map(Json)
}
