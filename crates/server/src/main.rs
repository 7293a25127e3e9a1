use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{create_submission, get_submission, health, list_submissions, ApiContext};
use shared::{
    domain::{Submission, SubmissionId},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, SubmitResponse},
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(http_health))
        .route("/submit", post(http_submit))
        .route("/submissions", get(http_list_submissions))
        .route("/submission/:submission_id", get(http_get_submission));

    Router::new()
        .nest("/api", api)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn status_for(err: &ApiError) -> StatusCode {
    match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(%status, error = %err.message, "request failed");
    }
    (status, Json(err))
}

async fn http_health(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    health(&state.api).await.map(Json).map_err(reject)
}

async fn http_submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let created = create_submission(&state.api, &body).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_list_submissions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Submission>>> {
    list_submissions(&state.api).await.map(Json).map_err(reject)
}

async fn http_get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<i64>,
) -> ApiResult<Json<Submission>> {
    get_submission(&state.api, SubmissionId(submission_id))
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
