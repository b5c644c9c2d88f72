//! RepoSignal webhook receiver composition root.

#![forbid(unsafe_code)]

mod config;
mod state;
mod webhook;

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reposignal_application::{
    BackendClient, CleanupQueue, CommandService, GithubClient, NudgeService,
};
use reposignal_core::AppError;
use reposignal_domain::CLEANUP_QUEUE_CHANNEL;
use reposignal_infrastructure::{HttpBackendClient, HttpGithubClient, RedisCleanupQueue};

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let timeout = Duration::from_millis(config.request_timeout_ms.max(1));

    let github: Arc<dyn GithubClient> = Arc::new(HttpGithubClient::new(
        config.github_api_base.as_str(),
        config.github_token.as_str(),
        timeout,
    )?);
    let backend: Arc<dyn BackendClient> = Arc::new(HttpBackendClient::new(
        config.backend_api_base.as_str(),
        config.backend_api_token.as_str(),
        timeout,
    )?);

    // The queue is constructed once here and injected into every component
    // that schedules jobs.
    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let queue: Arc<dyn CleanupQueue> =
        Arc::new(RedisCleanupQueue::new(redis_client, CLEANUP_QUEUE_CHANNEL));

    let app_state = AppState {
        command_service: CommandService::new(github.clone(), backend, queue.clone()),
        nudge_service: NudgeService::new(github, queue),
    };

    let app = Router::new()
        .route("/health", get(webhook::health_handler))
        .route("/webhooks/github", post(webhook::github_webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = IpAddr::from_str(config.api_host.as_str()).map_err(|error| {
        AppError::Internal(format!("invalid API_HOST '{}': {error}", config.api_host))
    })?;
    let address = SocketAddr::from((host, config.api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "reposignal-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
