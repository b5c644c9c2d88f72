//! RepoSignal cleanup worker runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reposignal_application::{BackendClient, CleanupQueue, CleanupService, GithubClient};
use reposignal_core::AppError;
use reposignal_domain::CLEANUP_QUEUE_CHANNEL;
use reposignal_infrastructure::{HttpBackendClient, HttpGithubClient, RedisCleanupQueue};

const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
struct WorkerConfig {
    github_api_base: String,
    github_token: String,
    backend_api_base: String,
    backend_api_token: String,
    redis_url: String,
    concurrency: usize,
    poll_interval_ms: u64,
    request_timeout_ms: u64,
}

impl WorkerConfig {
    fn load() -> Result<Self, AppError> {
        let github_api_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_owned());
        let github_token = required_env("GITHUB_TOKEN")?;
        let backend_api_base = required_env("BACKEND_API_URL")?;
        let backend_api_token = required_env("BACKEND_API_TOKEN")?;
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_owned());

        let concurrency = env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);

        let poll_interval_ms = env::var("WORKER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let request_timeout_ms = env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(15_000);

        Ok(Self {
            github_api_base,
            github_token,
            backend_api_base,
            backend_api_token,
            redis_url,
            concurrency,
            poll_interval_ms,
            request_timeout_ms,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
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

    // The queue is constructed once here and injected into every executor.
    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let queue: Arc<dyn CleanupQueue> =
        Arc::new(RedisCleanupQueue::new(redis_client, CLEANUP_QUEUE_CHANNEL));

    let service = CleanupService::new(github, backend, queue);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    info!(
        concurrency = config.concurrency,
        poll_interval_ms = config.poll_interval_ms,
        "reposignal-worker started"
    );

    let mut executors = Vec::with_capacity(config.concurrency);
    for executor_id in 0..config.concurrency {
        let service = service.clone();
        executors.push(tokio::spawn(async move {
            run_executor(executor_id, service, poll_interval).await;
        }));
    }

    tokio::signal::ctrl_c().await.map_err(|error| {
        AppError::Internal(format!("failed to listen for shutdown signal: {error}"))
    })?;

    info!("shutdown signal received");
    for executor in executors {
        executor.abort();
    }

    Ok(())
}

async fn run_executor(executor_id: usize, service: CleanupService, poll_interval: Duration) {
    loop {
        match service.process_next().await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(poll_interval).await,
            Err(error) => {
                warn!(executor_id, error = %error, "cleanup executor iteration failed");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value =
        env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
