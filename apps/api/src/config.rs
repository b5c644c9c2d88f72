use std::env;

use reposignal_core::AppError;

/// Validated environment configuration for the webhook receiver.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub github_api_base: String,
    pub github_token: String,
    pub backend_api_base: String,
    pub backend_api_token: String,
    pub redis_url: String,
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let github_api_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_owned());
        let github_token = required_env("GITHUB_TOKEN")?;
        let backend_api_base = required_env("BACKEND_API_URL")?;
        let backend_api_token = required_env("BACKEND_API_TOKEN")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_owned());

        let request_timeout_ms = env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(15_000);

        Ok(Self {
            api_host,
            api_port,
            github_api_base,
            github_token,
            backend_api_base,
            backend_api_token,
            redis_url,
            request_timeout_ms,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value =
        env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
