//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_backend_client;
mod http_github_client;
mod redis_cleanup_queue;

pub use http_backend_client::HttpBackendClient;
pub use http_github_client::HttpGithubClient;
pub use redis_cleanup_queue::RedisCleanupQueue;
