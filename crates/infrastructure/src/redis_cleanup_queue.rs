//! Redis-backed cleanup queue adapter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Script};
use tracing::warn;

use reposignal_application::{ClaimedCleanupJob, CleanupQueue};
use reposignal_core::{AppError, AppResult};
use reposignal_domain::{CleanupJob, CleanupJobOptions, DELETE_COMMENT_JOB};


// Each verb is one Lua script so claim/retry stay atomic; the claim script
// is the worker pool's sole mutual exclusion.
const ENQUEUE_SCRIPT: &str = r#"
local id = redis.call('INCR', KEYS[1])
local job_key = KEYS[2] .. ':' .. id
redis.call('HSET', job_key,
  'name', ARGV[1],
  'data', ARGV[2],
  'opts', ARGV[3],
  'attemptsMade', 0,
  'timestamp', ARGV[4])
redis.call('ZADD', KEYS[3], ARGV[5], id)
return id
"#;

const CLAIM_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, 1)
if #due == 0 then
  return false
end
local id = due[1]
redis.call('ZREM', KEYS[1], id)
local job_key = KEYS[2] .. ':' .. id
return {id,
  redis.call('HGET', job_key, 'name'),
  redis.call('HGET', job_key, 'data'),
  redis.call('HGET', job_key, 'attemptsMade')}
"#;

const RETRY_SCRIPT: &str = r#"
local job_key = KEYS[2] .. ':' .. ARGV[1]
redis.call('HINCRBY', job_key, 'attemptsMade', 1)
redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
return 1
"#;

/// Redis implementation of the cleanup queue port.
///
/// Layout under the channel prefix: an `id` counter, one `job:{id}` hash
/// (`name`, serialized `data` payload, serialized `opts`, `attemptsMade`,
/// enqueue `timestamp`) and a `delayed` sorted set scored by ready-at epoch
/// milliseconds. The payload and options wire shapes are shared with
/// interoperating workers.
#[derive(Clone)]
pub struct RedisCleanupQueue {
    client: redis::Client,
    channel: String,
}

impl RedisCleanupQueue {
    /// Creates a queue adapter over the given channel name.
    #[must_use]
    pub fn new(client: redis::Client, channel: impl Into<String>) -> Self {
        Self {
            client,
            channel: channel.into(),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{suffix}", self.channel)
    }

    fn job_key(&self, job_id: &str) -> String {
        format!("{}:job:{job_id}", self.channel)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn remove_job(&self, job_id: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection
            .del::<_, ()>(self.job_key(job_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to remove cleanup job: {error}"))
            })?;

        Ok(())
    }
}

fn ready_at(now_ms: i64, delay: Duration) -> i64 {
    let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(delay_ms)
}

#[async_trait]
impl CleanupQueue for RedisCleanupQueue {
    async fn enqueue(&self, job: CleanupJob, delay: Duration) -> AppResult<()> {
        let data = serde_json::to_string(&job).map_err(|error| {
            AppError::Internal(format!("failed to serialize cleanup job: {error}"))
        })?;
        let opts = serde_json::to_string(&CleanupJobOptions::delayed(delay)).map_err(|error| {
            AppError::Internal(format!("failed to serialize cleanup job options: {error}"))
        })?;
        let now_ms = Utc::now().timestamp_millis();

        let mut connection = self.connection().await?;
        Script::new(ENQUEUE_SCRIPT)
            .key(self.key("id"))
            .key(self.key("job"))
            .key(self.key("delayed"))
            .arg(DELETE_COMMENT_JOB)
            .arg(data)
            .arg(opts)
            .arg(now_ms)
            .arg(ready_at(now_ms, delay))
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to enqueue cleanup job: {error}"))
            })?;

        Ok(())
    }

    async fn claim_due(&self) -> AppResult<Option<ClaimedCleanupJob>> {
        let now_ms = Utc::now().timestamp_millis();

        let mut connection = self.connection().await?;
        let row: Option<(String, String, String, u32)> = Script::new(CLAIM_SCRIPT)
            .key(self.key("delayed"))
            .key(self.key("job"))
            .arg(now_ms)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to claim cleanup job: {error}")))?;

        let Some((job_id, name, data, attempts_made)) = row else {
            return Ok(None);
        };

        if name != DELETE_COMMENT_JOB {
            warn!(job_id = %job_id, name = %name, "discarding job with unrecognized name");
            self.remove_job(job_id.as_str()).await?;
            return Ok(None);
        }

        let job: CleanupJob = match serde_json::from_str(data.as_str()) {
            Ok(job) => job,
            Err(error) => {
                warn!(
                    job_id = %job_id,
                    error = %error,
                    "discarding cleanup job with undecodable payload"
                );
                self.remove_job(job_id.as_str()).await?;
                return Ok(None);
            }
        };

        Ok(Some(ClaimedCleanupJob {
            job_id,
            job,
            attempts_made,
        }))
    }

    async fn complete(&self, claimed: &ClaimedCleanupJob) -> AppResult<()> {
        self.remove_job(claimed.job_id.as_str()).await
    }

    async fn retry(&self, claimed: &ClaimedCleanupJob, delay: Duration) -> AppResult<()> {
        let now_ms = Utc::now().timestamp_millis();

        let mut connection = self.connection().await?;
        Script::new(RETRY_SCRIPT)
            .key(self.key("delayed"))
            .key(self.key("job"))
            .arg(claimed.job_id.as_str())
            .arg(ready_at(now_ms, delay))
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to retry cleanup job: {error}")))?;

        Ok(())
    }

    async fn discard(&self, claimed: &ClaimedCleanupJob) -> AppResult<()> {
        self.remove_job(claimed.job_id.as_str()).await
    }
}
