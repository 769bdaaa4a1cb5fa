use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppResult;
use crate::models::{TrendingKind, TrendingWindow};

/// Keys for everything the proxy stores in Redis
///
/// TMDB responses are keyed by endpoint plus the serialized query string; the
/// region suffix is appended only when a `region` or `watch_region` parameter
/// participated, so region-independent data is shared across regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TmdbResponse {
        endpoint: String,
        query: String,
        region: Option<String>,
    },
    UpcomingPool {
        region: String,
    },
    ShownUpcoming {
        region: String,
    },
    TrendingPool {
        kind: TrendingKind,
        window: TrendingWindow,
        region: String,
    },
    ShownTrending {
        kind: TrendingKind,
        window: TrendingWindow,
        region: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TmdbResponse {
                endpoint,
                query,
                region,
            } => {
                write!(f, "tmdb:{}?{}", endpoint, query)?;
                if let Some(region) = region {
                    write!(f, ":region={}", region)?;
                }
                Ok(())
            }
            CacheKey::UpcomingPool { region } => write!(f, "upcoming:pool:{}", region),
            CacheKey::ShownUpcoming { region } => write!(f, "upcoming:shown:{}", region),
            CacheKey::TrendingPool {
                kind,
                window,
                region,
            } => write!(
                f,
                "trending:pool:{}:{}:{}",
                kind.as_str(),
                window.as_str(),
                region
            ),
            CacheKey::ShownTrending {
                kind,
                window,
                region,
            } => write!(
                f,
                "trending:shown:{}:{}:{}",
                kind.as_str(),
                window.as_str(),
                region
            ),
        }
    }
}

/// Creates a Redis client for caching
///
/// Opening the client does not connect; connections are established per
/// operation via the multiplexed async connection.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving data from Redis
///
/// Reads are loss-tolerant: a Redis failure or an undeserializable entry is
/// logged and reported as a miss, so the proxy keeps serving from upstream
/// when the cache is down.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task so it flushes all pending
    /// writes to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    ///
    /// Writes are handed to a background task over a channel so cache
    /// population never blocks an API response.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a genuine miss, on a Redis error, or when the cached
    /// payload no longer deserializes into `T`.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut conn = match self.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Redis unavailable, treating as cache miss");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(key.to_string()).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Redis get failed, treating as cache miss");
                return None;
            }
        };

        let json = cached?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Discarding undeserializable cache entry");
                None
            }
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// Serializes the value and hands it to the background writer. The Redis
    /// write happens later; callers get no confirmation.
    pub fn put<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_tmdb_response_without_region() {
        let key = CacheKey::TmdbResponse {
            endpoint: "/genre/movie/list".to_string(),
            query: "language=en-US".to_string(),
            region: None,
        };
        assert_eq!(key.to_string(), "tmdb:/genre/movie/list?language=en-US");
    }

    #[test]
    fn test_cache_key_display_tmdb_response_with_region() {
        let key = CacheKey::TmdbResponse {
            endpoint: "/discover/movie".to_string(),
            query: "language=fr-FR&page=1&region=FR".to_string(),
            region: Some("FR".to_string()),
        };
        assert_eq!(
            key.to_string(),
            "tmdb:/discover/movie?language=fr-FR&page=1&region=FR:region=FR"
        );
    }

    #[test]
    fn test_cache_key_display_upcoming() {
        assert_eq!(
            CacheKey::UpcomingPool {
                region: "GB".to_string()
            }
            .to_string(),
            "upcoming:pool:GB"
        );
        assert_eq!(
            CacheKey::ShownUpcoming {
                region: "GB".to_string()
            }
            .to_string(),
            "upcoming:shown:GB"
        );
    }

    #[test]
    fn test_cache_key_display_trending() {
        let key = CacheKey::TrendingPool {
            kind: TrendingKind::Tv,
            window: TrendingWindow::Week,
            region: "US".to_string(),
        };
        assert_eq!(key.to_string(), "trending:pool:tv:week:US");
    }

    #[tokio::test]
    async fn test_get_is_miss_when_redis_unreachable() {
        // Port 1 is never a Redis server; get must degrade to a miss.
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);

        let key = CacheKey::UpcomingPool {
            region: "US".to_string(),
        };
        let value: Option<Vec<u64>> = cache.get(&key).await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_put_with_unreachable_redis_does_not_panic() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        let key = CacheKey::ShownUpcoming {
            region: "US".to_string(),
        };
        cache.put(&key, &vec![1u64, 2, 3], 60);

        handle.shutdown().await;
    }
}
