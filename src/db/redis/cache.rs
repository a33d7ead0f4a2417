use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ErrorKind, RedisError, RedisResult};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::db::CacheStore;
use crate::error::AppError;
use crate::error::AppResult;

/// Creates a Redis client for caching
///
/// Opening a client does not connect; the connection is made on first use, so
/// an unreachable Redis only surfaces as failed reads and writes.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Deadline for a single Redis operation, including connecting
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(250);

/// Writes queued beyond this are dropped rather than buffered
const WRITE_QUEUE_CAPACITY: usize = 1024;

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

fn timed_out() -> AppError {
    AppError::CacheUnavailable(RedisError::from((
        ErrorKind::IoError,
        "Redis operation timed out",
    )))
}

/// One shared, lazily established connection; every operation runs under a deadline
struct RedisConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisConnection {
    async fn run<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let work = async {
            let manager = self
                .manager
                .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
                .await?
                .clone();
            op(manager).await
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(timed_out()),
        }
    }
}

/// Redis-backed cache store.
///
/// Reads go to Redis under a deadline, so a hung server reads as a miss.
/// Writes are queued to a background task so a slow or unreachable Redis never
/// delays a response; when the queue is full the write is dropped.
#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<RedisConnection>,
    write_tx: mpsc::Sender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits for it to flush and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl RedisCache {
    /// Creates a new RedisCache with its background writer task
    pub fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let connection = Arc::new(RedisConnection {
            client: redis_client,
            manager: OnceCell::new(),
            timeout,
        });

        let writer_connection = connection.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(writer_connection, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            connection,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx, task };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, flushes the messages already queued before exiting.
    /// The flush stops at the first failure; Redis is then assumed gone.
    async fn cache_writer_task(
        connection: Arc<RedisConnection>,
        mut write_rx: mpsc::Receiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes: u64 = 0;

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&connection, msg).await {
                        failed_writes += 1;
                        tracing::warn!(error = %e, failed_writes, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&connection, msg).await {
                            let mut dropped: u64 = 1;
                            while write_rx.recv().await.is_some() {
                                dropped += 1;
                            }
                            tracing::warn!(error = %e, dropped, "Abandoning cache flush");
                            break;
                        }
                    }

                    tracing::info!(failed_writes, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(connection: &RedisConnection, msg: CacheWriteMessage) -> AppResult<()> {
        connection
            .run(|mut conn| async move { conn.set_ex::<_, _, ()>(msg.key, msg.value, msg.ttl).await })
            .await
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.connection
            .run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    /// Queues the write and returns immediately
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let msg = CacheWriteMessage {
            key: key.to_string(),
            value,
            ttl: ttl_seconds,
        };

        self.write_tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => AppError::Internal("Cache write queue full".to_string()),
            TrySendError::Closed(_) => AppError::Internal("Cache writer stopped".to_string()),
        })
    }
}
