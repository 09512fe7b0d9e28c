//! Redis-backed session store for multi-process deployments.
//!
//! Layout:
//! - `{key_prefix}session:{sessionId}` - JSON `SessionRecord`
//! - `{key_prefix}principal:{principalId}:sessions` - set of session ids
//! - `{channel_prefix}{sessionId}` - pub/sub channel, payload is the
//!   removal reason
//!
//! Rotation and deletion run as Lua scripts so that the index, the records
//! and the notifications change in one atomic step. Watches use a dedicated
//! pub/sub connection per watched record and re-check `EXISTS` after every
//! (re)subscribe rather than replaying missed messages.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use redis::aio::{MultiplexedConnection, PubSub};
use redis::{AsyncCommands, Client, Script};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::foundation::{PrincipalId, SessionId, Timestamp};
use crate::domain::session::{RemovalReason, SessionRecord};
use crate::ports::{SessionSignal, SessionStore, SessionStoreError, SessionWatch};

/// KEYS[1] principal index, KEYS[2] new record.
/// ARGV[1] record json, ARGV[2] record key prefix, ARGV[3] channel prefix,
/// ARGV[4] new session id.
const ROTATE_SCRIPT: &str = r#"
local superseded = {}
for _, id in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  if id ~= ARGV[4] then
    if redis.call('DEL', ARGV[2] .. id) == 1 then
      redis.call('PUBLISH', ARGV[3] .. id, 'superseded')
      table.insert(superseded, id)
    end
  end
end
redis.call('DEL', KEYS[1])
redis.call('SET', KEYS[2], ARGV[1])
redis.call('SADD', KEYS[1], ARGV[4])
return superseded
"#;

/// KEYS[1] record.
/// ARGV[1] index key prefix, ARGV[2] index key suffix, ARGV[3] session id,
/// ARGV[4] channel, ARGV[5] reason.
const DELETE_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 0
end
redis.call('DEL', KEYS[1])
local ok, record = pcall(cjson.decode, raw)
if ok and type(record) == 'table' and record['principalId'] then
  redis.call('SREM', ARGV[1] .. record['principalId'] .. ARGV[2], ARGV[3])
end
redis.call('PUBLISH', ARGV[4], ARGV[5])
return 1
"#;

const INDEX_SUFFIX: &str = ":sessions";

/// Key naming and reconnect policy for the Redis session store.
#[derive(Debug, Clone)]
pub struct RedisSessionStoreConfig {
    pub key_prefix: String,
    pub channel_prefix: String,
    /// First delay before re-subscribing after a dropped pub/sub connection.
    pub reconnect_delay: Duration,
    /// Upper bound for the doubling reconnect delay.
    pub max_reconnect_delay: Duration,
}

impl Default for RedisSessionStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "scim-gateway:".to_string(),
            channel_prefix: "scim-gateway:session-events:".to_string(),
            reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

impl RedisSessionStoreConfig {
    fn record_key(&self, session_id: &SessionId) -> String {
        format!("{}session:{}", self.key_prefix, session_id)
    }

    fn record_key_prefix(&self) -> String {
        format!("{}session:", self.key_prefix)
    }

    fn index_key_prefix(&self) -> String {
        format!("{}principal:", self.key_prefix)
    }

    fn index_key(&self, principal_id: &PrincipalId) -> String {
        format!("{}{}{}", self.index_key_prefix(), principal_id, INDEX_SUFFIX)
    }

    fn channel(&self, session_id: &SessionId) -> String {
        format!("{}{}", self.channel_prefix, session_id)
    }
}

/// Redis `SessionStore`.
///
/// Commands share one multiplexed connection; each watch opens its own
/// pub/sub connection from the client.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    conn: MultiplexedConnection,
    config: RedisSessionStoreConfig,
    rotate_script: Script,
    delete_script: Script,
}

impl fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn unavailable(err: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Unavailable(err.to_string())
}

impl RedisSessionStore {
    /// Wraps an existing client and command connection.
    pub fn new(client: Client, conn: MultiplexedConnection, config: RedisSessionStoreConfig) -> Self {
        Self {
            client,
            conn,
            config,
            rotate_script: Script::new(ROTATE_SCRIPT),
            delete_script: Script::new(DELETE_SCRIPT),
        }
    }

    /// Opens a client and a multiplexed command connection.
    pub async fn connect(
        url: &str,
        config: RedisSessionStoreConfig,
    ) -> Result<Self, SessionStoreError> {
        let client = Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(client, conn, config))
    }

    fn decode(raw: &str) -> Result<SessionRecord, SessionStoreError> {
        serde_json::from_str(raw).map_err(|e| SessionStoreError::Serialization(e.to_string()))
    }

    fn encode(record: &SessionRecord) -> Result<String, SessionStoreError> {
        serde_json::to_string(record).map_err(|e| SessionStoreError::Serialization(e.to_string()))
    }
}

async fn subscribe(client: &Client, channel: &str) -> Result<PubSub, redis::RedisError> {
    let mut pubsub = client.get_async_connection().await?.into_pubsub();
    pubsub.subscribe(channel).await?;
    Ok(pubsub)
}

async fn record_exists(conn: &mut MultiplexedConnection, key: &str) -> Result<bool, redis::RedisError> {
    conn.exists(key).await
}

/// Stops the background watch task when the stream is dropped.
struct WatchGuard {
    receiver: mpsc::Receiver<SessionSignal>,
    task: JoinHandle<()>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct WatchTask {
    client: Client,
    conn: MultiplexedConnection,
    session_id: SessionId,
    record_key: String,
    channel: String,
    reconnect_delay: Duration,
    max_reconnect_delay: Duration,
    signals: mpsc::Sender<SessionSignal>,
}

impl WatchTask {
    /// Forwards the first removal on `pubsub`; re-subscribes when the
    /// connection drops.
    async fn run(mut self, mut pubsub: PubSub) {
        let mut delay = self.reconnect_delay;
        loop {
            let payload = {
                let mut messages = pubsub.on_message();
                messages.next().await.map(|msg| msg.get_payload::<String>())
            };

            match payload {
                Some(payload) => {
                    let reason = payload
                        .map(|p| RemovalReason::parse(&p))
                        .unwrap_or(RemovalReason::Vanished);
                    let _ = self.signals.send(SessionSignal::Removed { reason }).await;
                    return;
                }
                None => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        "Session subscription dropped, reconnecting"
                    );
                }
            }

            pubsub = loop {
                if self.signals.is_closed() {
                    return;
                }
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(self.max_reconnect_delay);

                match self.resubscribe().await {
                    Ok(Some(pubsub)) => break pubsub,
                    Ok(None) => return,
                    Err(e) => tracing::warn!(
                        session_id = %self.session_id,
                        error = %e,
                        "Session re-subscribe failed"
                    ),
                }
            };
            delay = self.reconnect_delay;
        }
    }

    /// Subscribes again and re-observes the record. Returns `None` once a
    /// terminal signal was sent.
    async fn resubscribe(&mut self) -> Result<Option<PubSub>, redis::RedisError> {
        let pubsub = subscribe(&self.client, &self.channel).await?;
        if record_exists(&mut self.conn, &self.record_key).await? {
            let _ = self.signals.send(SessionSignal::Resynced).await;
            Ok(Some(pubsub))
        } else {
            let _ = self
                .signals
                .send(SessionSignal::Removed {
                    reason: RemovalReason::Vanished,
                })
                .await;
            Ok(None)
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn rotate(&self, record: &SessionRecord) -> Result<Vec<SessionId>, SessionStoreError> {
        let json = Self::encode(record)?;
        let mut conn = self.conn.clone();

        let superseded: Vec<String> = self
            .rotate_script
            .key(self.config.index_key(&record.principal_id))
            .key(self.config.record_key(&record.session_id))
            .arg(json)
            .arg(self.config.record_key_prefix())
            .arg(&self.config.channel_prefix)
            .arg(record.session_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(superseded
            .iter()
            .filter_map(|id| match id.parse::<SessionId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(raw = %id, "Ignoring malformed session id in principal index");
                    None
                }
            })
            .collect())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.config.record_key(session_id))
            .await
            .map_err(unavailable)?;
        raw.as_deref().map(Self::decode).transpose()
    }

    async fn find_by_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<SessionRecord>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn
            .smembers(self.config.index_key(principal_id))
            .await
            .map_err(unavailable)?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(session_id) = id.parse::<SessionId>() else {
                continue;
            };
            // Index entries can briefly outlive their record.
            if let Some(record) = self.get(&session_id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn delete(
        &self,
        session_id: &SessionId,
        reason: RemovalReason,
    ) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .delete_script
            .key(self.config.record_key(session_id))
            .arg(self.config.index_key_prefix())
            .arg(INDEX_SUFFIX)
            .arg(session_id.to_string())
            .arg(self.config.channel(session_id))
            .arg(reason.as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(removed == 1)
    }

    async fn touch(&self, session_id: &SessionId, at: Timestamp) -> Result<bool, SessionStoreError> {
        let Some(record) = self.get(session_id).await? else {
            return Ok(false);
        };
        let json = Self::encode(&record.touched(at))?;

        let mut conn = self.conn.clone();
        // XX: never resurrect a record deleted since the read.
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.config.record_key(session_id))
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(reply.is_some())
    }

    async fn watch(&self, session_id: &SessionId) -> Result<SessionWatch, SessionStoreError> {
        let channel = self.config.channel(session_id);
        let record_key = self.config.record_key(session_id);

        let pubsub = subscribe(&self.client, &channel).await.map_err(unavailable)?;
        let mut conn = self.conn.clone();
        let exists = record_exists(&mut conn, &record_key)
            .await
            .map_err(unavailable)?;

        if !exists {
            return Ok(Box::pin(stream::once(async {
                SessionSignal::Removed {
                    reason: RemovalReason::Vanished,
                }
            })));
        }

        let (signals, receiver) = mpsc::channel(4);
        let task = WatchTask {
            client: self.client.clone(),
            conn,
            session_id: *session_id,
            record_key,
            channel,
            reconnect_delay: self.config.reconnect_delay,
            max_reconnect_delay: self.config.max_reconnect_delay,
            signals,
        };
        let handle = tokio::spawn(task.run(pubsub));

        let guard = WatchGuard {
            receiver,
            task: handle,
        };
        let signals = stream::unfold(guard, |mut guard| async move {
            let signal = guard.receiver.recv().await?;
            Some((signal, guard))
        });

        Ok(Box::pin(signals))
    }
}
