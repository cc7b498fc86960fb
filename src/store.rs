//! Bounded, persisted cache of the most recently seen conversations.
//!
//! One `ConversationStore` instance is the process-wide source of truth for
//! "what did the scraper last see", surviving restarts. It is constructed
//! explicitly by the service owner and shared via `Arc`; all entry points
//! serialize on a single internal lock. Capacity is bounded both ways, by
//! default at most 50 conversations each trimmed to its last 30 messages,
//! which also bounds the persisted blob on a device with no server-side
//! storage.

use crate::parsers::engine::MAX_MESSAGES;
use crate::types::{conversation_key, ParsedConversation, Platform};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default maximum number of distinct conversations kept in the cache.
pub const MAX_CONVERSATIONS: usize = 50;

/// Capacity bounds for the cache. Defaults match the shipped constants;
/// deployments override them through `[store]` configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_conversations: usize,
    pub max_messages: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_conversations: MAX_CONVERSATIONS,
            max_messages: MAX_MESSAGES,
        }
    }
}

/// Key under which the blob is persisted in the key/value backend.
const BLOB_KEY: &str = "conversations";

/// Current persisted schema version.
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Versioned on-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedBlob {
    schema_version: u32,
    conversations: Vec<ParsedConversation>,
}

/// Raw blob load/save. Implementations must be independently failure-safe:
/// a broken load yields an empty cache for the run, a broken save leaves the
/// in-memory cache authoritative until the next successful save.
pub trait StoreBackend: Send {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, blob: &str) -> Result<(), StoreError>;
}

/// Preferred backend: a single key/value table in SQLite.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let backend = Self { conn };
        backend.init_schema()?;
        Ok(backend)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let backend = Self { conn };
        backend.init_schema()?;
        Ok(backend)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }
}

impl StoreBackend for SqliteBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let result = self.conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![BLOB_KEY],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![BLOB_KEY, blob],
        )?;
        Ok(())
    }
}

/// Fallback backend: plain JSON file, written via tmp-then-rename so a crash
/// mid-save never corrupts the previous blob.
pub struct JsonFileBackend {
    path: std::path::PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&str, &ParsedConversation) + Send + Sync>;

struct StoreInner {
    cache: HashMap<String, ParsedConversation>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    backend: Box<dyn StoreBackend>,
}

/// Thread-safe, bounded, persisted conversation cache.
pub struct ConversationStore {
    limits: StoreLimits,
    inner: Mutex<StoreInner>,
}

impl ConversationStore {
    /// Open the store over the given backend with default limits.
    pub fn open(backend: Box<dyn StoreBackend>) -> Self {
        Self::open_with_limits(backend, StoreLimits::default())
    }

    /// Open the store over the given backend, loading everything previously
    /// persisted before serving any request. A corrupt or unreadable blob is
    /// logged and yields an empty cache; it never fails construction.
    pub fn open_with_limits(backend: Box<dyn StoreBackend>, limits: StoreLimits) -> Self {
        let cache = match backend.load() {
            Ok(Some(blob)) => match deserialize_blob(&blob) {
                Ok(conversations) => {
                    info!(count = conversations.len(), "loaded persisted conversations");
                    conversations
                        .into_iter()
                        .map(|c| (c.store_key(), c))
                        .collect()
                }
                Err(e) => {
                    warn!("corrupt persisted blob, starting empty: {e}");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("failed to read persisted conversations, starting empty: {e}");
                HashMap::new()
            }
        };

        Self {
            limits,
            inner: Mutex::new(StoreInner {
                cache,
                listeners: Vec::new(),
                next_listener_id: 0,
                backend,
            }),
        }
    }

    /// Open with the preferred SQLite backend under `data_dir` and default
    /// limits.
    pub fn open_default(data_dir: &Path) -> Self {
        Self::open_default_with_limits(data_dir, StoreLimits::default())
    }

    /// Open with the preferred SQLite backend under `data_dir`, falling back
    /// to a plain JSON file when the database cannot be opened. Mirrors the
    /// never-fail-init-over-storage policy: worst case is an empty cache.
    pub fn open_default_with_limits(data_dir: &Path, limits: StoreLimits) -> Self {
        if let Err(e) = std::fs::create_dir_all(data_dir) {
            warn!("could not create data dir {:?}: {e}", data_dir);
        }
        let db_path = data_dir.join("conversations.db");
        match SqliteBackend::open(&db_path) {
            Ok(backend) => Self::open_with_limits(Box::new(backend), limits),
            Err(e) => {
                warn!("sqlite unavailable ({e}), falling back to json file store");
                let fallback = JsonFileBackend::new(data_dir.join("conversations.json"));
                Self::open_with_limits(Box::new(fallback), limits)
            }
        }
    }

    /// Insert or replace the conversation for its `(platform, contact)` key.
    ///
    /// Messages are trimmed to the last `max_messages`; when the cache
    /// exceeds `max_conversations` keys the entries with the smallest
    /// conversation timestamps are evicted. The full cache is persisted
    /// synchronously before listeners are notified.
    pub fn update_conversation(&self, mut conversation: ParsedConversation) {
        if conversation.messages.is_empty() {
            debug!("dropping conversation with no messages");
            return;
        }
        if conversation.messages.len() > self.limits.max_messages {
            let excess = conversation.messages.len() - self.limits.max_messages;
            conversation.messages.drain(..excess);
        }

        let key = conversation.store_key();
        let (listeners, stored) = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.cache.insert(key.clone(), conversation);

            while inner.cache.len() > self.limits.max_conversations {
                let oldest = inner
                    .cache
                    .iter()
                    .min_by_key(|(_, c)| c.timestamp_ms)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        debug!(key = %k, "evicting least recent conversation");
                        inner.cache.remove(&k);
                    }
                    None => break,
                }
            }

            if let Err(e) = persist(&mut inner) {
                // In-memory cache stays authoritative; the next successful
                // save reconciles.
                warn!("failed to persist conversations: {e}");
            }

            let stored = inner.cache.get(&key).cloned();
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (listeners, stored)
        };

        // Notify on a snapshot, outside the lock, so a listener touching the
        // store or the registry cannot corrupt iteration or deadlock.
        if let Some(stored) = stored {
            for listener in listeners {
                listener(&key, &stored);
            }
        }
    }

    /// Exact key lookup.
    pub fn get_conversation(
        &self,
        platform: Platform,
        contact_name: &str,
    ) -> Option<ParsedConversation> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.cache.get(&conversation_key(platform, contact_name)).cloned()
    }

    /// Most recently captured conversation for a platform, if any.
    pub fn get_active_conversation(&self, platform: Platform) -> Option<ParsedConversation> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .cache
            .values()
            .filter(|c| c.platform == platform)
            .max_by_key(|c| c.timestamp_ms)
            .cloned()
    }

    /// Snapshot copy of every cached conversation.
    pub fn all_conversations(&self) -> Vec<ParsedConversation> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.cache.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register an update callback; returns a handle for removal.
    pub fn add_listener(
        &self,
        listener: impl Fn(&str, &ParsedConversation) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; removing an unknown id is a no-op.
    pub fn remove_listener(&self, id: ListenerId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.listeners.retain(|(lid, _)| *lid != id);
    }
}

fn persist(inner: &mut StoreInner) -> Result<(), StoreError> {
    let mut conversations: Vec<ParsedConversation> = inner.cache.values().cloned().collect();
    conversations.sort_by_key(|c| c.timestamp_ms);
    let blob = serde_json::to_string(&PersistedBlob {
        schema_version: SCHEMA_VERSION,
        conversations,
    })?;
    inner.backend.save(&blob)
}

/// Decode a persisted blob, migrating older layouts forward.
///
/// Version 0 (pre-versioning) was a bare JSON array of conversations; v1
/// wraps it with `schema_version`. Unknown future versions are refused.
fn deserialize_blob(blob: &str) -> Result<Vec<ParsedConversation>, StoreError> {
    if let Ok(versioned) = serde_json::from_str::<PersistedBlob>(blob) {
        return match versioned.schema_version {
            SCHEMA_VERSION => Ok(versioned.conversations),
            other => {
                warn!("unsupported schema version {other}, ignoring persisted data");
                Ok(Vec::new())
            }
        };
    }
    // Legacy bare-array layout.
    let legacy: Vec<ParsedConversation> = serde_json::from_str(blob)?;
    debug!("migrated legacy conversation blob ({} entries)", legacy.len());
    Ok(legacy)
}
