//! Ownership of the per-session vector stores.
//!
//! Each session holds at most one store. Uploading again replaces it, a reset
//! evicts it, and with a TTL configured entries older than the TTL are treated
//! as absent and dropped by [`SessionStoreRegistry::purge_expired`].

use crate::traits::VectorIndex;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque identifier handed to a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

struct StoreEntry {
    index: Arc<dyn VectorIndex>,
    source_path: String,
    created_at: DateTime<Utc>,
}

pub struct SessionStoreRegistry {
    stores: RwLock<HashMap<SessionId, StoreEntry>>,
    ttl: Option<Duration>,
}

impl Default for SessionStoreRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStoreRegistry {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, entry: &StoreEntry, now: DateTime<Utc>) -> bool {
        self.ttl
            .is_some_and(|ttl| now.signed_duration_since(entry.created_at) >= ttl)
    }

    /// Installs `index` for `session`, returning whether a previous store was dropped.
    pub async fn replace(
        &self,
        session: SessionId,
        index: Arc<dyn VectorIndex>,
        source_path: impl Into<String>,
    ) -> bool {
        let source_path = source_path.into();
        let previous = self.stores.write().await.insert(
            session,
            StoreEntry {
                index,
                source_path: source_path.clone(),
                created_at: Utc::now(),
            },
        );

        if let Some(previous) = &previous {
            info!(
                %session,
                previous = %previous.source_path,
                current = %source_path,
                "replaced session store"
            );
        }

        previous.is_some()
    }

    pub async fn get(&self, session: &SessionId) -> Option<Arc<dyn VectorIndex>> {
        let stores = self.stores.read().await;
        let entry = stores.get(session)?;
        if self.is_expired(entry, Utc::now()) {
            debug!(%session, "session store expired");
            return None;
        }
        Some(Arc::clone(&entry.index))
    }

    pub async fn contains(&self, session: &SessionId) -> bool {
        self.get(session).await.is_some()
    }

    pub async fn evict(&self, session: &SessionId) -> bool {
        let removed = self.stores.write().await.remove(session).is_some();
        if removed {
            info!(%session, "evicted session store");
        }
        removed
    }

    /// Drops every entry that has outlived the TTL as of `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - stores.len();
        if purged > 0 {
            info!(purged, remaining = stores.len(), "purged expired session stores");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.stores.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stores.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryVectorIndex;

    fn store() -> Arc<dyn VectorIndex> {
        Arc::new(InMemoryVectorIndex::new())
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().expect("uuid text");
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[tokio::test]
    async fn second_upload_replaces_first() {
        let registry = SessionStoreRegistry::default();
        let session = SessionId::new();
        let first = store();
        let second = store();

        assert!(!registry.replace(session, Arc::clone(&first), "pdf/a.pdf").await);
        assert!(registry.replace(session, Arc::clone(&second), "pdf/b.pdf").await);

        let current = registry.get(&session).await.expect("store present");
        assert!(Arc::ptr_eq(&current, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn evict_removes_only_that_session() {
        let registry = SessionStoreRegistry::default();
        let kept = SessionId::new();
        let dropped = SessionId::new();
        registry.replace(kept, store(), "pdf/a.pdf").await;
        registry.replace(dropped, store(), "pdf/b.pdf").await;

        assert!(registry.evict(&dropped).await);
        assert!(!registry.evict(&dropped).await);
        assert!(registry.contains(&kept).await);
        assert!(!registry.contains(&dropped).await);
    }

    #[tokio::test]
    async fn expired_entries_are_hidden_and_purged() {
        let registry = SessionStoreRegistry::new(Some(Duration::minutes(30)));
        let session = SessionId::new();
        registry.replace(session, store(), "pdf/a.pdf").await;

        assert!(registry.contains(&session).await);
        assert_eq!(registry.purge_expired(Utc::now()).await, 0);

        let later = Utc::now() + Duration::minutes(31);
        assert_eq!(registry.purge_expired(later).await, 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let registry = SessionStoreRegistry::new(Some(Duration::zero()));
        let session = SessionId::new();
        registry.replace(session, store(), "pdf/a.pdf").await;
        assert!(registry.get(&session).await.is_none());
    }

    #[tokio::test]
    async fn without_ttl_nothing_is_purged() {
        let registry = SessionStoreRegistry::default();
        registry.replace(SessionId::new(), store(), "pdf/a.pdf").await;
        let far_future = Utc::now() + Duration::days(365);
        assert_eq!(registry.purge_expired(far_future).await, 0);
        assert_eq!(registry.len().await, 1);
    }
}
