//! One directory controller per browser session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::directory::{DirectoryController, DirectoryScope, SearchEngine};
use crate::graph::GraphResult;
use crate::graph::client::GraphClientProvider;

struct SessionEntry {
    controller: Arc<DirectoryController>,
    last_seen: DateTime<Utc>,
}

/// In-memory registry of directory controllers keyed by session id.
///
/// Entries idle for longer than `idle_timeout` are dropped on the next
/// lookup.
pub struct DirectorySessions {
    provider: GraphClientProvider,
    scope: DirectoryScope,
    idle_timeout: TimeDelta,
    entries: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl DirectorySessions {
    pub fn new(provider: GraphClientProvider, scope: DirectoryScope, idle_timeout: TimeDelta) -> Self {
        Self {
            provider,
            scope,
            idle_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the controller of `session_id`, creating it on first use.
    ///
    /// Creation resolves the Graph client; a resolution failure is returned
    /// and nothing is registered.
    pub async fn controller(&self, session_id: Uuid) -> GraphResult<Arc<DirectoryController>> {
        self.controller_at(session_id, Utc::now()).await
    }

    async fn controller_at(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> GraphResult<Arc<DirectoryController>> {
        {
            let mut entries = self.entries.lock();
            self.prune(&mut entries, now);
            if let Some(entry) = entries.get_mut(&session_id) {
                entry.last_seen = now;
                return Ok(entry.controller.clone());
            }
        }

        let transport = self.provider.resolve().await?;
        let engine = SearchEngine::new(transport, self.provider.graph_url(), self.scope);
        let controller = Arc::new(DirectoryController::new(engine));

        let mut entries = self.entries.lock();
        let entry = entries.entry(session_id).or_insert_with(|| {
            log::info!("Created directory session {session_id}");
            SessionEntry {
                controller,
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Ok(entry.controller.clone())
    }

    fn prune(&self, entries: &mut HashMap<Uuid, SessionEntry>, now: DateTime<Utc>) {
        let before = entries.len();
        entries.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);
        let pruned = before - entries.len();
        if pruned > 0 {
            log::debug!("Pruned {pruned} idle directory sessions");
        }
    }
}
