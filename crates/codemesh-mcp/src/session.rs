//! Session cache for MCP tool calls. Sessions are additive-only
//! and purely an optimization — every tool works correctly with no
//! `session_id` at all.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_QUERY_HISTORY: usize = 20;
const MAX_FOCUS_AREA: usize = 10;
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub seen_symbols: std::collections::HashSet<String>,
    pub query_history: std::collections::VecDeque<String>,
    pub focus_area: Vec<String>,
    pub waypoints: Vec<String>,
    pub recap: String,
}

impl Session {
    pub fn record_query(&mut self, query: &str) {
        self.query_history.push_back(query.to_string());
        while self.query_history.len() > MAX_QUERY_HISTORY {
            self.query_history.pop_front();
        }
    }

    pub fn mark_seen(&mut self, symbol_ids: impl IntoIterator<Item = String>) {
        self.seen_symbols.extend(symbol_ids);
    }

    pub fn set_focus(&mut self, symbol_ids: Vec<String>) {
        self.focus_area = symbol_ids.into_iter().take(MAX_FOCUS_AREA).collect();
    }
}

struct Entry {
    session: Session,
    touched_at: Instant,
}

/// In-process `session_id -> Session` cache, stateless-transport
/// friendly: a lookup miss (expired or unknown id) just returns a fresh
/// empty session rather than erroring: a stale session id returns a
/// fresh temporary session instead of an error.
#[derive(Clone)]
pub struct SessionCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Spawns a background task that periodically evicts sessions past
    /// their TTL. Call once, at server startup.
    pub fn spawn_sweeper(&self) {
        let entries = self.entries.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                entries.retain(|_, entry| entry.touched_at.elapsed() < SESSION_TTL);
            }
        });
    }

    pub fn get(&self, session_id: &str) -> Session {
        self.entries
            .get(session_id)
            .filter(|entry| entry.touched_at.elapsed() < SESSION_TTL)
            .map(|entry| entry.session.clone())
            .unwrap_or_default()
    }

    pub fn put(&self, session_id: &str, session: Session) {
        self.entries.insert(
            session_id.to_string(),
            Entry {
                session,
                touched_at: Instant::now(),
            },
        );
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_id_returns_empty_session() {
        let cache = SessionCache::new();
        let session = cache.get("nope");
        assert!(session.seen_symbols.is_empty());
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = SessionCache::new();
        let mut session = Session::default();
        session.mark_seen(["a".to_string()]);
        cache.put("s1", session);
        let fetched = cache.get("s1");
        assert!(fetched.seen_symbols.contains("a"));
    }

    #[test]
    fn query_history_caps_at_twenty() {
        let mut session = Session::default();
        for i in 0..30 {
            session.record_query(&format!("q{i}"));
        }
        assert_eq!(session.query_history.len(), MAX_QUERY_HISTORY);
        assert_eq!(session.query_history.front().unwrap(), "q10");
    }

    #[test]
    fn focus_area_caps_at_ten() {
        let mut session = Session::default();
        session.set_focus((0..20).map(|i| i.to_string()).collect());
        assert_eq!(session.focus_area.len(), MAX_FOCUS_AREA);
    }
}
