use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct ConversationEntry {
    conversation_id: String,
    last_active_at: Instant,
}

/// Per-space conversation continuity with a TTL.
///
/// Holds at most one active conversation per space. Entries expire after
/// `ttl` (30 minutes by default) and are evicted lazily on lookup; there is
/// no background sweep. State is process-lifetime only.
#[derive(Debug)]
pub struct ConversationTracker {
    ttl: Duration,
    entries: DashMap<String, ConversationEntry>,
}

impl Default for ConversationTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}

impl ConversationTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Upsert the active conversation for a space and reset its TTL.
    pub fn record(&self, space_id: &str, conversation_id: &str) {
        let now = Instant::now();
        self.entries
            .entry(space_id.to_string())
            .and_modify(|entry| {
                entry.conversation_id = conversation_id.to_string();
                entry.last_active_at = now;
            })
            .or_insert_with(|| ConversationEntry {
                conversation_id: conversation_id.to_string(),
                last_active_at: now,
            });
        debug!(target: "conversation_tracker", space_id, conversation_id, "recorded conversation");
    }

    /// Active conversation for a space, or `None` if absent or expired.
    /// An expired entry is evicted as a side effect of the lookup.
    pub fn get_active(&self, space_id: &str) -> Option<String> {
        let expired = match self.entries.get(space_id) {
            Some(entry) => {
                if entry.last_active_at.elapsed() < self.ttl {
                    return Some(entry.conversation_id.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(space_id);
            debug!(target: "conversation_tracker", space_id, "evicted expired conversation");
        }
        None
    }

    /// Most recently active space across all entries, for "ask without
    /// specifying a space" convenience.
    pub fn get_last_used_space(&self) -> Option<String> {
        self.evict_expired();
        self.entries
            .iter()
            .max_by_key(|entry| entry.value().last_active_at)
            .map(|entry| entry.key().clone())
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        self.evict_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self) {
        self.entries
            .retain(|_, entry| entry.last_active_at.elapsed() < self.ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn record_then_lookup() {
        let tracker = ConversationTracker::default();
        tracker.record("s1", "c1");
        assert_eq!(tracker.get_active("s1"), Some("c1".to_string()));
        assert_eq!(tracker.get_active("s2"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl_and_is_evicted() {
        let tracker = ConversationTracker::default();
        tracker.record("s1", "c1");

        advance(Duration::from_secs(31 * 60)).await;
        assert_eq!(tracker.get_active("s1"), None);
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn recording_refreshes_the_ttl() {
        let tracker = ConversationTracker::default();
        tracker.record("s1", "c1");

        advance(Duration::from_secs(20 * 60)).await;
        tracker.record("s1", "c2");

        advance(Duration::from_secs(20 * 60)).await;
        assert_eq!(tracker.get_active("s1"), Some("c2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn last_used_space_is_most_recent() {
        let tracker = ConversationTracker::default();
        tracker.record("s1", "c1");
        advance(Duration::from_secs(1)).await;
        tracker.record("s2", "c2");
        assert_eq!(tracker.get_last_used_space(), Some("s2".to_string()));

        advance(Duration::from_secs(1)).await;
        tracker.record("s1", "c3");
        assert_eq!(tracker.get_last_used_space(), Some("s1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_do_not_count_as_last_used() {
        let tracker = ConversationTracker::new(Duration::from_secs(60));
        tracker.record("s1", "c1");
        advance(Duration::from_secs(30)).await;
        tracker.record("s2", "c2");

        // s1 ages out; s2 is still live.
        advance(Duration::from_secs(40)).await;
        assert_eq!(tracker.get_last_used_space(), Some("s2".to_string()));
        assert_eq!(tracker.len(), 1);
    }
}
