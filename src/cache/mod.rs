//! In-process keyed string cache with per-entry TTLs and glob invalidation.
//! Values are opaque serialized responses; a miss (or an expired entry) just
//! means the caller reads storage, so nothing here ever surfaces an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Per-domain TTLs for the read surface.
pub mod ttl {
    use std::time::Duration;

    pub const TEAMS: Duration = Duration::from_secs(3600);
    pub const PLAYERS: Duration = Duration::from_secs(900);
    pub const GAMES: Duration = Duration::from_secs(300);
    pub const STATS: Duration = Duration::from_secs(300);
    pub const LEADERS: Duration = Duration::from_secs(600);
}

/// Patterns the scheduler invalidates after every write cycle.
pub const SYNC_PATTERNS: [&str; 7] = [
    "games:*", "game:*", "teams:*", "team:*", "stats:*", "standings:*", "defense:*",
];

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct Cache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        // Expired: drop it so the map does not grow without bound.
        self.entries.write().await.remove(key);
        None
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    pub async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove every key matching a `*`-wildcard pattern. Returns how many
    /// were dropped.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        before - entries.len()
    }
}

fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    // Pattern ended with '*'
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_semantics() {
        assert!(glob_match("games:*", "games:2024:5"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("team:*:stats", "team:abc:stats"));
        assert!(!glob_match("games:*", "game:2024:5"));
        assert!(glob_match("teams:all", "teams:all"));
        assert!(!glob_match("teams:all", "teams:one"));
    }

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let cache = Cache::new();
        cache.set("teams:all", "[]".into(), ttl::TEAMS).await;
        assert_eq!(cache.get("teams:all").await.as_deref(), Some("[]"));

        cache.delete("teams:all").await;
        assert_eq!(cache.get("teams:all").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = Cache::new();
        cache.set("games:today", "{}".into(), Duration::from_secs(5)).await;
        assert!(cache.get("games:today").await.is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get("games:today").await.is_none());
    }

    #[tokio::test]
    async fn pattern_delete_scans_keys() {
        let cache = Cache::new();
        cache.set("games:2024:1", "a".into(), ttl::GAMES).await;
        cache.set("games:2024:2", "b".into(), ttl::GAMES).await;
        cache.set("standings:2024:2", "c".into(), ttl::STATS).await;

        let removed = cache.delete_pattern("games:*").await;
        assert_eq!(removed, 2);
        assert!(cache.get("games:2024:1").await.is_none());
        assert!(cache.get("standings:2024:2").await.is_some());
    }
}
