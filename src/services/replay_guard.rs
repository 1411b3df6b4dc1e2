use std::{collections::HashMap, sync::Mutex};

/// Map size below which expired entries are left in place.
const PRUNE_FLOOR: usize = 1024;

/// Keys remembered until a unix expiry timestamp.
///
/// Backs the consumed-nonce set and the revoked-session set. Expired entries
/// are swept on insert once the map has doubled since the last sweep, so the
/// cost of pruning is amortized across inserts.
#[derive(Debug)]
pub struct ExpiringSet {
    inner: Mutex<Entries>,
}

#[derive(Debug)]
struct Entries {
    expiries: HashMap<String, i64>,
    prune_at: usize,
}

impl Default for ExpiringSet {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Entries {
                expiries: HashMap::new(),
                prune_at: PRUNE_FLOOR,
            }),
        }
    }
}

impl ExpiringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key` unless a live entry exists. Returns `false` when the key
    /// was already present, which the caller treats as a replay.
    pub fn insert_if_absent(&self, key: &str, expires_at: i64, now: i64) -> bool {
        let mut entries = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if entries.expiries.get(key).is_some_and(|exp| *exp > now) {
            return false;
        }

        if entries.expiries.len() >= entries.prune_at {
            entries.expiries.retain(|_, exp| *exp > now);
            entries.prune_at = (entries.expiries.len() * 2).max(PRUNE_FLOOR);
        }

        entries.expiries.insert(key.to_string(), expires_at);
        true
    }

    pub fn contains(&self, key: &str, now: i64) -> bool {
        let entries = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        entries.expiries.get(key).is_some_and(|exp| *exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(set: &ExpiringSet) -> usize {
        set.inner.lock().unwrap().expiries.len()
    }

    #[test]
    fn second_insert_is_rejected_while_live() {
        let set = ExpiringSet::new();
        assert!(set.insert_if_absent("nonce-1", 200, 100));
        assert!(!set.insert_if_absent("nonce-1", 200, 150));
        assert!(set.contains("nonce-1", 199));
    }

    #[test]
    fn expired_key_can_be_inserted_again() {
        let set = ExpiringSet::new();
        assert!(set.insert_if_absent("a", 200, 100));
        assert!(!set.contains("a", 200));
        assert!(set.insert_if_absent("a", 700, 300));
        assert!(set.contains("a", 699));
    }

    #[test]
    fn sweeps_only_once_the_map_has_grown() {
        let set = ExpiringSet::new();
        assert!(set.insert_if_absent("live", 10_000, 100));
        for i in 1..PRUNE_FLOOR {
            assert!(set.insert_if_absent(&format!("old-{}", i), 200, 100));
        }
        assert_eq!(stored(&set), PRUNE_FLOOR);

        // Below the floor nothing is swept, even though "old-*" has expired.
        assert!(!set.contains("old-1", 300));
        assert_eq!(stored(&set), PRUNE_FLOOR);

        // Past the floor at a time when every "old-*" entry is expired.
        assert!(set.insert_if_absent("fresh", 10_000, 500));
        assert_eq!(stored(&set), 2);
        assert!(set.contains("live", 500));
        assert!(set.contains("fresh", 500));
    }

    #[test]
    fn empty_by_default() {
        let set = ExpiringSet::new();
        assert_eq!(stored(&set), 0);
        assert!(!set.contains("anything", 0));
    }
}
