//! Memoized schedule parsing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use lazy_static::lazy_static;

use crate::error::PolicyError;
use crate::retention::schedule::{parse_schedule, Schedule};

lazy_static! {
    static ref PROCESS_CACHE: Arc<ScheduleCache> = Arc::new(ScheduleCache::new());
}

/// Parsed schedules keyed by their exact policy text.
///
/// Entries never expire: the set of configured policies is small and fixed
/// for the life of a process. Parsing happens under the lock, so concurrent
/// callers asking for the same policy parse it once and share the result.
/// Policies that fail to parse are not cached.
#[derive(Debug, Default)]
pub struct ScheduleCache {
    entries: Mutex<HashMap<String, Arc<Schedule>>>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every [`Pruner`](crate::retention::Pruner) built
    /// with `Pruner::new()`.
    pub fn shared() -> Arc<ScheduleCache> {
        Arc::clone(&PROCESS_CACHE)
    }

    /// Return the cached schedule for `text`, parsing it on a miss.
    pub fn get_or_parse(&self, text: &str) -> Result<Arc<Schedule>, PolicyError> {
        let mut entries = self.lock();
        if let Some(schedule) = entries.get(text) {
            return Ok(Arc::clone(schedule));
        }
        let schedule = Arc::new(parse_schedule(text)?);
        entries.insert(text.to_string(), Arc::clone(&schedule));
        Ok(schedule)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lock().contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Schedule>>> {
        // Inserts are single statements, so a poisoned map is still whole.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn hit_returns_same_schedule() {
        let cache = ScheduleCache::new();
        let first = cache.get_or_parse("6,1h2d,1d2w").unwrap();
        let second = cache.get_or_parse("6,1h2d,1d2w").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_on_exact_text() {
        let cache = ScheduleCache::new();
        let a = cache.get_or_parse("1d2w").unwrap();
        let b = cache.get_or_parse(" 1d2w ").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = ScheduleCache::new();
        assert!(cache.get_or_parse("2d1d").is_err());
        assert!(!cache.contains("2d1d"));
        assert!(cache.is_empty());
    }

    #[test]
    fn separate_caches_are_isolated() {
        let a = ScheduleCache::new();
        let b = ScheduleCache::new();
        a.get_or_parse("1h1d").unwrap();
        assert!(a.contains("1h1d"));
        assert!(!b.contains("1h1d"));
    }

    #[test]
    fn concurrent_lookups_share_one_entry() {
        let cache = Arc::new(ScheduleCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_parse("3,1h1d,1d1w").unwrap())
            })
            .collect();
        let schedules: Vec<Arc<Schedule>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for schedule in &schedules[1..] {
            assert!(Arc::ptr_eq(&schedules[0], schedule));
        }
        assert_eq!(cache.len(), 1);
    }
}
