//! Transaction scoped object cache
//!
//! Holds objects computed once per transaction (compiled patterns, bound
//! plans, scan states). Nothing here outlives the transaction.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::error::{KuzuError, Result};

type CachedObject = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct LocalCacheManager {
    cache: Mutex<HashMap<String, CachedObject>>,
}

impl LocalCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.lock().contains_key(key)
    }

    /// Insert unless `key` is taken; returns whether the object was stored
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, object: T) -> bool {
        let mut cache = self.cache.lock();
        let key = key.into();
        if cache.contains_key(&key) {
            return false;
        }
        cache.insert(key, Arc::new(object));
        true
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let object = self.cache.lock().get(key)?.clone();
        object.downcast::<T>().ok()
    }

    /// The cached object for `key`, building it on first use
    ///
    /// `build` runs without the cache lock held, so it may use the cache
    /// itself. When two callers race, the first object stored wins.
    pub fn get_or_insert_with<T, F>(&self, key: &str, build: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T>,
    {
        let cached = self.cache.lock().get(key).cloned();
        let object = match cached {
            Some(object) => object,
            None => {
                let built: CachedObject = Arc::new(build()?);
                self.cache
                    .lock()
                    .entry(key.to_string())
                    .or_insert(built)
                    .clone()
            }
        };
        object.downcast::<T>().map_err(|_| {
            KuzuError::Runtime(format!(
                "Cached object {} has a different type than requested.",
                key
            ))
        })
    }

    pub fn remove(&self, key: &str) -> bool {
        self.cache.lock().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl std::fmt::Debug for LocalCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCacheManager")
            .field("num_objects", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_type_mismatch() {
        let cache = LocalCacheManager::new();
        assert!(cache.put("scan_state", vec![1u64, 2, 3]));
        assert!(!cache.put("scan_state", vec![4u64]));
        assert_eq!(*cache.get::<Vec<u64>>("scan_state").unwrap(), vec![1, 2, 3]);
        assert!(cache.get::<String>("scan_state").is_none());
        assert!(cache
            .get_or_insert_with("scan_state", || Ok(String::new()))
            .is_err());
    }

    #[test]
    fn test_build_once() {
        let cache = LocalCacheManager::new();
        let mut builds = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_insert_with("answer", || {
                    builds += 1;
                    Ok(42i64)
                })
                .unwrap();
            assert_eq!(*value, 42);
        }
        assert_eq!(builds, 1);
        assert!(cache.remove("answer"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_builder_may_use_the_cache() {
        let cache = LocalCacheManager::new();
        let outer = cache
            .get_or_insert_with("plan", || {
                let pattern = cache.get_or_insert_with("pattern", || Ok("a+b".to_string()))?;
                Ok(format!("{} over {} cached objects", pattern, cache.len()))
            })
            .unwrap();
        assert_eq!(*outer, "a+b over 1 cached objects");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_builder_result_loses_to_an_earlier_insert() {
        let cache = LocalCacheManager::new();
        let value = cache
            .get_or_insert_with("counter", || {
                assert!(cache.put("counter", 1u32));
                Ok(2u32)
            })
            .unwrap();
        assert_eq!(*value, 1);
        assert_eq!(*cache.get::<u32>("counter").unwrap(), 1);
    }
}
