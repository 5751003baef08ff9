// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Identifies a compiled count projection: the group key type, the entity
/// type and the field grouped on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub key_type: TypeId,
    pub entity_type: TypeId,
    pub group_field: String,
}

impl ProjectionKey {
    pub fn of<K: 'static, E: 'static>(group_field: &str) -> Self {
        Self {
            key_type: TypeId::of::<K>(),
            entity_type: TypeId::of::<E>(),
            group_field: group_field.to_string(),
        }
    }
}

/// Read-mostly cache of compiled count projections, safe to share between
/// concurrent calls. Each key is built at most once.
pub struct ProjectionCache<V> {
    entries: RwLock<HashMap<ProjectionKey, Arc<V>>>,
}

impl<V> Default for ProjectionCache<V> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<V> ProjectionCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ProjectionKey) -> Option<Arc<V>> {
        self.entries.read().get(key).cloned()
    }

    pub fn get_or_insert_with<F>(&self, key: ProjectionKey, build: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(entry) = self.get(&key) {
            return entry;
        }
        let mut entries = self.entries.write();
        entries.entry(key).or_insert_with(|| Arc::new(build())).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;

    struct Block;
    struct Transaction;

    #[test]
    fn test_builds_once_per_key() {
        let cache = ProjectionCache::<String>::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            "SELECT block_id, COUNT(*)".to_string()
        };

        let key = || ProjectionKey::of::<String, Transaction>("block_id");
        let first = cache.get_or_insert_with(key(), build);
        let second = cache.get_or_insert_with(key(), || {
            builds.fetch_add(1, Ordering::SeqCst);
            String::new()
        });
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        cache.get_or_insert_with(ProjectionKey::of::<String, Block>("block_id"), String::new);
        cache.get_or_insert_with(ProjectionKey::of::<i64, Transaction>("block_id"), String::new);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_concurrent_inserts_agree() {
        let cache = Arc::new(ProjectionCache::<usize>::new());
        let handles = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    *cache.get_or_insert_with(ProjectionKey::of::<i64, Block>("producer_id"), || i)
                })
            })
            .collect::<Vec<_>>();

        let values = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
        assert!(values.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
    }
}
