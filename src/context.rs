//! The sink map functions emit into.

use std::collections::BTreeMap;
use std::hash::Hash;

use dashmap::DashMap;
use fnv::FnvBuildHasher;

/// Values emitted by the map phase, grouped by key.
///
/// Keys iterate in ascending order, which is the order the reduce phase
/// partitions them in.
pub type GroupedView<K, V> = BTreeMap<K, Vec<V>>;

/// A sink that map functions write `(key, value)` pairs into.
///
/// Implementations must accept writes from any number of threads at once.
pub trait MapContext<K, V>: Sync {
    fn write(&self, key: K, value: V);
}

/// In-memory [`MapContext`] that groups values per key.
///
/// Storage is a sharded map, so writers emitting different keys rarely
/// contend on the same lock. Values written by one thread keep their relative
/// order under a key; there is no order across threads.
pub struct InMemoryMapContext<K, V> {
    storage: DashMap<K, Vec<V>, FnvBuildHasher>,
}

impl<K, V> InMemoryMapContext<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            storage: DashMap::with_hasher(FnvBuildHasher::default()),
        }
    }

    /// Number of distinct keys written so far.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Consumes the context and hands over everything written to it.
    ///
    /// Taking `self` by value means no writer can still be running.
    pub fn into_grouped_view(self) -> GroupedView<K, V>
    where
        K: Ord,
    {
        self.storage.into_iter().collect()
    }
}

impl<K, V> Default for InMemoryMapContext<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MapContext<K, V> for InMemoryMapContext<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn write(&self, key: K, value: V) {
        self.storage.entry(key).or_default().push(value);
    }
}
