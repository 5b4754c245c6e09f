use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::adapters::{CacheKey, SchemaCache};
use crate::schema_registry::SchemaRecord;

type RecordMap = HashMap<CacheKey, SchemaRecord>;
type SchemaMap = HashMap<u32, String>;

/// Once `capacity` entries are held, new keys are not cached.
pub struct MemoryCache {
    capacity: Option<usize>,
    records: Mutex<RecordMap>,
    schemas: Mutex<SchemaMap>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryCache {
    pub fn new(capacity: Option<usize>) -> Self {
        MemoryCache {
            capacity,
            records: Mutex::new(HashMap::new()),
            schemas: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_room<K, V>(&self, map: &HashMap<K, V>) -> bool {
        self.capacity.map_or(true, |capacity| map.len() < capacity)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        MemoryCache::new(None)
    }
}

impl SchemaCache for MemoryCache {
    fn get_record(&self, key: &CacheKey) -> Option<SchemaRecord> {
        lock(&self.records).get(key).cloned()
    }

    fn insert_record(&self, key: CacheKey, record: SchemaRecord) {
        let mut records = lock(&self.records);

        if records.contains_key(&key) || self.has_room(&records) {
            records.insert(key, record);
        } else {
            debug!("cache full, not caching {:?}", key);
        }
    }

    fn get_schema(&self, schema_id: u32) -> Option<String> {
        lock(&self.schemas).get(&schema_id).cloned()
    }

    fn insert_schema(&self, schema_id: u32, schema: String) {
        let mut schemas = lock(&self.schemas);

        if schemas.contains_key(&schema_id) || self.has_room(&schemas) {
            schemas.insert(schema_id, schema);
        } else {
            debug!("cache full, not caching schema id {}", schema_id);
        }
    }
}
