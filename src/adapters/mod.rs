pub use memory::MemoryCache;

use crate::schema_registry::SchemaRecord;

mod memory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    Latest,
    Version(u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject: String,
    pub selector: VersionSelector,
}

impl CacheKey {
    pub fn latest(subject: &str) -> Self {
        CacheKey {
            subject: subject.to_string(),
            selector: VersionSelector::Latest,
        }
    }

    pub fn version(subject: &str, version: u32) -> Self {
        CacheKey {
            subject: subject.to_string(),
            selector: VersionSelector::Version(version),
        }
    }
}

pub trait SchemaCache: Send + Sync {
    fn get_record(&self, key: &CacheKey) -> Option<SchemaRecord>;
    fn insert_record(&self, key: CacheKey, record: SchemaRecord);
    fn get_schema(&self, schema_id: u32) -> Option<String>;
    fn insert_schema(&self, schema_id: u32, schema: String);
}
