// Service exports
pub mod analytics;
pub mod cache;
pub mod source;

pub use cache::{CacheStats, CachedSource};
pub use source::{
    ClientRecord, Fixture, InMemorySource, PreferenceMatcher, SnapshotSource, SourceCall,
    SourceError, TherapistRecord,
};
