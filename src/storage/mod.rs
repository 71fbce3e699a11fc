pub mod cache;
pub mod file_store;
pub mod repository;
pub mod traits;

pub use cache::{CacheConfig, CacheStats, CacheStatus, NewsCache};
pub use file_store::FileStore;
pub use repository::{NewsRepository, FRONT_PAGE_LIMIT};
pub use traits::{KeyValueStore, MemoryStore};
