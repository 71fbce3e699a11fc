pub mod cli;
pub mod config;
pub mod error;
pub mod news;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use news::{CacheSnapshot, Category, NewsItem};
pub use storage::{NewsCache, NewsRepository};
