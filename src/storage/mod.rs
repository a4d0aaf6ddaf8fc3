//! Browser-style local storage: string keys to string values.

pub mod memory;
pub mod writer;

pub use memory::MemoryStorage;
pub use writer::{StorageWrite, StorageWriter};

use crate::error::Result;

/// Key/value store behind the cache helper. Either call may fail; callers
/// treat a failed read as absent and a failed write as skipped.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: String) -> Result<()>;
}
