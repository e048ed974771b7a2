//! The session playlist and where its snapshots are kept.

mod storage;
mod store;

pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::PlaylistStore;
