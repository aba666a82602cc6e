//! leitbox-store — `KvStore` backends.
//!
//! Implements the `KvStore` trait from `leitbox-core`: an in-memory store
//! for tests and smoke runs, and a single-file JSON store for the CLI.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
