//! # ViewStore Storage
//!
//! Store file handling for ViewStore.
//!
//! This crate is the lowest layer of ViewStore. It deals in **lines**, not
//! records: it frames files into lines regardless of how reads are chunked,
//! and replaces the store file atomically. It has no knowledge of the record
//! encoding or the field schema.
//!
//! ## Design Principles
//!
//! - Lines are framed by `\n`, with an optional preceding `\r`
//! - A partial line at a chunk boundary is carried into the next chunk
//! - Writes go to a temporary sibling that is renamed over the store
//! - All I/O is async on tokio
//!
//! ## Example
//!
//! ```rust
//! use viewstore_storage::LineSplitter;
//!
//! let mut splitter = LineSplitter::new();
//! assert!(splitter.push(b"STB|TI").unwrap().is_empty());
//! let lines = splitter.push(b"TLE\r\n").unwrap();
//! assert_eq!(lines[0].text, "STB|TITLE");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod lines;

pub use error::{StorageError, StorageResult};
pub use file::{AtomicWriter, StoreFile};
pub use lines::{Line, LineReader, LineSplitter, DEFAULT_CHUNK_SIZE, LINE_TERMINATOR};
