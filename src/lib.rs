//! An in-memory, POSIX-shaped filesystem core.
//!
//! This crate holds the data model and the operations a FUSE bridge (or any
//! other userspace filesystem front end) needs to drive: inodes, directory
//! entries, sparse file storage, descriptors, extended attributes, hard
//! links and rename. It does not itself mount anything or speak the FUSE
//! wire protocol -- [`adapter`] only shapes calls and errors the way a
//! bridge expects them; wiring that up to an actual mount point is left to
//! the embedding binary.
//!
//! Nothing here is durable: the whole tree lives on the heap and is gone
//! the moment the last [`fs::FileSystem`] is dropped.

#![deny(missing_docs)]

pub mod adapter;
pub mod block;
pub mod consts;
pub mod entry;
pub mod error;
pub mod fd;
pub mod fs;
pub mod inode;
pub mod path;
pub mod stat;

pub use consts::Constants;
pub use error::{ErrnoKind, FsError, Result};
pub use fs::FileSystem;
pub use stat::Stat;
