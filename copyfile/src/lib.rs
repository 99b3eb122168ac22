//! Byte-level copy and move of single regular files.
//!
//! This crate backs both the standalone `copyfile` tool and the `cp`/`mv`
//! built-ins of the shell. It works directly with file handles and path
//! metadata: the source and destination are classified with `stat`, the
//! "destination is a directory" case is resolved to `directory/basename`,
//! and a copy onto the very same inode is refused before any byte is
//! written.
//!
//! The main entry points are [`copy_file`] and [`move_file`]. For finer
//! control (read chunk size, forcing the cross-device path) build a
//! [`TransferRequest`] directly.

mod byte_io;
mod error;
mod transfer;

pub use byte_io::{READ_CHUNK_CAP, read_chunk, write_chunk};
pub use error::{TransferError, TransferResult};
pub use transfer::{
    FileKind, IdentityKey, MoveOutcome, PathMetadata, TransferRequest, copy_file, move_file,
};
