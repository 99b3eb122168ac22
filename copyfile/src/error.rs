//! Errors produced while copying or moving a file.
//!
//! Every OS-level failure keeps the path it happened on and the underlying
//! `io::Error` as its source, so callers can print the full causal chain.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors produced by [`crate::TransferRequest`].
#[derive(Debug, Error)]
pub enum TransferError {
    /// The source cannot be stat'ed or is not a regular file.
    #[error("source path {} does not exist or is not a regular file", path.display())]
    SourceNotFound {
        /// Source path as given.
        path: PathBuf,
    },
    /// The parent directory of the destination cannot be stat'ed.
    #[error("destination directory {} does not exist", path.display())]
    DestinationDirMissing {
        /// Directory that was expected to hold the destination.
        path: PathBuf,
        /// Underlying stat error.
        source: io::Error,
    },
    /// Source and effective destination name the same inode.
    #[error("'{}' is the same file as '{}'", from.display(), to.display())]
    SameFile {
        /// Source path.
        from: PathBuf,
        /// Effective destination path.
        to: PathBuf,
    },
    /// Opening the source or creating the destination failed.
    #[error("cannot open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    /// A read from the source failed.
    #[error("reading {} failed", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// A write to the destination failed.
    #[error("writing {} failed", path.display())]
    Write { path: PathBuf, source: io::Error },
    /// The destination stopped accepting bytes before the chunk was written.
    #[error("short write to {}", path.display())]
    ShortWrite { path: PathBuf, source: io::Error },
    /// `rename` failed for a reason other than crossing filesystems.
    #[error("renaming {} to {} failed", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The source could not be removed after a move fell back to copying.
    #[error("removing {} after copying it failed", path.display())]
    Unlink { path: PathBuf, source: io::Error },
    /// Data was fully copied but a metadata update on the destination failed.
    #[error("copied {} but could not preserve its {attribute}", path.display())]
    Attributes {
        /// Destination path.
        path: PathBuf,
        /// Which attribute failed: permissions, ownership or timestamps.
        attribute: &'static str,
        /// Underlying error.
        source: io::Error,
    },
}

impl TransferError {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        if source.kind() == ErrorKind::WriteZero {
            Self::ShortWrite {
                path: path.to_path_buf(),
                source,
            }
        } else {
            Self::Write {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn attributes(path: &Path, attribute: &'static str, source: io::Error) -> Self {
        Self::Attributes {
            path: path.to_path_buf(),
            attribute,
            source,
        }
    }

    /// True when the data transfer itself succeeded and only metadata
    /// propagation failed.
    pub fn is_attribute_failure(&self) -> bool {
        matches!(self, Self::Attributes { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_write_maps_to_short_write() {
        let err = TransferError::write(Path::new("dst"), io::Error::from(ErrorKind::WriteZero));
        assert!(matches!(err, TransferError::ShortWrite { .. }));

        let err = TransferError::write(Path::new("dst"), io::Error::from(ErrorKind::Other));
        assert!(matches!(err, TransferError::Write { .. }));
    }

    #[test]
    fn test_same_file_message_names_both_paths() {
        let err = TransferError::SameFile {
            from: PathBuf::from("a.txt"),
            to: PathBuf::from("./a.txt"),
        };
        assert_eq!(err.to_string(), "'a.txt' is the same file as './a.txt'");
    }
}
