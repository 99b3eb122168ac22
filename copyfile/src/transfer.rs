use std::fs::{self, File, FileTimes, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use nix::errno::Errno;
use nix::unistd::{Gid, Uid, chown};
use tracing::{debug, warn};

use crate::byte_io::{READ_CHUNK_CAP, read_chunk, write_chunk};
use crate::error::{TransferError, TransferResult};

/// Coarse file type as reported by `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Other,
}

/// `(device, inode)` pair naming one underlying file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub device: u64,
    pub inode: u64,
}

/// Snapshot of the metadata a transfer needs for one path.
///
/// Always queried fresh; nothing here is cached between transfers.
#[derive(Debug, Clone)]
pub struct PathMetadata {
    pub device: u64,
    pub inode: u64,
    pub kind: FileKind,
    /// Permission bits, including setuid/setgid/sticky.
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub accessed: SystemTime,
    pub modified: SystemTime,
}

impl PathMetadata {
    /// Stats `path`, following symlinks.
    pub fn query(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let file_type = meta.file_type();
        let kind = if file_type.is_file() {
            FileKind::Regular
        } else if file_type.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        };
        Ok(Self {
            device: meta.dev(),
            inode: meta.ino(),
            kind,
            mode: meta.mode() & 0o7777,
            uid: meta.uid(),
            gid: meta.gid(),
            accessed: meta.accessed()?,
            modified: meta.modified()?,
        })
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            device: self.device,
            inode: self.inode,
        }
    }
}

/// Which path a successful move took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Atomic rename within one filesystem.
    Renamed,
    /// Copy with attributes preserved, then unlink of the source.
    Copied,
}

/// A single-file copy or move.
///
/// ```no_run
/// use copyfile::TransferRequest;
///
/// let dst = TransferRequest::new("notes.txt", "/tmp")
///     .preserve_attributes(true)
///     .copy()?;
/// assert_eq!(dst, std::path::Path::new("/tmp/notes.txt"));
/// # Ok::<(), copyfile::TransferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TransferRequest {
    source: PathBuf,
    destination: PathBuf,
    preserve_attributes: bool,
    chunk_size: usize,
}

/// Paths and metadata after source/destination classification.
struct Resolved {
    source: PathMetadata,
    /// Effective destination: `destination/basename(source)` when the
    /// destination is an existing directory.
    destination: PathBuf,
    destination_identity: Option<IdentityKey>,
    /// Device of the directory that will hold the destination entry.
    target_device: u64,
}

impl Resolved {
    fn is_same_file(&self) -> bool {
        self.destination_identity == Some(self.source.identity())
    }
}

impl TransferRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            preserve_attributes: false,
            chunk_size: READ_CHUNK_CAP,
        }
    }

    /// Also copy permission bits, ownership and timestamps.
    pub fn preserve_attributes(mut self, preserve: bool) -> Self {
        self.preserve_attributes = preserve;
        self
    }

    /// Upper bound for a single read from the source.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Where the data would land if the transfer ran now.
    pub fn effective_destination(&self) -> TransferResult<PathBuf> {
        self.resolve().map(|resolved| resolved.destination)
    }

    /// Copies the source and returns the effective destination.
    ///
    /// With attribute preservation on, an [`TransferError::Attributes`]
    /// error means the data is in place and only metadata is off.
    pub fn copy(&self) -> TransferResult<PathBuf> {
        let resolved = self.resolve()?;
        if resolved.is_same_file() {
            return Err(TransferError::SameFile {
                from: self.source.clone(),
                to: resolved.destination,
            });
        }
        self.stream(&resolved, self.preserve_attributes)?;
        Ok(resolved.destination)
    }

    /// Moves the source: rename on one filesystem, copy+unlink across
    /// filesystems.
    pub fn rename_or_copy(&self) -> TransferResult<MoveOutcome> {
        let resolved = self.resolve()?;
        if resolved.is_same_file() {
            debug!(source = %self.source.display(), "move onto itself; renaming in place");
            self.rename(&resolved)?;
            return Ok(MoveOutcome::Renamed);
        }

        if resolved.source.device == resolved.target_device {
            match fs::rename(&self.source, &resolved.destination) {
                Ok(()) => return Ok(MoveOutcome::Renamed),
                Err(e) if e.raw_os_error() == Some(Errno::EXDEV as i32) => {
                    warn!(
                        source = %self.source.display(),
                        destination = %resolved.destination.display(),
                        "rename crossed a filesystem boundary; copying instead"
                    );
                }
                Err(source) => {
                    return Err(TransferError::Rename {
                        from: self.source.clone(),
                        to: resolved.destination,
                        source,
                    });
                }
            }
        }

        self.unlink_after_copy(&resolved)
    }

    /// The cross-device move path, usable on its own: copy with attributes,
    /// then unlink the source.
    pub fn copy_then_unlink(&self) -> TransferResult<MoveOutcome> {
        let resolved = self.resolve()?;
        if resolved.is_same_file() {
            return Err(TransferError::SameFile {
                from: self.source.clone(),
                to: resolved.destination,
            });
        }
        self.unlink_after_copy(&resolved)
    }

    fn resolve(&self) -> TransferResult<Resolved> {
        let source = PathMetadata::query(&self.source)
            .ok()
            .filter(|meta| meta.kind == FileKind::Regular)
            .ok_or_else(|| TransferError::SourceNotFound {
                path: self.source.clone(),
            })?;

        let parent = parent_dir(&self.destination);
        let parent_meta =
            fs::metadata(parent).map_err(|source| TransferError::DestinationDirMissing {
                path: parent.to_path_buf(),
                source,
            })?;

        let raw = PathMetadata::query(&self.destination).ok();
        let (destination, destination_identity, target_device) = match raw {
            Some(dir) if dir.kind == FileKind::Directory => {
                let name = self
                    .source
                    .file_name()
                    .ok_or_else(|| TransferError::SourceNotFound {
                        path: self.source.clone(),
                    })?;
                let destination = self.destination.join(name);
                let identity = PathMetadata::query(&destination)
                    .ok()
                    .map(|meta| meta.identity());
                (destination, identity, dir.device)
            }
            other => (
                self.destination.clone(),
                other.map(|meta| meta.identity()),
                parent_meta.dev(),
            ),
        };

        debug!(
            source = %self.source.display(),
            destination = %destination.display(),
            same_file = destination_identity == Some(source.identity()),
            "resolved transfer"
        );

        Ok(Resolved {
            source,
            destination,
            destination_identity,
            target_device,
        })
    }

    /// Streams the source into the destination chunk by chunk. Both handles
    /// are dropped (closed) on every return path.
    fn stream(&self, resolved: &Resolved, preserve: bool) -> TransferResult<()> {
        let mut input =
            File::open(&self.source).map_err(|e| TransferError::open(&self.source, e))?;
        let mut output = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o666)
            .open(&resolved.destination)
            .map_err(|e| TransferError::open(&resolved.destination, e))?;

        let mut total = 0usize;
        loop {
            let chunk = read_chunk(&mut input, self.chunk_size)
                .map_err(|e| TransferError::read(&self.source, e))?;
            if chunk.is_empty() {
                break;
            }
            total += chunk.len();
            write_chunk(&mut output, chunk)
                .map_err(|e| TransferError::write(&resolved.destination, e))?;
        }
        debug!(bytes = total, destination = %resolved.destination.display(), "copied data");

        if preserve {
            apply_attributes(&output, &resolved.destination, &resolved.source)?;
        }
        Ok(())
    }

    fn rename(&self, resolved: &Resolved) -> TransferResult<()> {
        fs::rename(&self.source, &resolved.destination).map_err(|source| TransferError::Rename {
            from: self.source.clone(),
            to: resolved.destination.clone(),
            source,
        })
    }

    fn unlink_after_copy(&self, resolved: &Resolved) -> TransferResult<MoveOutcome> {
        match self.stream(resolved, true) {
            Ok(()) => {}
            Err(err) if err.is_attribute_failure() => {
                warn!(error = %err, "moved data without all of its attributes");
            }
            Err(err) => return Err(err),
        }
        fs::remove_file(&self.source).map_err(|source| TransferError::Unlink {
            path: self.source.clone(),
            source,
        })?;
        Ok(MoveOutcome::Copied)
    }
}

/// Copies `source` to `destination`, returning the effective destination.
pub fn copy_file(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    preserve_attributes: bool,
) -> TransferResult<PathBuf> {
    TransferRequest::new(source.as_ref(), destination.as_ref())
        .preserve_attributes(preserve_attributes)
        .copy()
}

/// Moves `source` to `destination`.
pub fn move_file(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
) -> TransferResult<MoveOutcome> {
    TransferRequest::new(source.as_ref(), destination.as_ref()).rename_or_copy()
}

/// `dirname(3)` semantics for the cases that matter here.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => path,
    }
}

/// Applies permission bits, owner and timestamps, in that order. Every step
/// is attempted; the first failure is reported.
fn apply_attributes(file: &File, path: &Path, meta: &PathMetadata) -> TransferResult<()> {
    let mut first_failure = None;

    if let Err(e) = file.set_permissions(Permissions::from_mode(meta.mode)) {
        first_failure.get_or_insert(TransferError::attributes(path, "permissions", e));
    }
    if let Err(e) = chown(
        path,
        Some(Uid::from_raw(meta.uid)),
        Some(Gid::from_raw(meta.gid)),
    ) {
        first_failure.get_or_insert(TransferError::attributes(path, "ownership", e.into()));
    }
    let times = FileTimes::new()
        .set_accessed(meta.accessed)
        .set_modified(meta.modified);
    if let Err(e) = file.set_times(times) {
        first_failure.get_or_insert(TransferError::attributes(path, "timestamps", e));
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
