//! Error type for the in-memory filesystem core.
//!
//! The core raises one flat error type, [`FsError`], carrying both the
//! [`ErrnoKind`] the adapter needs to compute a negative errno and a
//! human-readable message built from the failing method and path.
//! This mirrors the teacher's `APIError`/`BlockLayerError` chain, collapsed
//! into a single layer since this crate has no block/inode/dir/path split
//! across separate crates.

use thiserror::Error;

/// The symbolic error kinds this filesystem can raise, mapped 1:1 onto a
/// negative POSIX errno at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrnoKind {
    /// Operation not permitted (`unlink` on a directory, `open` on a non-regular entry).
    EPerm,
    /// No such file or directory (missing path component, FD absent, read-only open on missing file).
    ENoEnt,
    /// Bad file descriptor (slot null or out of range).
    EBadF,
    /// File exists (`mkdir`/`link` on an existing name, `O_EXCL` open on existing).
    EExist,
    /// Not a directory (traversal through a non-directory; rename type mismatch).
    ENotDir,
    /// Is a directory (rename over a directory with a non-directory source; `link` on a directory).
    EIsDir,
    /// Invalid argument (path with no last component for an operation that needs one).
    EInval,
    /// Directory not empty (`rmdir`/rename-over-dir with a non-empty target).
    ENotEmpty,
}

impl ErrnoKind {
    /// The negative errno value the adapter hands back to the FUSE bridge.
    pub fn errno(self) -> i32 {
        match self {
            ErrnoKind::EPerm => -1,
            ErrnoKind::ENoEnt => -2,
            ErrnoKind::EBadF => -9,
            ErrnoKind::EExist => -17,
            ErrnoKind::ENotDir => -20,
            ErrnoKind::EIsDir => -21,
            ErrnoKind::EInval => -23,
            ErrnoKind::ENotEmpty => -66,
        }
    }

    /// The symbolic name, used to build error messages and in logging.
    pub fn code(self) -> &'static str {
        match self {
            ErrnoKind::EPerm => "EPERM",
            ErrnoKind::ENoEnt => "ENOENT",
            ErrnoKind::EBadF => "EBADF",
            ErrnoKind::EExist => "EEXIST",
            ErrnoKind::ENotDir => "ENOTDIR",
            ErrnoKind::EIsDir => "EISDIR",
            ErrnoKind::EInval => "EINVAL",
            ErrnoKind::ENotEmpty => "ENOTEMPTY",
        }
    }
}

/// Error raised by a [`crate::fs::FileSystem`] operation.
///
/// Carries the [`ErrnoKind`], the name of the failing method, and the path
/// or name it was operating on, so the `Display` message reads
/// `"<CODE>: <reason>, <method> '<name>'"`.
#[derive(Error, Debug)]
#[error("{}: {reason}, {method} '{name}'", kind.code())]
pub struct FsError {
    kind: ErrnoKind,
    reason: &'static str,
    method: &'static str,
    name: String,
}

impl FsError {
    /// Construct an error of the given kind.
    pub fn new(kind: ErrnoKind, reason: &'static str, method: &'static str, name: impl Into<String>) -> FsError {
        FsError {
            kind,
            reason,
            method,
            name: name.into(),
        }
    }

    /// The errno kind this error maps to.
    pub fn kind(&self) -> ErrnoKind {
        self.kind
    }
}

/// Shorthand for a `Result` with the error type [`FsError`].
pub type Result<T> = std::result::Result<T, FsError>;

macro_rules! fs_err {
    ($kind:ident, $reason:expr, $method:expr, $name:expr) => {
        $crate::error::FsError::new($crate::error::ErrnoKind::$kind, $reason, $method, $name)
    };
}

pub(crate) use fs_err;
