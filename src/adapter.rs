//! The FUSE-shaped operation adapter.
//!
//! This module is the seam between [`crate::fs::FileSystem`] and a real FUSE
//! binding: each function here takes the same arguments a bridge's trait
//! callback receives and returns a negative POSIX errno on failure instead of
//! an [`crate::error::FsError`], exactly what a `libc`-style return
//! convention expects. Nothing here mounts a filesystem or depends on a FUSE
//! crate; wiring these functions to an actual bridge trait is left to the
//! embedding binary.

use crate::error::Result as FsResult;
use crate::fs::FileSystem;
use crate::stat::Stat;

/// Adapter-level result: `Ok` on success, the negative errno on failure.
pub type Result<T> = std::result::Result<T, i32>;

fn to_errno<T>(result: FsResult<T>) -> Result<T> {
    result.map_err(|e| {
        log::debug!("{}", e);
        e.kind().errno()
    })
}

/// Coarse filesystem-level statistics, as returned by `statfs`.
///
/// This filesystem tracks no capacity or quota, so every field here is a
/// fixed placeholder rather than a live count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    /// Block size in bytes, reported as [`crate::block::BLOCK_SIZE`].
    pub bsize: u64,
    /// Total blocks. There is no fixed capacity, so this is a large placeholder.
    pub blocks: u64,
    /// Free blocks. Always equal to `blocks`; nothing is ever exhausted.
    pub bfree: u64,
    /// Free blocks available to unprivileged callers. Same as `bfree`.
    pub bavail: u64,
    /// Maximum path component length this filesystem accepts.
    pub namelen: u32,
}

impl Default for StatFs {
    fn default() -> StatFs {
        let blocks = 1 << 20;
        StatFs {
            bsize: crate::block::BLOCK_SIZE,
            blocks,
            bfree: blocks,
            bavail: blocks,
            namelen: 255,
        }
    }
}

/// Filesystem-level statistics. Cannot fail.
pub fn statfs() -> StatFs {
    StatFs::default()
}

/// `getattr`: metadata for a path.
pub fn getattr(fs: &FileSystem, path: &str) -> Result<Stat> {
    to_errno(fs.stat(path))
}

/// `fgetattr`: metadata for an open descriptor.
pub fn fgetattr(fs: &FileSystem, fd: usize) -> Result<Stat> {
    to_errno(fs.fstat(fd))
}

/// `readdir`: the names of a directory's children.
pub fn readdir(fs: &FileSystem, path: &str) -> Result<Vec<String>> {
    to_errno(fs.readdir(path))
}

/// `mkdir`: create a new, empty directory.
pub fn mkdir(fs: &mut FileSystem, path: &str, _mode: u32) -> Result<()> {
    to_errno(fs.mkdir(path).map(|_| ()))
}

/// `create`: atomically create (or reset) a regular file and open it,
/// returning a descriptor id the way a real `creat()`/`open(..., O_CREAT)`
/// syscall hands one back in the same call.
pub fn create(fs: &mut FileSystem, path: &str, mode: u32) -> Result<usize> {
    let c = fs.constants();
    to_errno(fs.open(path, c.o_rdwr | c.o_creat, mode))
}

/// `open`: open a regular file, returning a descriptor id.
pub fn open(fs: &mut FileSystem, path: &str, flags: i32, mode: u32) -> Result<usize> {
    to_errno(fs.open(path, flags, mode))
}

/// `release`: close a descriptor.
pub fn release(fs: &mut FileSystem, fd: usize) -> Result<()> {
    to_errno(fs.close(fd))
}

/// `read`: read `buf.len()` bytes at `offset` through `fd`.
pub fn read(fs: &mut FileSystem, fd: usize, buf: &mut [u8], offset: u64) -> Result<u64> {
    let len = buf.len();
    to_errno(fs.read(fd, buf, 0, len, Some(offset)))
}

/// `write`: write `buf` at `offset` through `fd`.
pub fn write(fs: &mut FileSystem, fd: usize, buf: &[u8], offset: u64) -> Result<u64> {
    let len = buf.len();
    to_errno(fs.write(fd, buf, 0, len, Some(offset)))
}

/// `truncate`: resize a file by path.
pub fn truncate(fs: &mut FileSystem, path: &str, size: u64) -> Result<()> {
    to_errno(fs.truncate(path, size))
}

/// `ftruncate`: resize a file through an open descriptor.
pub fn ftruncate(fs: &mut FileSystem, fd: usize, size: u64) -> Result<()> {
    to_errno(fs.ftruncate(fd, size))
}

/// `unlink`: remove a file entry.
pub fn unlink(fs: &mut FileSystem, path: &str) -> Result<()> {
    to_errno(fs.unlink(path))
}

/// `rmdir`: remove an empty directory entry.
pub fn rmdir(fs: &mut FileSystem, path: &str) -> Result<()> {
    to_errno(fs.rmdir(path))
}

/// `link`: bind a new name to an existing inode.
pub fn link(fs: &mut FileSystem, from: &str, to: &str) -> Result<()> {
    to_errno(fs.link(from, to))
}

/// `rename`: move or overwrite an entry.
pub fn rename(fs: &mut FileSystem, from: &str, to: &str) -> Result<()> {
    to_errno(fs.rename(from, to))
}

/// `setxattr`: set an extended attribute.
pub fn setxattr(fs: &mut FileSystem, path: &str, name: &str, value: &[u8]) -> Result<()> {
    to_errno(fs.set_xattr(path, name, value.to_vec()))
}

/// `getxattr`: read an extended attribute, if set.
pub fn getxattr(fs: &FileSystem, path: &str, name: &str) -> Result<Option<Vec<u8>>> {
    to_errno(fs.get_xattr(path, name))
}

/// `listxattr`: the names of a path's extended attributes.
pub fn listxattr(fs: &FileSystem, path: &str) -> Result<Vec<String>> {
    to_errno(fs.list_xattrs(path))
}

/// `removexattr`: remove an extended attribute.
pub fn removexattr(fs: &mut FileSystem, path: &str, name: &str) -> Result<()> {
    to_errno(fs.remove_xattr(path, name))
}

/// `chmod`: rewrite a path's permission bits.
pub fn chmod(fs: &mut FileSystem, path: &str, mode: u32) -> Result<()> {
    to_errno(fs.chmod(path, mode))
}

/// `chown`: rewrite a path's ownership.
pub fn chown(fs: &mut FileSystem, path: &str, uid: u32, gid: u32) -> Result<()> {
    to_errno(fs.chown(path, uid, gid))
}

/// `utimens`: set a path's access and modification times.
pub fn utimens(fs: &mut FileSystem, path: &str, atime_ms: i64, mtime_ms: i64) -> Result<()> {
    to_errno(fs.utimes(path, atime_ms, mtime_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::Constants;

    fn fresh() -> FileSystem {
        FileSystem::new(Constants::default())
    }

    #[test]
    fn errors_surface_as_negative_errno() {
        let fs = fresh();
        let err = getattr(&fs, "/missing").unwrap_err();
        assert_eq!(err, crate::error::ErrnoKind::ENoEnt.errno());
    }

    #[test]
    fn create_returns_an_open_descriptor() {
        let mut fs = fresh();
        let fd = create(&mut fs, "/f", 0o644).unwrap();
        write(&mut fs, fd, b"abc", 0).unwrap();
        let mut buf = [0u8; 3];
        let n = read(&mut fs, fd, &mut buf, 0).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf, b"abc");
        release(&mut fs, fd).unwrap();
    }

    #[test]
    fn create_on_an_existing_file_resets_its_contents() {
        let mut fs = fresh();
        let fd = create(&mut fs, "/f", 0o644).unwrap();
        write(&mut fs, fd, b"abc", 0).unwrap();
        release(&mut fs, fd).unwrap();

        let fd = create(&mut fs, "/f", 0o644).unwrap();
        let mut buf = [0u8; 3];
        let n = read(&mut fs, fd, &mut buf, 0).unwrap();
        assert_eq!(n, 0);
        release(&mut fs, fd).unwrap();
    }

    #[test]
    fn statfs_reports_block_size() {
        assert_eq!(statfs().bsize, crate::block::BLOCK_SIZE);
    }
}
