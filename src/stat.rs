//! The `stat` result returned by `getattr`/`fgetattr`.

use crate::inode::Inode;

/// Snapshot of an inode's metadata, as returned by `stat`/`fstat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Inode number.
    pub ino: u64,
    /// Type bits ORed with permission bits.
    pub mode: u32,
    /// Number of directory entries referencing this inode.
    pub nlink: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Logical byte size (the fixed directory placeholder for directories).
    pub size: u64,
    /// Number of 512-byte sectors `size` occupies, rounded up.
    pub blocks: u64,
    /// Device id. Always 0; this filesystem has no backing device.
    pub dev: u64,
    /// Device id for special files. Always 0; no special files exist here.
    pub rdev: u64,
    /// Last access time, milliseconds since the Unix epoch.
    pub atime: i64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub mtime: i64,
    /// Last status-change time, milliseconds since the Unix epoch.
    pub ctime: i64,
}

impl Stat {
    /// Build a `stat` snapshot from an inode.
    pub fn from_inode(inode: &Inode) -> Stat {
        let size = inode.reported_size();
        Stat {
            ino: inode.ino,
            mode: inode.mode,
            nlink: inode.nlink,
            uid: inode.uid,
            gid: inode.gid,
            size,
            blocks: (size + 511) / 512,
            dev: 0,
            rdev: 0,
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
        }
    }
}
