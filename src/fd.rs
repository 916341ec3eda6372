//! File descriptors and the descriptor table.
//!
//! A [`FileDescriptor`] holds a shared reference straight to the bound
//! [`InodeRef`] rather than to the [`crate::entry::Entry`] it was opened
//! through: `unlink` removes the entry from its parent directory, but the
//! open descriptor must keep the underlying inode (and its data) alive until
//! `close`. Extended-attribute operations are always path-addressed in this
//! filesystem, so the descriptor never needs anything from `Entry` beyond
//! that shared inode handle. See DESIGN.md for the open-question this settles.

use crate::error::{fs_err, ErrnoKind, Result};
use crate::inode::InodeRef;

/// FD ids are offset by this much so they never collide with the small
/// integers (0, 1, 2, ...) a host process reserves for its own descriptors.
pub const FD_BASE: usize = 20;

/// An open file handle: position, access flags, and the inode it targets.
#[derive(Debug)]
pub struct FileDescriptor {
    id: usize,
    inode: InodeRef,
    position: u64,
    readable: bool,
    writable: bool,
    appending: bool,
    exclusive: bool,
    creating: bool,
}

impl FileDescriptor {
    /// This descriptor's stable numeric id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The inode this descriptor reads and writes.
    pub fn inode(&self) -> &InodeRef {
        &self.inode
    }

    /// Current seek position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the seek position (used by `pread`/`pwrite`-style calls that pass
    /// an explicit position).
    pub fn seek(&mut self, position: u64) {
        self.position = position;
    }

    /// Advance the seek position by `n` bytes.
    pub fn advance(&mut self, n: u64) {
        self.position += n;
    }

    /// Whether this descriptor was opened for reading.
    pub fn readable(&self) -> bool {
        self.readable
    }

    /// Whether this descriptor was opened for writing.
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Whether this descriptor was opened with `O_APPEND`.
    pub fn appending(&self) -> bool {
        self.appending
    }

    /// Whether this descriptor was opened with `O_EXCL`.
    pub fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Whether this descriptor was opened with `O_CREAT`.
    pub fn creating(&self) -> bool {
        self.creating
    }
}

/// Parameters describing how a new descriptor was opened, decoded from the
/// raw open flags before a [`FileDescriptor`] is allocated.
#[derive(Debug, Clone, Copy)]
pub struct OpenFlags {
    /// Readable per the decoded access mode.
    pub readable: bool,
    /// Writable per the decoded access mode.
    pub writable: bool,
    /// `O_APPEND` was set.
    pub appending: bool,
    /// `O_EXCL` was set.
    pub exclusive: bool,
    /// `O_CREAT` was set.
    pub creating: bool,
}

/// The sparse, compacting table of open descriptors owned by a
/// [`crate::fs::FileSystem`].
///
/// Closed slots become `None`; trailing `None` slots are trimmed off the end
/// after every close, so descriptor ids stay small under open/close churn
/// (this does not change any observable behavior, it just keeps the table
/// from growing without bound).
#[derive(Debug, Default)]
pub struct FdTable {
    slots: Vec<Option<FileDescriptor>>,
}

impl FdTable {
    /// An empty descriptor table.
    pub fn new() -> FdTable {
        FdTable { slots: Vec::new() }
    }

    /// Allocate a new descriptor bound to `inode`, appending it to the
    /// table. Returns the new descriptor's id.
    pub fn open(&mut self, inode: InodeRef, flags: OpenFlags, position: u64) -> usize {
        let id = self.slots.len() + FD_BASE;
        self.slots.push(Some(FileDescriptor {
            id,
            inode,
            position,
            readable: flags.readable,
            writable: flags.writable,
            appending: flags.appending,
            exclusive: flags.exclusive,
            creating: flags.creating,
        }));
        id
    }

    fn slot_index(&self, id: usize) -> Option<usize> {
        id.checked_sub(FD_BASE)
    }

    /// Look up the descriptor with the given id.
    pub fn get(&self, id: usize) -> Result<&FileDescriptor> {
        let idx = self.slot_index(id).ok_or_else(|| {
            fs_err!(EBadF, "file descriptor id out of range", "fd", id.to_string())
        })?;
        self.slots
            .get(idx)
            .and_then(|s| s.as_ref())
            .ok_or_else(|| fs_err!(EBadF, "file descriptor is not open", "fd", id.to_string()))
    }

    /// Mutable lookup of the descriptor with the given id.
    pub fn get_mut(&mut self, id: usize) -> Result<&mut FileDescriptor> {
        let idx = self.slot_index(id).ok_or_else(|| {
            fs_err!(EBadF, "file descriptor id out of range", "fd", id.to_string())
        })?;
        self.slots
            .get_mut(idx)
            .and_then(|s| s.as_mut())
            .ok_or_else(|| fs_err!(EBadF, "file descriptor is not open", "fd", id.to_string()))
    }

    /// Close the descriptor with the given id, then trim any now-trailing
    /// `None` slots.
    pub fn close(&mut self, id: usize) -> Result<()> {
        let idx = self.slot_index(id).ok_or_else(|| {
            fs_err!(EBadF, "file descriptor id out of range", "fd", id.to_string())
        })?;
        match self.slots.get_mut(idx) {
            Some(slot @ Some(_)) => *slot = None,
            _ => {
                return Err(fs_err!(
                    EBadF,
                    "file descriptor is not open",
                    "close",
                    id.to_string()
                ))
            }
        }
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        log::trace!("closed fd {} ({} slots remain)", id, self.slots.len());
        Ok(())
    }

    /// Number of slots currently held (including any interior `None` gaps).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the table holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::Constants;
    use crate::inode::Inode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn file_inode() -> InodeRef {
        Rc::new(RefCell::new(Inode::new_file(1, &Constants::LINUX)))
    }

    fn rdwr() -> OpenFlags {
        OpenFlags {
            readable: true,
            writable: true,
            appending: false,
            exclusive: false,
            creating: false,
        }
    }

    #[test]
    fn ids_start_at_fd_base() {
        let mut table = FdTable::new();
        let id = table.open(file_inode(), rdwr(), 0);
        assert_eq!(id, FD_BASE);
    }

    #[test]
    fn close_is_idempotent_error_on_double_close() {
        let mut table = FdTable::new();
        let id = table.open(file_inode(), rdwr(), 0);
        table.close(id).unwrap();
        assert!(table.close(id).is_err());
    }

    #[test]
    fn closing_all_descriptors_compacts_table_to_empty() {
        let mut table = FdTable::new();
        let a = table.open(file_inode(), rdwr(), 0);
        let b = table.open(file_inode(), rdwr(), 0);
        let c = table.open(file_inode(), rdwr(), 0);
        table.close(b).unwrap();
        assert_eq!(table.len(), 3, "middle close should not trim yet");
        table.close(c).unwrap();
        assert_eq!(table.len(), 1, "trailing none slots trim after close");
        table.close(a).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn stable_id_survives_intervening_opens_and_closes() {
        let mut table = FdTable::new();
        let a = table.open(file_inode(), rdwr(), 0);
        let b = table.open(file_inode(), rdwr(), 0);
        table.close(b).unwrap();
        let c = table.open(file_inode(), rdwr(), 0);
        assert!(table.get(a).is_ok());
        assert_eq!(c, b, "the compacted slot is reused for the next open");
    }

    #[test]
    fn out_of_range_id_is_ebadf() {
        let table = FdTable::new();
        assert!(table.get(0).is_err());
        assert!(table.get(FD_BASE).is_err());
    }
}
