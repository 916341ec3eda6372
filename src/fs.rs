//! The top-level filesystem: path resolution, directory mutation, file I/O,
//! hard links, renames, extended attributes, and descriptor lifecycle.
//!
//! `FileSystem` owns the whole tree and the descriptor table; every mutation
//! in this crate flows through one of its methods, so there is a single
//! place enforcing the invariants in the data model (unique names per
//! directory, `nlink` bookkeeping, FD id stability).

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::consts::Constants;
use crate::entry::Entry;
use crate::error::{fs_err, Result};
use crate::fd::{FdTable, OpenFlags};
use crate::inode::{Inode, InodeRef};
use crate::path;
use crate::stat::Stat;

/// Inode number of the root directory. Never reused.
pub const ROOT_INO: u64 = 1;

/// Permission bits mask used when preserving the type bit across `chmod`.
const PERM_MASK: u32 = 0o7777;

fn find_child_index(entries: &[Entry], name: &str) -> Option<usize> {
    entries.iter().position(|e| e.name() == name)
}

/// Read through an inode known (by `open`'s own `is_file` check) to hold a
/// regular file's byte storage.
fn read_body(inode: &InodeRef, pos: u64, buf: &mut [u8]) -> u64 {
    let node = inode.borrow();
    let body = node.body().expect("fd always targets a regular file");
    body.read(pos, buf)
}

/// Write through an inode known (by `open`'s own `is_file` check) to hold a
/// regular file's byte storage.
fn write_body(inode: &InodeRef, pos: u64, buf: &[u8]) {
    let mut node = inode.borrow_mut();
    let body = node.body_mut().expect("fd always targets a regular file");
    body.write(pos, buf);
}

fn check_rename_target(source_is_dir: bool, target: &Entry, to: &str) -> Result<()> {
    let target_is_dir = target.inode().borrow().is_dir();
    if target_is_dir && !source_is_dir {
        return Err(fs_err!(
            EIsDir,
            "rename target is a directory but the source is not",
            "rename",
            to.to_string()
        ));
    }
    if !target_is_dir && source_is_dir {
        return Err(fs_err!(
            ENotDir,
            "rename target is not a directory but the source is",
            "rename",
            to.to_string()
        ));
    }
    if target_is_dir && source_is_dir {
        let empty = target
            .inode()
            .borrow()
            .entries()
            .map(|e| e.is_empty())
            .unwrap_or(true);
        if !empty {
            return Err(fs_err!(
                ENotEmpty,
                "rename target directory is not empty",
                "rename",
                to.to_string()
            ));
        }
    }
    Ok(())
}

/// A resolved parent directory: the "this inode is a directory" check that
/// `parent_of` performs, carried in the type instead of re-asserted with
/// `.expect()` at every call site that touches its entries.
struct DirRef(InodeRef);

impl DirRef {
    fn new(inode: InodeRef, method: &'static str, path: &str) -> Result<DirRef> {
        if !inode.borrow().is_dir() {
            return Err(fs_err!(
                ENotDir,
                "parent path is not a directory",
                method,
                path.to_string()
            ));
        }
        Ok(DirRef(inode))
    }

    fn entries(&self) -> Ref<'_, Vec<Entry>> {
        Ref::map(self.0.borrow(), |node| {
            node.entries().expect("DirRef guarantees a directory")
        })
    }

    fn entries_mut(&self) -> RefMut<'_, Vec<Entry>> {
        RefMut::map(self.0.borrow_mut(), |node| {
            node.entries_mut().expect("DirRef guarantees a directory")
        })
    }

    fn touch_mtime(&self) {
        self.0.borrow_mut().touch_mtime();
    }

    fn inode(&self) -> &InodeRef {
        &self.0
    }
}

/// The in-memory filesystem: one root, one inode counter, one descriptor table.
#[derive(Debug)]
pub struct FileSystem {
    root: Entry,
    fds: FdTable,
    next_ino: u64,
    constants: Constants,
}

impl FileSystem {
    /// A fresh, empty filesystem using the given platform constants.
    pub fn new(constants: Constants) -> FileSystem {
        let root_inode = Rc::new(RefCell::new(Inode::new_dir(ROOT_INO, &constants)));
        FileSystem {
            root: Entry::new("", root_inode),
            fds: FdTable::new(),
            next_ino: ROOT_INO + 1,
            constants,
        }
    }

    /// The platform constants this filesystem was built with.
    pub fn constants(&self) -> Constants {
        self.constants
    }

    fn alloc_ino(&mut self) -> u64 {
        let ino = self.next_ino;
        self.next_ino += 1;
        ino
    }

    fn resolve_components(&self, components: &[String], method: &'static str) -> Result<InodeRef> {
        let mut current = self.root.inode().clone();
        for name in components {
            let next = {
                let node = current.borrow();
                if !node.is_dir() {
                    return Err(fs_err!(
                        ENotDir,
                        "path component is not a directory",
                        method,
                        name.clone()
                    ));
                }
                let entries = node.entries().expect("checked is_dir above");
                find_child_index(entries, name).map(|i| entries[i].inode().clone())
            };
            current = next.ok_or_else(|| {
                fs_err!(ENoEnt, "no such file or directory", method, name.clone())
            })?;
        }
        Ok(current)
    }

    /// Resolve `path` to its bound inode.
    pub fn resolve(&self, path: &str, method: &'static str) -> Result<InodeRef> {
        self.resolve_components(&path::split(path), method)
    }

    fn parent_of(&self, path: &str, method: &'static str) -> Result<(DirRef, String)> {
        let mut components = path::split(path);
        let name = components
            .pop()
            .ok_or_else(|| fs_err!(EInval, "path has no last component", method, path.to_string()))?;
        let parent = self.resolve_components(&components, method)?;
        let parent = DirRef::new(parent, method, path)?;
        Ok((parent, name))
    }

    fn with_entry<R>(&self, path: &str, method: &'static str, f: impl FnOnce(&Entry) -> R) -> Result<R> {
        let mut components = path::split(path);
        let last = match components.pop() {
            None => return Ok(f(&self.root)),
            Some(name) => name,
        };
        let parent = self.resolve_components(&components, method)?;
        let p = parent.borrow();
        let entries = p
            .entries()
            .ok_or_else(|| fs_err!(ENotDir, "parent is not a directory", method, path.to_string()))?;
        let idx = find_child_index(entries, &last)
            .ok_or_else(|| fs_err!(ENoEnt, "no such file or directory", method, path.to_string()))?;
        Ok(f(&entries[idx]))
    }

    fn with_entry_mut<R>(
        &mut self,
        path: &str,
        method: &'static str,
        f: impl FnOnce(&mut Entry) -> R,
    ) -> Result<R> {
        let mut components = path::split(path);
        let last = match components.pop() {
            None => return Ok(f(&mut self.root)),
            Some(name) => name,
        };
        let parent = self.resolve_components(&components, method)?;
        let mut p = parent.borrow_mut();
        let entries = p
            .entries_mut()
            .ok_or_else(|| fs_err!(ENotDir, "parent is not a directory", method, path.to_string()))?;
        let idx = find_child_index(entries, &last)
            .ok_or_else(|| fs_err!(ENoEnt, "no such file or directory", method, path.to_string()))?;
        Ok(f(&mut entries[idx]))
    }

    // -- directory operations -------------------------------------------------

    /// List the names of `path`'s direct children, in insertion order.
    pub fn readdir(&self, path: &str) -> Result<Vec<String>> {
        let inode = self.resolve(path, "readdir")?;
        let node = inode.borrow();
        let entries = node
            .entries()
            .ok_or_else(|| fs_err!(ENotDir, "not a directory", "readdir", path.to_string()))?;
        Ok(entries.iter().map(|e| e.name().to_string()).collect())
    }

    /// Create a new, empty directory at `path`.
    pub fn mkdir(&mut self, path: &str) -> Result<InodeRef> {
        let (parent, name) = self.parent_of(path, "mkdir")?;
        if find_child_index(&parent.entries(), &name).is_some() {
            return Err(fs_err!(EExist, "directory already exists", "mkdir", path.to_string()));
        }
        let ino = self.alloc_ino();
        let new_inode = Rc::new(RefCell::new(Inode::new_dir(ino, &self.constants)));
        parent.entries_mut().push(Entry::new(name, new_inode.clone()));
        parent.touch_mtime();
        log::debug!("mkdir created inode {} at {:?}", ino, path);
        Ok(new_inode)
    }

    /// Create a new regular file at `path`, or reset it in place if it
    /// already exists. `mode` is accepted but not applied, matching the
    /// behavior this crate preserves from its source (see DESIGN.md).
    pub fn create(&mut self, path: &str, _mode: u32) -> Result<InodeRef> {
        let (parent, name) = self.parent_of(path, "create")?;
        let existing = find_child_index(&parent.entries(), &name).map(|idx| parent.entries()[idx].inode().clone());
        if let Some(inode) = existing {
            let mut node = inode.borrow_mut();
            if let Some(body) = node.body_mut() {
                body.reset();
            }
            node.touch_mtime();
            drop(node);
            return Ok(inode);
        }
        let ino = self.alloc_ino();
        let inode = Rc::new(RefCell::new(Inode::new_file(ino, &self.constants)));
        parent.entries_mut().push(Entry::new(name, inode.clone()));
        parent.touch_mtime();
        log::debug!("create allocated inode {} at {:?}", ino, path);
        Ok(inode)
    }

    /// Remove the file entry at `path`. Fails on directories; use `rmdir`.
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.parent_of(path, "unlink")?;
        let removed = {
            let mut entries = parent.entries_mut();
            let idx = find_child_index(&entries, &name)
                .ok_or_else(|| fs_err!(ENoEnt, "no such file or directory", "unlink", path.to_string()))?;
            if entries[idx].inode().borrow().is_dir() {
                return Err(fs_err!(EPerm, "unlink target is a directory", "unlink", path.to_string()));
            }
            entries.remove(idx)
        };
        let remaining = {
            let mut node = removed.inode().borrow_mut();
            node.nlink -= 1;
            node.nlink
        };
        parent.touch_mtime();
        if remaining == 0 {
            log::trace!(
                "inode {} has no remaining links; kept alive only by open descriptors, if any",
                removed.inode().borrow().ino
            );
        }
        Ok(())
    }

    /// Remove the empty directory entry at `path`.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.parent_of(path, "rmdir")?;
        let removed = {
            let mut entries = parent.entries_mut();
            let idx = find_child_index(&entries, &name)
                .ok_or_else(|| fs_err!(ENoEnt, "no such file or directory", "rmdir", path.to_string()))?;
            if !entries[idx].inode().borrow().is_dir() {
                return Err(fs_err!(ENotDir, "rmdir target is not a directory", "rmdir", path.to_string()));
            }
            let has_children = entries[idx]
                .inode()
                .borrow()
                .entries()
                .map(|e| !e.is_empty())
                .unwrap_or(false);
            if has_children {
                return Err(fs_err!(ENotEmpty, "directory is not empty", "rmdir", path.to_string()));
            }
            entries.remove(idx)
        };
        removed.inode().borrow_mut().nlink -= 1;
        parent.touch_mtime();
        Ok(())
    }

    // -- hard links and rename -------------------------------------------------

    /// Create a new name `to` bound to the same inode as `from`.
    pub fn link(&mut self, from: &str, to: &str) -> Result<()> {
        let from_inode = self.resolve(from, "link")?;
        if from_inode.borrow().is_dir() {
            return Err(fs_err!(EIsDir, "cannot hard-link a directory", "link", from.to_string()));
        }
        let (to_parent, to_name) = self.parent_of(to, "link")?;
        {
            let mut entries = to_parent.entries_mut();
            if find_child_index(&entries, &to_name).is_some() {
                return Err(fs_err!(EExist, "link target already exists", "link", to.to_string()));
            }
            entries.push(Entry::new(to_name, from_inode.clone()));
        }
        from_inode.borrow_mut().nlink += 1;
        to_parent.touch_mtime();
        Ok(())
    }

    /// Move the entry at `from` to `to`, replacing any existing binding at
    /// `to` subject to the directory/non-directory compatibility rules.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let (from_parent, from_name) = self.parent_of(from, "rename")?;
        let (to_parent, to_name) = self.parent_of(to, "rename")?;

        if Rc::ptr_eq(from_parent.inode(), to_parent.inode()) {
            let mut entries = from_parent.entries_mut();
            let from_idx = find_child_index(&entries, &from_name)
                .ok_or_else(|| fs_err!(ENoEnt, "rename source does not exist", "rename", from.to_string()))?;
            let source_is_dir = entries[from_idx].inode().borrow().is_dir();
            if let Some(to_idx) = find_child_index(&entries, &to_name) {
                if to_idx == from_idx {
                    return Ok(());
                }
                check_rename_target(source_is_dir, &entries[to_idx], to)?;
                let (hi, lo) = if from_idx > to_idx {
                    (from_idx, to_idx)
                } else {
                    (to_idx, from_idx)
                };
                let hi_removed = entries.remove(hi);
                let lo_removed = entries.remove(lo);
                let (mut moved, overwritten) = if hi == from_idx {
                    (hi_removed, lo_removed)
                } else {
                    (lo_removed, hi_removed)
                };
                overwritten.inode().borrow_mut().nlink -= 1;
                moved.set_name(to_name);
                entries.push(moved);
            } else {
                let mut moved = entries.remove(from_idx);
                moved.set_name(to_name);
                entries.push(moved);
            }
            drop(entries);
            from_parent.touch_mtime();
            return Ok(());
        }

        let source_is_dir = {
            let entries = from_parent.entries();
            let idx = find_child_index(&entries, &from_name)
                .ok_or_else(|| fs_err!(ENoEnt, "rename source does not exist", "rename", from.to_string()))?;
            entries[idx].inode().borrow().is_dir()
        };
        {
            let entries = to_parent.entries();
            if let Some(to_idx) = find_child_index(&entries, &to_name) {
                check_rename_target(source_is_dir, &entries[to_idx], to)?;
            }
        }

        let mut moved = {
            let mut entries = from_parent.entries_mut();
            let idx = find_child_index(&entries, &from_name)
                .ok_or_else(|| fs_err!(ENoEnt, "rename source does not exist", "rename", from.to_string()))?;
            entries.remove(idx)
        };
        from_parent.touch_mtime();
        {
            let mut entries = to_parent.entries_mut();
            if let Some(to_idx) = find_child_index(&entries, &to_name) {
                let removed = entries.remove(to_idx);
                removed.inode().borrow_mut().nlink -= 1;
            }
            moved.set_name(to_name);
            entries.push(moved);
        }
        to_parent.touch_mtime();
        Ok(())
    }

    // -- extended attributes -----------------------------------------------

    /// Overwrite (or insert) extended attribute `name` on the entry at `path`.
    pub fn set_xattr(&mut self, path: &str, name: &str, value: Vec<u8>) -> Result<()> {
        self.with_entry_mut(path, "setxattr", |entry| entry.set_xattr(name, value))
    }

    /// The value of extended attribute `name` on the entry at `path`, if set.
    pub fn get_xattr(&self, path: &str, name: &str) -> Result<Option<Vec<u8>>> {
        self.with_entry(path, "getxattr", |entry| entry.get_xattr(name).map(|v| v.to_vec()))
    }

    /// The names of all extended attributes on the entry at `path`.
    pub fn list_xattrs(&self, path: &str) -> Result<Vec<String>> {
        self.with_entry(path, "listxattr", |entry| {
            entry.list_xattrs().into_iter().map(String::from).collect()
        })
    }

    /// Remove extended attribute `name` from the entry at `path`. Silently
    /// does nothing if it was not set.
    pub fn remove_xattr(&mut self, path: &str, name: &str) -> Result<()> {
        self.with_entry_mut(path, "removexattr", |entry| entry.remove_xattr(name))
    }

    // -- open files ----------------------------------------------------------

    fn decode_open_flags(&self, flag: i32) -> OpenFlags {
        let access = self.constants.access_mode(flag);
        OpenFlags {
            readable: access == self.constants.o_rdonly || access == self.constants.o_rdwr,
            writable: access == self.constants.o_wronly || access == self.constants.o_rdwr,
            appending: self.constants.has_flag(flag, self.constants.o_append),
            exclusive: self.constants.has_flag(flag, self.constants.o_excl),
            creating: self.constants.has_flag(flag, self.constants.o_creat),
        }
    }

    /// Open (and possibly create or reset) the regular file at `path`,
    /// returning a new descriptor id.
    pub fn open(&mut self, path: &str, flag: i32, mode: u32) -> Result<usize> {
        let decoded = self.decode_open_flags(flag);
        let (parent, name) = self.parent_of(path, "open")?;
        let existing = {
            let entries = parent.entries();
            find_child_index(&entries, &name).map(|i| entries[i].inode().clone())
        };

        if let Some(inode) = &existing {
            if !inode.borrow().is_file() {
                return Err(fs_err!(EPerm, "open target is not a regular file", "open", path.to_string()));
            }
        }
        if decoded.exclusive && existing.is_some() {
            return Err(fs_err!(EExist, "O_EXCL open on an existing file", "open", path.to_string()));
        }
        if !decoded.writable && existing.is_none() {
            return Err(fs_err!(ENoEnt, "read-only open on a missing file", "open", path.to_string()));
        }

        let inode = match existing {
            Some(inode) => {
                if decoded.writable && !decoded.appending {
                    let mut node = inode.borrow_mut();
                    if let Some(body) = node.body_mut() {
                        body.reset();
                    }
                    node.touch_mtime();
                }
                inode
            }
            None => {
                if !decoded.creating {
                    return Err(fs_err!(
                        ENoEnt,
                        "no such file and O_CREAT not set",
                        "open",
                        path.to_string()
                    ));
                }
                self.create(path, mode)?
            }
        };

        let position = if decoded.appending {
            inode.borrow().reported_size()
        } else {
            0
        };
        let id = self.fds.open(inode, decoded, position);
        log::debug!("open bound fd {} to {:?}", id, path);
        Ok(id)
    }

    /// Close descriptor `fd`.
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.fds.close(fd)
    }

    /// Read up to `len` bytes through descriptor `fd` into `buf[buf_off..]`.
    /// If `position` is given, seeks there first (`pread` semantics).
    pub fn read(&mut self, fd: usize, buf: &mut [u8], buf_off: usize, len: usize, position: Option<u64>) -> Result<u64> {
        let pos = {
            let descriptor = self.fds.get_mut(fd)?;
            if !descriptor.readable() {
                return Err(fs_err!(EBadF, "descriptor not opened for reading", "read", fd.to_string()));
            }
            if let Some(p) = position {
                descriptor.seek(p);
            }
            descriptor.position()
        };
        let inode = self.fds.get(fd)?.inode().clone();
        let n = read_body(&inode, pos, &mut buf[buf_off..buf_off + len]);
        inode.borrow_mut().touch_atime();
        self.fds.get_mut(fd)?.advance(n);
        Ok(n)
    }

    /// Write `len` bytes from `buf[buf_off..]` through descriptor `fd`. If
    /// `position` is given, seeks there first (`pwrite` semantics).
    pub fn write(&mut self, fd: usize, buf: &[u8], buf_off: usize, len: usize, position: Option<u64>) -> Result<u64> {
        let pos = {
            let descriptor = self.fds.get_mut(fd)?;
            if !descriptor.writable() {
                return Err(fs_err!(EBadF, "descriptor not opened for writing", "write", fd.to_string()));
            }
            if let Some(p) = position {
                descriptor.seek(p);
            }
            descriptor.position()
        };
        let inode = self.fds.get(fd)?.inode().clone();
        write_body(&inode, pos, &buf[buf_off..buf_off + len]);
        inode.borrow_mut().touch_mtime();
        self.fds.get_mut(fd)?.advance(len as u64);
        Ok(len as u64)
    }

    // -- truncate --------------------------------------------------------------

    fn truncate_inode(inode: &InodeRef, new_size: u64, method: &'static str, name: String) -> Result<()> {
        let mut node = inode.borrow_mut();
        let body = node
            .body_mut()
            .ok_or_else(|| fs_err!(EPerm, "truncate target is not a regular file", method, name))?;
        body.truncate(new_size);
        node.touch_mtime();
        Ok(())
    }

    /// Resize the regular file at `path` to `new_size`.
    pub fn truncate(&mut self, path: &str, new_size: u64) -> Result<()> {
        let inode = self.resolve(path, "truncate")?;
        Self::truncate_inode(&inode, new_size, "truncate", path.to_string())
    }

    /// Resize the regular file bound to descriptor `fd` to `new_size`.
    pub fn ftruncate(&mut self, fd: usize, new_size: u64) -> Result<()> {
        let inode = self.fds.get(fd)?.inode().clone();
        Self::truncate_inode(&inode, new_size, "ftruncate", fd.to_string())
    }

    // -- metadata ---------------------------------------------------------------

    /// Metadata snapshot for `path`.
    pub fn stat(&self, path: &str) -> Result<Stat> {
        let inode = self.resolve(path, "stat")?;
        Ok(Stat::from_inode(&inode.borrow()))
    }

    /// Metadata snapshot for the file bound to descriptor `fd`.
    pub fn fstat(&self, fd: usize) -> Result<Stat> {
        let inode = self.fds.get(fd)?.inode().clone();
        Ok(Stat::from_inode(&inode.borrow()))
    }

    /// Rewrite the permission bits of `path`, preserving its type bit.
    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<()> {
        let inode = self.resolve(path, "chmod")?;
        let mut node = inode.borrow_mut();
        let type_bit = if node.is_dir() {
            self.constants.s_ifdir
        } else {
            self.constants.s_ifreg
        };
        node.mode = type_bit | (mode & PERM_MASK);
        node.touch_ctime();
        Ok(())
    }

    /// Overwrite the ownership of `path`.
    pub fn chown(&mut self, path: &str, uid: u32, gid: u32) -> Result<()> {
        let inode = self.resolve(path, "chown")?;
        let mut node = inode.borrow_mut();
        node.uid = uid;
        node.gid = gid;
        node.touch_ctime();
        Ok(())
    }

    /// Set `path`'s access and modification times, in milliseconds since the
    /// Unix epoch.
    pub fn utimes(&mut self, path: &str, atime_ms: i64, mtime_ms: i64) -> Result<()> {
        let inode = self.resolve(path, "utimes")?;
        let mut node = inode.borrow_mut();
        node.atime = atime_ms;
        node.mtime = mtime_ms;
        Ok(())
    }
}

impl Default for FileSystem {
    fn default() -> FileSystem {
        FileSystem::new(Constants::default())
    }
}
