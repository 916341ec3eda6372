//! Directory entries: a (name, inode, xattrs) binding.
//!
//! An `Entry` is the thing a directory's child list actually stores. Its
//! name and extended attributes are its own; its [`crate::inode::Inode`] may
//! be shared with other entries elsewhere in the tree (a hard link).
//! Attributes deliberately live here rather than on the inode -- two hard
//! links to the same file can carry different xattr sets. This mirrors the
//! source this crate's behavior was distilled from and is called out as a
//! deliberate deviation from Linux (where xattrs are per-inode) in DESIGN.md.

use crate::inode::InodeRef;

/// A name bound to a (possibly shared) inode, plus this binding's own
/// extended attributes.
#[derive(Debug)]
pub struct Entry {
    name: String,
    inode: InodeRef,
    attributes: Vec<(String, Vec<u8>)>,
}

impl Entry {
    /// Bind `name` to `inode`, with no extended attributes yet.
    pub fn new(name: impl Into<String>, inode: InodeRef) -> Entry {
        Entry {
            name: name.into(),
            inode,
            attributes: Vec::new(),
        }
    }

    /// This entry's name within its parent directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rebind this entry to a new name (used by `rename`).
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The shared inode this entry's name is bound to.
    pub fn inode(&self) -> &InodeRef {
        &self.inode
    }

    /// Overwrite (or insert) the value of extended attribute `name`.
    pub fn set_xattr(&mut self, name: &str, value: Vec<u8>) {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name.to_string(), value));
        }
    }

    /// The value of extended attribute `name`, if set.
    pub fn get_xattr(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// The names of all extended attributes, in the order they were first set.
    pub fn list_xattrs(&self) -> Vec<&str> {
        self.attributes.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Remove extended attribute `name`. Silently does nothing if absent.
    pub fn remove_xattr(&mut self, name: &str) {
        self.attributes.retain(|(n, _)| n != name);
    }
}
