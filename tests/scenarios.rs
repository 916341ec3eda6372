//! End-to-end scenarios exercising `FileSystem` the way a FUSE bridge would:
//! through paths and descriptors only, never through internal types.

use memfs_core::{Constants, FileSystem};

fn fresh() -> FileSystem {
    FileSystem::new(Constants::default())
}

fn create_and_write(fs: &mut FileSystem, path: &str, data: &[u8]) {
    let c = Constants::default();
    let fd = fs.open(path, c.o_rdwr | c.o_creat, 0o644).unwrap();
    fs.write(fd, data, 0, data.len(), None).unwrap();
    fs.close(fd).unwrap();
}

#[test]
fn directory_tree_round_trip() {
    let mut fs = fresh();
    fs.mkdir("/home").unwrap();
    fs.mkdir("/home/user").unwrap();
    create_and_write(&mut fs, "/home/user/note.txt", b"hello world");

    assert_eq!(fs.readdir("/home").unwrap(), vec!["user".to_string()]);
    assert_eq!(fs.readdir("/home/user").unwrap(), vec!["note.txt".to_string()]);

    let stat = fs.stat("/home/user/note.txt").unwrap();
    assert_eq!(stat.size, 11);
    assert_eq!(stat.nlink, 1);
}

#[test]
fn rmdir_refuses_nonempty_directory_until_drained() {
    let mut fs = fresh();
    fs.mkdir("/d").unwrap();
    create_and_write(&mut fs, "/d/f", b"x");

    assert!(fs.rmdir("/d").is_err());
    fs.unlink("/d/f").unwrap();
    fs.rmdir("/d").unwrap();
    assert!(fs.stat("/d").is_err());
}

#[test]
fn hard_links_share_data_until_last_link_is_removed() {
    let mut fs = fresh();
    create_and_write(&mut fs, "/a", b"shared");
    fs.link("/a", "/b").unwrap();
    fs.link("/a", "/c").unwrap();
    assert_eq!(fs.stat("/a").unwrap().nlink, 3);

    fs.unlink("/a").unwrap();
    fs.unlink("/b").unwrap();
    assert_eq!(fs.stat("/c").unwrap().nlink, 1);

    let c = Constants::default();
    let fd = fs.open("/c", c.o_rdonly, 0).unwrap();
    let mut buf = [0u8; 6];
    fs.read(fd, &mut buf, 0, 6, None).unwrap();
    assert_eq!(&buf, b"shared");
}

#[test]
fn unlink_then_keep_reading_through_open_descriptor() {
    let mut fs = fresh();
    let c = Constants::default();
    let fd = fs.open("/transient", c.o_rdwr | c.o_creat, 0o644).unwrap();
    fs.write(fd, b"still here", 0, 10, None).unwrap();

    fs.unlink("/transient").unwrap();
    assert!(fs.stat("/transient").is_err());
    assert!(fs.readdir("/").unwrap().is_empty());

    let mut buf = [0u8; 10];
    let n = fs.read(fd, &mut buf, 0, 10, Some(0)).unwrap();
    assert_eq!(n, 10);
    assert_eq!(&buf, b"still here");
    fs.close(fd).unwrap();
}

#[test]
fn descriptor_flag_enforcement() {
    let mut fs = fresh();
    let c = Constants::default();
    create_and_write(&mut fs, "/f", b"data");

    let ro = fs.open("/f", c.o_rdonly, 0).unwrap();
    assert!(fs.write(ro, b"x", 0, 1, None).is_err());
    fs.close(ro).unwrap();

    let wo = fs.open("/f", c.o_wronly, 0).unwrap();
    let mut buf = [0u8; 4];
    assert!(fs.read(wo, &mut buf, 0, 4, None).is_err());
    fs.close(wo).unwrap();
}

#[test]
fn rename_replaces_destination_atomically() {
    let mut fs = fresh();
    create_and_write(&mut fs, "/src", b"new");
    create_and_write(&mut fs, "/dst", b"old-longer-content");

    fs.rename("/src", "/dst").unwrap();
    assert!(fs.stat("/src").is_err());

    let c = Constants::default();
    let fd = fs.open("/dst", c.o_rdonly, 0).unwrap();
    let mut buf = [0u8; 3];
    fs.read(fd, &mut buf, 0, 3, None).unwrap();
    assert_eq!(&buf, b"new");
}

#[test]
fn xattrs_are_independent_across_hard_links() {
    let mut fs = fresh();
    create_and_write(&mut fs, "/a", b"x");
    fs.link("/a", "/b").unwrap();

    fs.set_xattr("/a", "user.tag", b"first".to_vec()).unwrap();
    assert_eq!(fs.get_xattr("/a", "user.tag").unwrap(), Some(b"first".to_vec()));
    assert_eq!(fs.get_xattr("/b", "user.tag").unwrap(), None);
}

#[test]
fn truncate_across_multiple_blocks_then_grow_reads_zero_fill() {
    let mut fs = fresh();
    let c = Constants::default();
    let fd = fs.open("/big", c.o_rdwr | c.o_creat, 0o644).unwrap();
    let payload = vec![1u8; 2 * memfs_core::block::BLOCK_SIZE as usize + 100];
    fs.write(fd, &payload, 0, payload.len(), None).unwrap();

    fs.ftruncate(fd, 10).unwrap();
    fs.ftruncate(fd, memfs_core::block::BLOCK_SIZE).unwrap();

    let mut buf = vec![0xffu8; memfs_core::block::BLOCK_SIZE as usize];
    let n = fs.read(fd, &mut buf, 0, buf.len(), Some(0)).unwrap();
    assert_eq!(n, memfs_core::block::BLOCK_SIZE);
    assert!(buf[10..].iter().all(|&b| b == 0));
    fs.close(fd).unwrap();
}

#[test]
fn chmod_preserves_type_bit() {
    let mut fs = fresh();
    fs.mkdir("/d").unwrap();
    fs.chmod("/d", 0o700).unwrap();
    let mode = fs.stat("/d").unwrap().mode;
    assert_eq!(mode & Constants::default().s_ifdir, Constants::default().s_ifdir);
    assert_eq!(mode & 0o7777, 0o700);
}
