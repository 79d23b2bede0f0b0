use super::*;
use crate::directory::DirectoryListing;
use std::{env, fs, process};
use test_log::test;

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let path = env::temp_dir().join(format!("cdstreamer-{name}-{}", process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn host_path_ignores_traversal() {
    let root = Path::new("/mnt/sd");
    assert_eq!(host_path(root, "/"), PathBuf::from("/mnt/sd"));
    assert_eq!(host_path(root, "/GAMES/RPG"), PathBuf::from("/mnt/sd/GAMES/RPG"));
    assert_eq!(host_path(root, "/../etc/./passwd"), PathBuf::from("/mnt/sd/etc/passwd"));
}

#[test]
fn mount_requires_directory() {
    let temp = TempDir::new("mount");
    let file_path = temp.0.join("image.bin");
    fs::write(&file_path, [0; 16]).unwrap();

    assert!(FsDirectorySource::new(&temp.0).mount().is_ok());
    assert!(matches!(FsDirectorySource::new(&file_path).mount(), Err(ListingError::Mount(_))));
    assert!(FsDirectorySource::new(temp.0.join("missing")).mount().is_err());
}

#[test]
fn lists_host_directory() {
    let temp = TempDir::new("list");
    fs::create_dir(temp.0.join("GAMES")).unwrap();
    fs::write(temp.0.join("GAMES").join("Tekken.cue"), "").unwrap();
    fs::write(temp.0.join(".hidden"), "").unwrap();
    fs::write(temp.0.join("menu.bin"), "").unwrap();

    let mut listing = DirectoryListing::new(FsDirectorySource::new(&temp.0), 4096);
    listing.mount().unwrap();
    assert_eq!(listing.get_directory_entries_count().unwrap(), 2);

    let index = (0..2).find(|&i| listing.get_path(i).unwrap() == "/GAMES").unwrap();
    listing.goto_directory(index).unwrap();
    assert_eq!(listing.get_path(0).unwrap(), "/GAMES/Tekken.cue");

    assert!(matches!(listing.goto_directory(1), Err(ListingError::IndexOutOfRange { .. })));
}

#[test]
fn missing_directory_fails_to_open() {
    let temp = TempDir::new("missing");
    let mut source = FsDirectorySource::new(&temp.0);
    assert!(matches!(source.open_dir("/nope"), Err(ListingError::OpenDir { .. })));
}
