//! [`DirectorySource`] over a host directory, standing in for the SD card

#[cfg(test)]
mod tests;

use crate::directory::{DirectoryReader, DirectorySource, ListingError, ListingResult, RawEntry};
use std::fs::ReadDir;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsDirectorySource {
    root: PathBuf,
}

impl FsDirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Map an absolute listing path onto the host filesystem.
    #[must_use]
    pub fn host_path(&self, path: &str) -> PathBuf {
        host_path(&self.root, path)
    }
}

#[must_use]
pub fn host_path(root: &Path, path: &str) -> PathBuf {
    path.split('/')
        .filter(|component| !matches!(*component, "" | "." | ".."))
        .fold(root.to_path_buf(), |acc, component| acc.join(component))
}

#[derive(Debug)]
pub struct FsDirectoryReader {
    path: String,
    entries: ReadDir,
}

impl DirectoryReader for FsDirectoryReader {
    fn read_next(&mut self) -> ListingResult<Option<RawEntry>> {
        let Some(entry) = self.entries.next() else { return Ok(None) };
        let entry =
            entry.map_err(|source| ListingError::ReadDir { path: self.path.clone(), source })?;

        let name = entry.file_name().to_string_lossy().into_owned();
        let hidden = name.starts_with('.');
        // Follows symlinks, unlike DirEntry::file_type
        let is_directory = entry.path().is_dir();

        Ok(Some(RawEntry { name, hidden, is_directory }))
    }
}

impl DirectorySource for FsDirectorySource {
    type Reader = FsDirectoryReader;

    fn mount(&mut self) -> ListingResult<()> {
        let metadata = std::fs::metadata(&self.root).map_err(ListingError::Mount)?;
        if !metadata.is_dir() {
            return Err(ListingError::Mount(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("'{}' is not a directory", self.root.display()),
            )));
        }

        log::info!("Mounted '{}' as storage root", self.root.display());

        Ok(())
    }

    fn open_dir(&mut self, path: &str) -> ListingResult<Self::Reader> {
        let entries = std::fs::read_dir(self.host_path(path))
            .map_err(|source| ListingError::OpenDir { path: path.into(), source })?;

        Ok(FsDirectoryReader { path: path.into(), entries })
    }
}
