//! Navigation and paginated enumeration over a hierarchical file store

pub mod fs;


use crate::listing::{ListingPage, ListingPageBuilder};
use std::io;
use std::iter::Peekable;
use thiserror::Error;

pub const MAX_PATH_LEN: usize = 255;

pub const ROOT: &str = "/";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Error mounting storage: {0}")]
    Mount(#[source] io::Error),
    #[error("Error opening directory '{path}': {source}")]
    OpenDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error reading directory '{path}': {source}")]
    ReadDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Entry {index} out of range; '{path}' has {count} visible entries")]
    IndexOutOfRange { index: u32, path: String, count: u32 },
    #[error("Path would be {len} bytes long; maximum is {MAX_PATH_LEN}")]
    PathTooLong { len: usize },
}

pub type ListingResult<T> = Result<T, ListingError>;

/// An entry as reported by the underlying store, before hidden entries are filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub hidden: bool,
    pub is_directory: bool,
}

pub trait DirectoryReader {
    /// Returns the next entry in native enumeration order, or `None` at the end of the directory.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying store.
    fn read_next(&mut self) -> ListingResult<Option<RawEntry>>;
}

/// A hierarchical file store. Paths are absolute, `/`-separated, and rooted at [`ROOT`]. Readers
/// close their directory handle on drop.
pub trait DirectorySource {
    type Reader: DirectoryReader;

    /// # Errors
    ///
    /// Returns an error if the store cannot be mounted.
    fn mount(&mut self) -> ListingResult<()>;

    /// # Errors
    ///
    /// Returns an error if the directory does not exist or cannot be opened.
    fn open_dir(&mut self, path: &str) -> ListingResult<Self::Reader>;
}

/// Returns the extension of a file name including the leading dot, or an empty string. A leading
/// dot alone does not start an extension.
#[must_use]
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[dot..],
        _ => "",
    }
}

#[must_use]
pub fn strip_extension(name: &str) -> &str {
    &name[..name.len() - extension(name).len()]
}

fn is_visible(entry: &RawEntry, filter: Option<&str>) -> bool {
    if entry.hidden || entry.name.is_empty() {
        return false;
    }

    match filter {
        Some(filter) if !entry.is_directory => strip_extension(&entry.name).contains(filter),
        _ => true,
    }
}

fn combine_paths(directory: &str, name: &str) -> ListingResult<String> {
    let mut path = String::with_capacity(directory.len() + 1 + name.len());
    path.push_str(directory);
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);

    if path.len() > MAX_PATH_LEN {
        return Err(ListingError::PathTooLong { len: path.len() });
    }

    Ok(path)
}

/// Visible entries of one directory. A read error ends the enumeration after being logged.
struct VisibleEntries<'a, R> {
    reader: R,
    path: &'a str,
    filter: Option<&'a str>,
    done: bool,
}

impl<R: DirectoryReader> Iterator for VisibleEntries<'_, R> {
    type Item = RawEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.reader.read_next() {
                Ok(Some(entry)) => {
                    if is_visible(&entry, self.filter) {
                        return Some(entry);
                    }
                }
                Ok(None) => self.done = true,
                Err(err) => {
                    log::warn!("Treating unreadable entry as end of '{}': {err}", self.path);
                    self.done = true;
                }
            }
        }

        None
    }
}

/// Current-directory state plus the page builder that listings are serialized into.
#[derive(Debug)]
pub struct DirectoryListing<S> {
    source: S,
    current_directory: String,
    filter: Option<String>,
    scan_cap: u16,
    page: ListingPageBuilder,
}

impl<S: DirectorySource> DirectoryListing<S> {
    pub fn new(source: S, scan_cap: u16) -> Self {
        Self {
            source,
            current_directory: ROOT.into(),
            filter: None,
            scan_cap,
            page: ListingPageBuilder::new(),
        }
    }

    /// # Errors
    ///
    /// Propagates the source's mount error.
    pub fn mount(&mut self) -> ListingResult<()> {
        self.source.mount()
    }

    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter.filter(|filter| !filter.is_empty());
    }

    #[must_use]
    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    #[must_use]
    pub fn page(&self) -> Option<&ListingPage> {
        self.page.page()
    }

    fn visible_entries(&mut self) -> ListingResult<Peekable<VisibleEntries<'_, S::Reader>>> {
        let reader = self.source.open_dir(&self.current_directory)?;
        Ok(VisibleEntries {
            reader,
            path: &self.current_directory,
            filter: self.filter.as_deref(),
            done: false,
        }
        .peekable())
    }

    fn resolve_entry(&mut self, index: u32) -> ListingResult<RawEntry> {
        let scan_cap = usize::from(self.scan_cap);
        let mut count = 0;
        for entry in self.visible_entries()?.take(scan_cap) {
            if count == index {
                return Ok(entry);
            }
            count += 1;
        }

        Err(ListingError::IndexOutOfRange {
            index,
            path: self.current_directory.clone(),
            count,
        })
    }

    pub fn goto_root(&mut self) {
        self.current_directory.clear();
        self.current_directory.push_str(ROOT);
    }

    pub fn goto_parent_directory(&mut self) {
        let trimmed = self.current_directory.strip_suffix('/').unwrap_or(&self.current_directory);
        let parent_len = trimmed.rfind('/').unwrap_or(0);

        self.current_directory.truncate(parent_len);
        if self.current_directory.is_empty() {
            self.current_directory.push_str(ROOT);
        }

        log::debug!("Moved to parent directory '{}'", self.current_directory);
    }

    /// Descend into the `index`-th visible entry of the current directory. The current directory
    /// is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be enumerated, the index is out of range, or the
    /// resulting path is too long.
    pub fn goto_directory(&mut self, index: u32) -> ListingResult<()> {
        let path = self.get_path(index)?;
        log::debug!("Moved to directory '{path}'");
        self.current_directory = path;

        Ok(())
    }

    /// Absolute path of the `index`-th visible entry of the current directory.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::goto_directory`].
    pub fn get_path(&mut self, index: u32) -> ListingResult<String> {
        let entry = self.resolve_entry(index)?;
        combine_paths(&self.current_directory, &entry.name)
    }

    /// Number of visible entries in the current directory, saturating at the scan cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened.
    pub fn get_directory_entries_count(&mut self) -> ListingResult<u16> {
        let scan_cap = usize::from(self.scan_cap);
        Ok(self.visible_entries()?.take(scan_cap).count() as u16)
    }

    /// Rebuild the listing page starting at the `offset`-th visible entry. Only the first page
    /// (`offset == 0`) reports the total entry count. `has_more` is only set when a visible entry
    /// below the scan cap did not fit on the page. If the directory cannot be opened, the page
    /// is left as an empty, terminated page.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened.
    pub fn get_directory_entries(&mut self, offset: u32) -> ListingResult<()> {
        self.page.clear();

        let scan_cap = usize::from(self.scan_cap);
        let offset = offset as usize;

        let mut entries = match self.source.open_dir(&self.current_directory) {
            Ok(reader) => VisibleEntries {
                reader,
                path: &self.current_directory,
                filter: self.filter.as_deref(),
                done: false,
            }
            .peekable(),
            Err(err) => {
                self.page.add_terminator(false, Some(0));
                return Err(err);
            }
        };

        // Entries past the scan cap are never listed, so reaching it ends the listing
        let mut index = 0;
        let mut has_more = false;
        while let Some(entry) = entries.next() {
            if index >= scan_cap {
                break;
            }

            if index >= offset && !self.page.add_entry(&entry.name, entry.is_directory) {
                has_more = true;
                break;
            }

            index += 1;

            if entries.peek().is_none() {
                break;
            }
        }

        let total_count = (offset == 0).then(|| {
            // The rejected entry plus everything after it, up to the cap
            let remaining = if has_more && index < scan_cap {
                1 + entries.take(scan_cap - index - 1).count()
            } else {
                0
            };
            (index + remaining).min(scan_cap) as u16
        });

        log::debug!(
            "Listed {} entries of '{}' from offset {offset} (more: {has_more}, total: {total_count:?})",
            self.page.entry_count(),
            self.current_directory
        );

        self.page.add_terminator(has_more, total_count);

        Ok(())
    }
}
