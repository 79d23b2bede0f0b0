//! In-memory collaborators shared by the unit tests

use crate::directory::{DirectoryReader, DirectorySource, ListingError, ListingResult, RawEntry};
use crate::frame::{FrameBuffer, SampleBuffer};
use crate::hardware::{DiscImage, DrivePosition, I2sPort, LicenseSignal};
use crate::DataLocation;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::io;
use std::rc::Rc;

pub fn file(name: &str) -> RawEntry {
    RawEntry { name: name.into(), hidden: false, is_directory: false }
}

pub fn dir(name: &str) -> RawEntry {
    RawEntry { name: name.into(), hidden: false, is_directory: true }
}

pub fn hidden(name: &str) -> RawEntry {
    RawEntry { name: name.into(), hidden: true, is_directory: false }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDirectorySource {
    directories: HashMap<String, Vec<RawEntry>>,
    fail_mount: bool,
    // Directory path -> number of entries to return before a read error
    fail_reads_after: HashMap<String, usize>,
    pub opened: Rc<Cell<usize>>,
}

impl MemoryDirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, path: &str, entries: Vec<RawEntry>) -> Self {
        self.directories.insert(path.into(), entries);
        self
    }

    pub fn failing_mount(mut self) -> Self {
        self.fail_mount = true;
        self
    }

    pub fn failing_reads_after(mut self, path: &str, count: usize) -> Self {
        self.fail_reads_after.insert(path.into(), count);
        self
    }
}

#[derive(Debug)]
pub struct MemoryDirectoryReader {
    path: String,
    entries: std::vec::IntoIter<RawEntry>,
    fail_after: Option<usize>,
    returned: usize,
}

impl DirectoryReader for MemoryDirectoryReader {
    fn read_next(&mut self) -> ListingResult<Option<RawEntry>> {
        if self.fail_after == Some(self.returned) {
            return Err(ListingError::ReadDir {
                path: self.path.clone(),
                source: io::Error::other("injected read failure"),
            });
        }

        self.returned += 1;
        Ok(self.entries.next())
    }
}

impl DirectorySource for MemoryDirectorySource {
    type Reader = MemoryDirectoryReader;

    fn mount(&mut self) -> ListingResult<()> {
        if self.fail_mount {
            return Err(ListingError::Mount(io::Error::other("no card inserted")));
        }
        Ok(())
    }

    fn open_dir(&mut self, path: &str) -> ListingResult<Self::Reader> {
        let entries = self.directories.get(path).ok_or_else(|| ListingError::OpenDir {
            path: path.into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })?;

        self.opened.set(self.opened.get() + 1);

        Ok(MemoryDirectoryReader {
            path: path.into(),
            entries: entries.clone().into_iter(),
            fail_after: self.fail_reads_after.get(path).copied(),
            returned: 0,
        })
    }
}

/// Sector contents produced by [`RecordingDisc`], so tests can tell where a sector came from.
pub const IMAGE_BYTE: u8 = 0x11;
pub const BUILT_BYTE: u8 = 0x22;

#[derive(Debug, Default)]
pub struct RecordingDisc {
    pub data_track: bool,
    pub reads: Vec<(i32, DataLocation)>,
    pub built: Vec<(i32, Vec<u8>)>,
    pub loaded: Vec<String>,
    pub loadable: HashSet<String>,
}

impl DiscImage for RecordingDisc {
    fn read_sector(&mut self, out: &mut SampleBuffer, sector_number: i32, location: DataLocation) {
        out.fill(IMAGE_BYTE);
        self.reads.push((sector_number, location));
    }

    fn is_current_track_data(&self) -> bool {
        self.data_track
    }

    fn build_sector(&mut self, sector_number: i32, out: &mut SampleBuffer, payload: &[u8]) {
        out.fill(BUILT_BYTE);
        self.built.push((sector_number, payload.to_vec()));
    }

    fn load(&mut self, path: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
        if !self.loadable.contains(path) {
            return Err(format!("no such image: {path}").into());
        }
        self.loaded.push(path.into());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedPosition(pub Rc<Cell<i32>>);

impl DrivePosition for SharedPosition {
    fn sector(&self) -> i32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLicense(pub Rc<Cell<usize>>);

impl LicenseSignal for RecordingLicense {
    fn send_license_string(&mut self, _sector: i32) {
        self.0.set(self.0.get() + 1);
    }
}

/// Transfer channel whose busy flag is driven by the test. The frame clock toggles on every
/// sample so edge waits always terminate.
#[derive(Debug, Default)]
pub struct TestI2s {
    pub busy: Rc<Cell<bool>>,
    pub source: Option<Box<FrameBuffer>>,
    pub started: Vec<Box<FrameBuffer>>,
    pub clock_samples: Cell<u64>,
    pub time_us: Cell<u64>,
}

impl I2sPort for TestI2s {
    fn transfer_busy(&self) -> bool {
        self.busy.get()
    }

    fn set_transfer_source(&mut self, frames: &FrameBuffer) {
        self.source = Some(Box::new(*frames));
    }

    fn start_transfer(&mut self) {
        if let Some(source) = self.source.take() {
            self.started.push(source);
        }
    }

    fn frame_clock_high(&self) -> bool {
        let samples = self.clock_samples.get();
        self.clock_samples.set(samples + 1);
        samples % 2 == 1
    }

    fn time_us(&self) -> u64 {
        let time = self.time_us.get() + 13_333;
        self.time_us.set(time);
        time
    }
}
