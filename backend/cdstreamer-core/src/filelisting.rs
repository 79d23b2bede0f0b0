//! Directory browsing commands, resolved in the streaming loop's timing slot
//!
//! The partner posts one [`FileListingState`] at a time. Navigation commands move the directory
//! cursor and then park the machine in [`FileListingState::ProcessFiles`], where it waits for the
//! console to be ready and for the drive to pass the listing sector before injecting the page.


use crate::directory::{DirectoryListing, DirectorySource};
use crate::frame::SampleBuffer;
use crate::hardware::DiscImage;
use crate::listing::LISTING_PAGE_LEN;
use crate::mailbox::DriveHandle;
use crate::{DataLocation, StreamerConfig};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileListingState {
    #[default]
    Idle,
    GotoRoot,
    GotoParent,
    GotoDirectory(u32),
    GetNextPage(u32),
    MountFile(u32),
    ProcessFiles,
}

impl FileListingState {
    #[must_use]
    pub fn discriminant(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::GotoRoot => 1,
            Self::GotoParent => 2,
            Self::GotoDirectory(_) => 3,
            Self::GetNextPage(_) => 4,
            Self::MountFile(_) => 5,
            Self::ProcessFiles => 6,
        }
    }

    /// Entry index or page offset carried by the state; 0 for states without one.
    #[must_use]
    pub fn argument(self) -> u32 {
        match self {
            Self::GotoDirectory(argument) | Self::GetNextPage(argument) | Self::MountFile(argument) => {
                argument
            }
            Self::Idle | Self::GotoRoot | Self::GotoParent | Self::ProcessFiles => 0,
        }
    }

    #[must_use]
    pub fn from_parts(discriminant: u8, argument: u32) -> Option<Self> {
        match discriminant {
            0 => Some(Self::Idle),
            1 => Some(Self::GotoRoot),
            2 => Some(Self::GotoParent),
            3 => Some(Self::GotoDirectory(argument)),
            4 => Some(Self::GetNextPage(argument)),
            5 => Some(Self::MountFile(argument)),
            6 => Some(Self::ProcessFiles),
            _ => None,
        }
    }
}

impl Display for FileListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::GotoRoot => write!(f, "GotoRoot"),
            Self::GotoParent => write!(f, "GotoParent"),
            Self::GotoDirectory(index) => write!(f, "GotoDirectory({index})"),
            Self::GetNextPage(offset) => write!(f, "GetNextPage({offset})"),
            Self::MountFile(index) => write!(f, "MountFile({index})"),
            Self::ProcessFiles => write!(f, "ProcessFiles"),
        }
    }
}

/// Sector-level environment a single [`FileListingStateMachine::step`] runs against.
pub struct StepContext<'a, D> {
    /// Sector number relative to the end of the lead-in (the number passed to the disc image).
    pub sector_number: i32,
    pub samples: &'a mut SampleBuffer,
    pub disc: &'a mut D,
    pub data_location: &'a mut DataLocation,
}

#[derive(Debug)]
pub struct FileListingStateMachine<S> {
    listing: DirectoryListing<S>,
    state: FileListingState,
    page_offset: u32,
    listing_sector: i32,
    pregap: i32,
    filler: Box<[u8; LISTING_PAGE_LEN]>,
}

impl<S: DirectorySource> FileListingStateMachine<S> {
    pub fn new(source: S, config: &StreamerConfig) -> Self {
        let mut listing = DirectoryListing::new(source, config.scan_cap);
        listing.set_filter(config.name_filter.clone());

        Self {
            listing,
            state: FileListingState::Idle,
            page_offset: 0,
            listing_sector: config.listing_sector,
            pregap: config.pregap,
            filler: Box::new([0; LISTING_PAGE_LEN]),
        }
    }

    #[must_use]
    pub fn state(&self) -> FileListingState {
        self.state
    }

    #[must_use]
    pub fn page_offset(&self) -> u32 {
        self.page_offset
    }

    #[must_use]
    pub fn listing(&self) -> &DirectoryListing<S> {
        &self.listing
    }

    pub fn listing_mut(&mut self) -> &mut DirectoryListing<S> {
        &mut self.listing
    }

    /// Position the listing at the root and build its first page, so the console has something to
    /// read before the partner sends any command.
    pub fn prime(&mut self) {
        self.listing.goto_root();
        self.page_offset = 0;
        if let Err(err) = self.listing.get_directory_entries(0) {
            log::warn!("Unable to build initial listing page: {err}");
        }
    }

    /// Run one production pass: pick up a newly posted command, resolve it, and inject the listing
    /// page into `ctx.samples` if this is the pass for it.
    pub fn step<D: DiscImage>(&mut self, mailbox: &mut DriveHandle, ctx: StepContext<'_, D>) {
        if let Some(command) = mailbox.poll_command() {
            log::debug!("Received listing command {command} while in state {}", self.state);
            self.state = command;
        }

        if self.state == FileListingState::Idle {
            return;
        }

        self.resolve_command(mailbox, &mut *ctx.disc, &mut *ctx.data_location);

        if self.state == FileListingState::ProcessFiles {
            self.process_files(mailbox, ctx.sector_number, ctx.samples, ctx.disc);
        }

        mailbox.publish_listing_state(self.state);
        mailbox.publish_page_offset(self.page_offset);
    }

    fn resolve_command<D: DiscImage>(
        &mut self,
        mailbox: &DriveHandle,
        disc: &mut D,
        data_location: &mut DataLocation,
    ) {
        match self.state {
            FileListingState::Idle | FileListingState::ProcessFiles => {}
            FileListingState::GotoRoot => {
                log::info!("Moving to root directory");
                self.listing.goto_root();
                self.page_offset = 0;
                self.state = FileListingState::ProcessFiles;
            }
            FileListingState::GotoParent => {
                log::info!("Moving to parent directory");
                self.listing.goto_parent_directory();
                self.page_offset = 0;
                self.state = FileListingState::ProcessFiles;
            }
            FileListingState::GotoDirectory(index) => {
                log::info!("Moving to directory entry {index}");
                if let Err(err) = self.listing.goto_directory(index) {
                    log::warn!("Staying in '{}': {err}", self.listing.current_directory());
                }
                self.page_offset = 0;
                self.state = FileListingState::ProcessFiles;
            }
            FileListingState::GetNextPage(offset) => {
                log::debug!("Requested listing page at offset {offset}");
                self.page_offset = offset;
                self.state = FileListingState::ProcessFiles;
            }
            FileListingState::MountFile(index) => {
                self.mount_file(mailbox, index, disc, data_location);
                self.state = FileListingState::Idle;
            }
        }
    }

    fn mount_file<D: DiscImage>(
        &mut self,
        mailbox: &DriveHandle,
        index: u32,
        disc: &mut D,
        data_location: &mut DataLocation,
    ) {
        let path = match self.listing.get_path(index) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Unable to resolve image entry {index}: {err}");
                return;
            }
        };

        match disc.load(&path) {
            Ok(()) => {
                log::info!("Mounted disc image '{path}'");
                *data_location = DataLocation::SdCard;
                mailbox.publish_image_index(index as i32);
            }
            Err(err) => {
                log::warn!("Unable to load disc image '{path}': {err}");
            }
        }
    }

    fn process_files<D: DiscImage>(
        &mut self,
        mailbox: &DriveHandle,
        sector_number: i32,
        samples: &mut SampleBuffer,
        disc: &mut D,
    ) {
        if !mailbox.listing_ready() {
            // Keep the console from reading a stale page while it waits
            disc.build_sector(sector_number, samples, self.filler.as_slice());
            return;
        }

        if sector_number - self.pregap != self.listing_sector {
            return;
        }

        if let Err(err) = self.listing.get_directory_entries(self.page_offset) {
            log::warn!("Sending empty listing page: {err}");
        }

        let page = self.listing.page().map_or(self.filler.as_slice(), |page| page.as_slice());
        disc.build_sector(sector_number, samples, page);

        log::debug!(
            "Injected listing page for '{}' at offset {} into sector {sector_number}",
            self.listing.current_directory(),
            self.page_offset
        );

        self.state = FileListingState::Idle;
    }
}
