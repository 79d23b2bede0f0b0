//! Lock-free cells shared between the streaming loop and the partner core
//!
//! Every cell has exactly one writer. The mailbox is split once into a [`DriveHandle`] owned by the
//! streaming loop and a [`HostHandle`] owned by the partner, and each handle only has setters for
//! the cells its side writes. Neither handle is `Clone`.
//!
//! There is no queue and no read-modify-write: a command is a single packed word, and if the
//! partner posts twice before the loop samples the cell, the loop only ever sees the second
//! command.

#[cfg(test)]
mod tests;

use crate::filelisting::FileListingState;
use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

// Command word layout: [63:40] sequence, [39:32] state discriminant, [31:0] argument
const SEQUENCE_SHIFT: u32 = 40;
const SEQUENCE_MASK: u64 = (1 << 24) - 1;
const STATE_SHIFT: u32 = 32;

pub const NO_IMAGE: i32 = -1;
pub const NO_SECTOR: i32 = -1;

#[derive(Debug)]
struct Mailbox {
    // Written by the drive side
    drive_ready: AtomicBool,
    listing_state: AtomicU64,
    consumed_sequence: AtomicU32,
    page_offset: AtomicU32,
    image_index: AtomicI32,
    sector_sending: AtomicI32,
    last_sector_time_us: AtomicU64,
    // Written by the host side
    host_ready: AtomicBool,
    command: AtomicU64,
    listing_ready: AtomicBool,
}

fn pack_state(state: FileListingState) -> u64 {
    (u64::from(state.discriminant()) << STATE_SHIFT) | u64::from(state.argument())
}

fn unpack_state(word: u64) -> Option<FileListingState> {
    FileListingState::from_parts((word >> STATE_SHIFT) as u8, word as u32)
}

/// Create a new mailbox, returning the streaming loop's handle and the partner's handle.
#[must_use]
pub fn new() -> (DriveHandle, HostHandle) {
    let mailbox = Arc::new(Mailbox {
        drive_ready: AtomicBool::new(false),
        listing_state: AtomicU64::new(pack_state(FileListingState::Idle)),
        consumed_sequence: AtomicU32::new(0),
        page_offset: AtomicU32::new(0),
        image_index: AtomicI32::new(NO_IMAGE),
        sector_sending: AtomicI32::new(NO_SECTOR),
        last_sector_time_us: AtomicU64::new(0),
        host_ready: AtomicBool::new(false),
        command: AtomicU64::new(0),
        listing_ready: AtomicBool::new(false),
    });

    let drive = DriveHandle { mailbox: Arc::clone(&mailbox), last_sequence: 0 };
    let host = HostHandle { mailbox, last_sequence: 0 };
    (drive, host)
}

/// The streaming loop's side of the mailbox.
#[derive(Debug)]
pub struct DriveHandle {
    mailbox: Arc<Mailbox>,
    last_sequence: u32,
}

impl DriveHandle {
    pub fn signal_ready(&self) {
        self.mailbox.drive_ready.store(true, Ordering::Release);
    }

    /// Spin until the partner has signaled readiness.
    pub fn wait_for_host(&self) {
        while !self.mailbox.host_ready.load(Ordering::Acquire) {
            hint::spin_loop();
        }
    }

    /// Returns the most recently posted command if it has not been seen before.
    pub fn poll_command(&mut self) -> Option<FileListingState> {
        let word = self.mailbox.command.load(Ordering::Acquire);
        let sequence = ((word >> SEQUENCE_SHIFT) & SEQUENCE_MASK) as u32;
        if sequence == self.last_sequence {
            return None;
        }

        self.last_sequence = sequence;

        let command = unpack_state(word);
        match command {
            // New state must be visible before the sequence is acknowledged
            Some(command) => self.publish_listing_state(command),
            None => log::warn!("Ignoring malformed listing command word {word:016X}"),
        }
        self.mailbox.consumed_sequence.store(sequence, Ordering::Release);

        command
    }

    #[must_use]
    pub fn listing_ready(&self) -> bool {
        self.mailbox.listing_ready.load(Ordering::Acquire)
    }

    pub fn publish_listing_state(&self, state: FileListingState) {
        self.mailbox.listing_state.store(pack_state(state), Ordering::Release);
    }

    pub fn publish_page_offset(&self, offset: u32) {
        self.mailbox.page_offset.store(offset, Ordering::Relaxed);
    }

    pub fn publish_image_index(&self, index: i32) {
        self.mailbox.image_index.store(index, Ordering::Relaxed);
    }

    pub fn publish_sector_sending(&self, sector: i32, time_us: u64) {
        self.mailbox.sector_sending.store(sector, Ordering::Relaxed);
        self.mailbox.last_sector_time_us.store(time_us, Ordering::Relaxed);
    }
}

/// The partner core's side of the mailbox.
#[derive(Debug)]
pub struct HostHandle {
    mailbox: Arc<Mailbox>,
    last_sequence: u32,
}

impl HostHandle {
    pub fn signal_ready(&self) {
        self.mailbox.host_ready.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn drive_ready(&self) -> bool {
        self.mailbox.drive_ready.load(Ordering::Acquire)
    }

    /// Post a listing command. Overwrites any command the streaming loop has not picked up yet.
    pub fn post_command(&mut self, command: FileListingState) {
        // Sequence 0 is reserved for "nothing posted yet"
        let sequence =
            if self.last_sequence == SEQUENCE_MASK as u32 { 1 } else { self.last_sequence + 1 };
        self.last_sequence = sequence;

        let word = (u64::from(sequence) << SEQUENCE_SHIFT) | pack_state(command);
        self.mailbox.command.store(word, Ordering::Release);
    }

    /// Whether the streaming loop has picked up the last posted command and returned to idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.mailbox.consumed_sequence.load(Ordering::Acquire) == self.last_sequence
            && self.listing_state() == FileListingState::Idle
    }

    pub fn set_listing_ready(&self, ready: bool) {
        self.mailbox.listing_ready.store(ready, Ordering::Release);
    }

    #[must_use]
    pub fn listing_state(&self) -> FileListingState {
        unpack_state(self.mailbox.listing_state.load(Ordering::Acquire))
            .unwrap_or(FileListingState::Idle)
    }

    #[must_use]
    pub fn page_offset(&self) -> u32 {
        self.mailbox.page_offset.load(Ordering::Relaxed)
    }

    /// Index of the last entry mounted from storage, or [`NO_IMAGE`].
    #[must_use]
    pub fn image_index(&self) -> i32 {
        self.mailbox.image_index.load(Ordering::Relaxed)
    }

    /// Sector most recently handed to the transfer channel, or [`NO_SECTOR`].
    #[must_use]
    pub fn sector_sending(&self) -> i32 {
        self.mailbox.sector_sending.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_sector_time_us(&self) -> u64 {
        self.mailbox.last_sector_time_us.load(Ordering::Relaxed)
    }
}
