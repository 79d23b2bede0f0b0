//! Interfaces to the collaborators the streaming loop drives but does not own

use crate::DataLocation;
use crate::frame::{FrameBuffer, SampleBuffer};
use std::error::Error;

/// Source of raw sector data for the disc the console sees.
pub trait DiscImage {
    /// Read the sector at `sector_number` (counted from the end of the lead-in) into `out`. Sectors
    /// that cannot be read should be filled with silence rather than left stale.
    fn read_sector(&mut self, out: &mut SampleBuffer, sector_number: i32, location: DataLocation);

    /// Whether the sector most recently read belongs to a data track.
    fn is_current_track_data(&self) -> bool;

    /// Synthesize a complete data sector at `sector_number` carrying `payload` as its user data.
    fn build_sector(&mut self, sector_number: i32, out: &mut SampleBuffer, payload: &[u8]);

    /// Load the image at the given storage path; later reads with [`DataLocation::SdCard`] come
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be opened or parsed.
    fn load(&mut self, path: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>>;
}

/// Current absolute sector under the simulated read head, advanced externally at playback rate.
pub trait DrivePosition {
    fn sector(&self) -> i32;
}

/// Per-sector copy protection signaling. Opaque to the streaming loop.
pub trait LicenseSignal {
    fn send_license_string(&mut self, sector: i32);
}

/// The I2S output: a transfer channel feeding the serializer, plus the frame (LR) clock it runs
/// against.
///
/// Implementations must be finished reading the frames passed to
/// [`set_transfer_source`](Self::set_transfer_source) before [`transfer_busy`](Self::transfer_busy)
/// reports false.
pub trait I2sPort {
    fn transfer_busy(&self) -> bool;

    fn set_transfer_source(&mut self, frames: &FrameBuffer);

    fn start_transfer(&mut self);

    fn frame_clock_high(&self) -> bool;

    /// Monotonic microsecond timestamp.
    fn time_us(&self) -> u64;
}
