//! Desktop stand-ins for the drive mechanics and the I2S peripheral

use cdrom::cdtime::CdTime;
use cdrom::sector::{SYNC_PATTERN, mode2_form2_data};
use cdstreamer_core::frame::{FRAMES_PER_SECTOR, FrameBuffer, SampleBuffer, decode_sector};
use cdstreamer_core::hardware::{DrivePosition, I2sPort, LicenseSignal};
use cdstreamer_core::listing::{ParsedPage, parse_page};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// Read head that sweeps a fixed window of sectors at playback rate, wrapping back to the start of
/// the window so it keeps passing the listing sector.
#[derive(Debug, Clone)]
pub struct SweepingPosition {
    start: Instant,
    sector_rate: u32,
    first_sector: i32,
    window: i32,
}

impl SweepingPosition {
    pub fn new(start: Instant, sector_rate: u32, first_sector: i32, window: i32) -> Self {
        Self { start, sector_rate, first_sector, window: window.max(1) }
    }
}

impl DrivePosition for SweepingPosition {
    fn sector(&self) -> i32 {
        let elapsed_sectors =
            self.start.elapsed().as_micros() * u128::from(self.sector_rate) / 1_000_000;
        self.first_sector + (elapsed_sectors % self.window as u128) as i32
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLicense;

impl LicenseSignal for NoLicense {
    fn send_license_string(&mut self, _sector: i32) {}
}

/// Transfer channel that takes one sector period per transfer. Listing pages found in transferred
/// sectors are decoded and forwarded, playing the part of the console's directory browser.
#[derive(Debug)]
pub struct TimedI2s {
    start: Instant,
    sector_period: Duration,
    frame_rate: u64,
    busy_until: Option<Instant>,
    source: Box<FrameBuffer>,
    samples: Box<SampleBuffer>,
    listing_header: [u8; 3],
    pages: Sender<ParsedPage>,
}

impl TimedI2s {
    /// `listing_sector_number` is counted from the end of the lead-in.
    pub fn new(
        start: Instant,
        sector_rate: u32,
        listing_sector_number: i32,
        pages: Sender<ParsedPage>,
    ) -> Self {
        let sector_rate = sector_rate.max(1);
        Self {
            start,
            sector_period: Duration::from_secs(1) / sector_rate,
            frame_rate: u64::from(sector_rate) * FRAMES_PER_SECTOR as u64 / 2,
            busy_until: None,
            source: Box::new([0; FRAMES_PER_SECTOR]),
            samples: Box::new([0; cdrom::BYTES_PER_SECTOR]),
            listing_header: CdTime::from_sector_number(listing_sector_number.max(0) as u32)
                .to_bcd(),
            pages,
        }
    }

    fn forward_listing_page(&mut self) {
        // Listing pages are only ever injected into data sectors
        decode_sector(&self.source, true, &mut self.samples);
        if self.samples[..SYNC_PATTERN.len()] != SYNC_PATTERN
            || self.samples[12..15] != self.listing_header
        {
            return;
        }

        let Some(page) = parse_page(mode2_form2_data(&self.samples)) else {
            log::debug!("Listing sector did not contain a well-formed page");
            return;
        };

        // The console side may have gone away; nothing to do about it here
        let _ = self.pages.send(page);
    }
}

impl I2sPort for TimedI2s {
    fn transfer_busy(&self) -> bool {
        self.busy_until.is_some_and(|busy_until| Instant::now() < busy_until)
    }

    fn set_transfer_source(&mut self, frames: &FrameBuffer) {
        self.source.copy_from_slice(frames);
    }

    fn start_transfer(&mut self) {
        self.busy_until = Some(Instant::now() + self.sector_period);
        self.forward_listing_page();
    }

    fn frame_clock_high(&self) -> bool {
        // Stereo frames: the clock is high for the second (right) sample of each pair
        let half_periods =
            self.start.elapsed().as_nanos() * u128::from(self.frame_rate) * 2 / 1_000_000_000;
        half_periods % 2 == 1
    }

    fn time_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
