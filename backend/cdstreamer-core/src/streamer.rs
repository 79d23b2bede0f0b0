//! The real-time loop that keeps the transfer channel fed with sector frames

#[cfg(test)]
mod tests;

use crate::directory::{DirectorySource, ListingError};
use crate::filelisting::{FileListingStateMachine, StepContext};
use crate::frame::{FrameProducer, SampleBuffer};
use crate::hardware::{DiscImage, DrivePosition, I2sPort, LicenseSignal};
use crate::mailbox::DriveHandle;
use crate::{DataLocation, StreamerConfig};
use std::convert::Infallible;
use std::hint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Unable to mount storage: {0}")]
    Mount(#[source] ListingError),
}

pub type StreamResult<T> = Result<T, StreamError>;

/// Everything the loop drives but does not own the semantics of.
#[derive(Debug)]
pub struct Collaborators<Hw, D, P, L, S> {
    pub i2s: Hw,
    pub disc: D,
    pub position: P,
    pub license: L,
    pub storage: S,
}

#[derive(Debug)]
pub struct StreamingLoop<Hw, D, P, L, S> {
    i2s: Hw,
    disc: D,
    position: P,
    license: L,
    files: FileListingStateMachine<S>,
    mailbox: DriveHandle,
    producer: FrameProducer,
    samples: Box<SampleBuffer>,
    data_location: DataLocation,
    lead_in: i32,
}

impl<Hw, D, P, L, S> StreamingLoop<Hw, D, P, L, S>
where
    Hw: I2sPort,
    D: DiscImage,
    P: DrivePosition,
    L: LicenseSignal,
    S: DirectorySource,
{
    pub fn new(
        collaborators: Collaborators<Hw, D, P, L, S>,
        mailbox: DriveHandle,
        config: &StreamerConfig,
    ) -> Self {
        let Collaborators { i2s, disc, position, license, storage } = collaborators;

        Self {
            i2s,
            disc,
            position,
            license,
            files: FileListingStateMachine::new(storage, config),
            mailbox,
            producer: FrameProducer::new(),
            samples: Box::new([0; cdrom::BYTES_PER_SECTOR]),
            data_location: config.initial_data_location,
            lead_in: config.lead_in,
        }
    }

    /// Rendezvous with the partner, mount storage, and build the root listing.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be mounted. This is the only error the loop reports.
    pub fn start(&mut self) -> StreamResult<()> {
        self.mailbox.signal_ready();
        self.mailbox.wait_for_host();

        if let Err(err) = self.files.listing_mut().mount() {
            log::error!("Unable to mount storage, halting: {err}");
            return Err(StreamError::Mount(err));
        }

        self.files.prime();

        log::info!("Streaming started; reading sectors from {}", self.data_location);

        Ok(())
    }

    /// One pass of the loop: refill the free frame buffer if needed and hand it to the transfer
    /// channel once the channel goes idle.
    pub fn tick(&mut self) {
        // The position can move while the pass runs, so it is sampled exactly once
        let current_sector = self.position.sector();
        self.license.send_license_string(current_sector);

        if self.producer.needs_fill() {
            let sector_number = current_sector - self.lead_in;
            self.disc.read_sector(&mut self.samples, sector_number, self.data_location);

            self.files.step(
                &mut self.mailbox,
                StepContext {
                    sector_number,
                    samples: &mut self.samples,
                    disc: &mut self.disc,
                    data_location: &mut self.data_location,
                },
            );

            let is_data_track = self.disc.is_current_track_data();
            self.producer.produce(&self.samples, is_data_track, current_sector);
        }

        if self.i2s.transfer_busy() {
            return;
        }

        let Some((frames, sector)) = self.producer.handoff() else { return };

        self.mailbox.publish_sector_sending(sector, self.i2s.time_us());
        self.i2s.set_transfer_source(frames);

        // Start on a rising edge of the frame clock
        while self.i2s.frame_clock_high() {
            hint::spin_loop();
        }
        while !self.i2s.frame_clock_high() {
            hint::spin_loop();
        }

        self.i2s.start_transfer();
    }

    /// Start, then run forever.
    ///
    /// # Errors
    ///
    /// Returns an error only if startup fails; see [`Self::start`].
    pub fn run(mut self) -> StreamResult<Infallible> {
        self.start()?;

        loop {
            self.tick();
        }
    }

    #[must_use]
    pub fn i2s(&self) -> &Hw {
        &self.i2s
    }

    #[must_use]
    pub fn disc(&self) -> &D {
        &self.disc
    }

    #[must_use]
    pub fn data_location(&self) -> DataLocation {
        self.data_location
    }

    #[must_use]
    pub fn files(&self) -> &FileListingStateMachine<S> {
        &self.files
    }
}
