use super::*;
use crate::filelisting::FileListingState;
use crate::frame::{FrameBuffer, decode_sector, encode_sector};
use crate::listing::parse_page;
use crate::mailbox::{self, HostHandle, NO_SECTOR};
use crate::testutil::{
    BUILT_BYTE, IMAGE_BYTE, MemoryDirectorySource, RecordingDisc, RecordingLicense,
    SharedPosition, TestI2s, dir, file,
};
use std::cell::Cell;
use std::rc::Rc;
use test_log::test;

type TestLoop =
    StreamingLoop<TestI2s, RecordingDisc, SharedPosition, RecordingLicense, MemoryDirectorySource>;

struct Harness {
    streamer: TestLoop,
    host: HostHandle,
    position: Rc<Cell<i32>>,
    busy: Rc<Cell<bool>>,
    license_calls: Rc<Cell<usize>>,
}

fn storage() -> MemoryDirectorySource {
    MemoryDirectorySource::new()
        .with_dir("/", vec![dir("GAMES"), file("Tekken.cue")])
        .with_dir("/GAMES", vec![])
}

fn harness_with(storage: MemoryDirectorySource, disc: RecordingDisc) -> Harness {
    let (drive, host) = mailbox::new();
    let position = SharedPosition::default();
    let license = RecordingLicense::default();
    let i2s = TestI2s::default();

    let harness = Harness {
        position: Rc::clone(&position.0),
        busy: Rc::clone(&i2s.busy),
        license_calls: Rc::clone(&license.0),
        host,
        streamer: StreamingLoop::new(
            Collaborators { i2s, disc, position, license, storage },
            drive,
            &StreamerConfig::default(),
        ),
    };

    // Startup would otherwise spin waiting for the partner
    harness.host.signal_ready();
    harness
}

fn started_harness() -> Harness {
    let mut harness = harness_with(storage(), RecordingDisc::default());
    harness.streamer.start().unwrap();
    harness
}

fn expected_frames(byte: u8, is_data_track: bool) -> Box<FrameBuffer> {
    let mut frames = Box::new([0; crate::frame::FRAMES_PER_SECTOR]);
    encode_sector(&[byte; cdrom::BYTES_PER_SECTOR], is_data_track, &mut frames);
    frames
}

#[test]
fn mount_failure_is_fatal() {
    let mut harness = harness_with(storage().failing_mount(), RecordingDisc::default());

    assert!(matches!(harness.streamer.start(), Err(StreamError::Mount(ListingError::Mount(_)))));
    assert!(harness.host.drive_ready());
}

#[test]
fn startup_primes_root_listing() {
    let harness = started_harness();

    let listing = harness.streamer.files().listing();
    assert_eq!(listing.current_directory(), "/");
    let page = parse_page(listing.page().unwrap()).unwrap();
    assert_eq!(page.entries.len(), 2);
    assert_eq!(page.total_count, Some(2));
}

#[test]
fn streams_sector_under_read_head() {
    let mut harness = started_harness();
    harness.position.set(4500 + 1000);

    harness.streamer.tick();

    assert_eq!(harness.streamer.disc().reads, [(1000, DataLocation::Ram)]);
    assert_eq!(harness.license_calls.get(), 1);
    assert_eq!(harness.host.sector_sending(), 5500);
    assert!(harness.host.last_sector_time_us() > 0);

    let started = &harness.streamer.i2s().started;
    assert_eq!(started.len(), 1);
    assert_eq!(started[0], expected_frames(IMAGE_BYTE, false));
}

#[test]
fn data_tracks_are_scrambled() {
    let disc = RecordingDisc { data_track: true, ..RecordingDisc::default() };
    let mut harness = harness_with(storage(), disc);
    harness.streamer.start().unwrap();
    harness.position.set(4500 + 150);

    harness.streamer.tick();

    let started = &harness.streamer.i2s().started;
    assert_eq!(started[0], expected_frames(IMAGE_BYTE, true));
    assert_ne!(started[0], expected_frames(IMAGE_BYTE, false));
}

#[test]
fn waits_for_idle_transfer_channel() {
    let mut harness = started_harness();
    harness.busy.set(true);
    harness.position.set(4600);

    harness.streamer.tick();
    harness.position.set(4601);
    harness.streamer.tick();

    // One sector produced and held until the channel frees up
    assert_eq!(harness.streamer.disc().reads.len(), 1);
    assert!(harness.streamer.i2s().started.is_empty());
    assert_eq!(harness.host.sector_sending(), NO_SECTOR);
    assert_eq!(harness.license_calls.get(), 2);

    harness.busy.set(false);
    harness.streamer.tick();

    assert_eq!(harness.host.sector_sending(), 4600);
    assert_eq!(harness.streamer.i2s().started.len(), 1);
    assert_eq!(harness.streamer.disc().reads.len(), 1);

    harness.streamer.tick();
    assert_eq!(harness.streamer.disc().reads, [(100, DataLocation::Ram), (101, DataLocation::Ram)]);
    assert_eq!(harness.host.sector_sending(), 4601);
    assert_eq!(harness.streamer.i2s().started.len(), 2);
}

#[test]
fn transfer_starts_on_rising_clock_edge() {
    let mut harness = started_harness();
    harness.position.set(4600);

    harness.streamer.tick();

    // Clock reads low first, so the next high sample is the rising edge
    assert_eq!(harness.streamer.i2s().clock_samples.get(), 2);
    assert_eq!(harness.streamer.i2s().started.len(), 1);
}

#[test]
fn listing_page_injected_at_listing_sector() {
    let mut harness = started_harness();
    harness.host.set_listing_ready(true);
    harness.host.post_command(FileListingState::GotoRoot);

    harness.position.set(4500 + 249);
    harness.streamer.tick();
    assert!(harness.streamer.disc().built.is_empty());
    assert!(!harness.host.is_idle());

    harness.position.set(4500 + 250);
    harness.streamer.tick();
    assert!(harness.host.is_idle());

    let (sector, payload) = &harness.streamer.disc().built[0];
    assert_eq!(*sector, 250);
    let page = parse_page(payload).unwrap();
    assert_eq!(page.entries[1].name, "Tekken.cue");

    let mut samples = [0; cdrom::BYTES_PER_SECTOR];
    let frames = harness.streamer.i2s().started.last().unwrap();
    decode_sector(frames, false, &mut samples);
    assert!(samples.iter().all(|&b| b == BUILT_BYTE));
}

#[test]
fn mounted_image_is_read_from_storage() {
    let disc = RecordingDisc {
        loadable: ["/Tekken.cue".to_string()].into_iter().collect(),
        ..RecordingDisc::default()
    };
    let mut harness = harness_with(storage(), disc);
    harness.streamer.start().unwrap();

    harness.host.post_command(FileListingState::MountFile(1));
    harness.position.set(4600);
    harness.streamer.tick();

    assert_eq!(harness.streamer.data_location(), DataLocation::SdCard);
    assert_eq!(harness.host.image_index(), 1);

    harness.position.set(4601);
    harness.streamer.tick();
    assert_eq!(
        harness.streamer.disc().reads,
        [(100, DataLocation::Ram), (101, DataLocation::SdCard)]
    );
}
