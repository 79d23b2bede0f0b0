use super::*;
use std::thread;
use test_log::test;

#[test]
fn initial_state() {
    let (mut drive, host) = new();

    assert!(!host.drive_ready());
    assert!(!drive.listing_ready());
    assert!(host.is_idle());
    assert_eq!(host.listing_state(), FileListingState::Idle);
    assert_eq!(host.image_index(), NO_IMAGE);
    assert_eq!(host.sector_sending(), NO_SECTOR);
    assert_eq!(drive.poll_command(), None);
}

#[test]
fn command_is_seen_once() {
    let (mut drive, mut host) = new();

    host.post_command(FileListingState::GetNextPage(90));
    assert!(!host.is_idle());

    assert_eq!(drive.poll_command(), Some(FileListingState::GetNextPage(90)));
    assert_eq!(host.listing_state(), FileListingState::GetNextPage(90));
    assert_eq!(drive.poll_command(), None);

    // Picked up but not yet resolved
    assert!(!host.is_idle());
    drive.publish_listing_state(FileListingState::Idle);
    assert!(host.is_idle());
}

#[test]
fn same_command_twice_is_two_commands() {
    let (mut drive, mut host) = new();

    host.post_command(FileListingState::GotoParent);
    assert_eq!(drive.poll_command(), Some(FileListingState::GotoParent));
    host.post_command(FileListingState::GotoParent);
    assert_eq!(drive.poll_command(), Some(FileListingState::GotoParent));
}

#[test]
fn last_write_wins() {
    let (mut drive, mut host) = new();

    host.post_command(FileListingState::GotoDirectory(3));
    host.post_command(FileListingState::MountFile(5));

    assert_eq!(drive.poll_command(), Some(FileListingState::MountFile(5)));
    assert_eq!(drive.poll_command(), None);
}

#[test]
fn sequence_wraps_past_zero() {
    let (mut drive, mut host) = new();
    host.last_sequence = SEQUENCE_MASK as u32 - 1;

    host.post_command(FileListingState::GotoRoot);
    assert_eq!(drive.poll_command(), Some(FileListingState::GotoRoot));
    host.post_command(FileListingState::GotoParent);
    assert_eq!(host.last_sequence, 1);
    assert_eq!(drive.poll_command(), Some(FileListingState::GotoParent));
}

#[test]
fn drive_cells() {
    let (drive, host) = new();

    drive.signal_ready();
    drive.publish_page_offset(42);
    drive.publish_image_index(7);
    drive.publish_sector_sending(4750, 123_456);
    host.set_listing_ready(true);

    assert!(host.drive_ready());
    assert!(drive.listing_ready());
    assert_eq!(host.page_offset(), 42);
    assert_eq!(host.image_index(), 7);
    assert_eq!(host.sector_sending(), 4750);
    assert_eq!(host.last_sector_time_us(), 123_456);
}

#[test]
fn startup_rendezvous() {
    let (drive, host) = new();

    let drive_thread = thread::spawn(move || {
        drive.signal_ready();
        drive.wait_for_host();
        drive
    });

    while !host.drive_ready() {
        hint::spin_loop();
    }
    host.signal_ready();

    drive_thread.join().unwrap();
}
