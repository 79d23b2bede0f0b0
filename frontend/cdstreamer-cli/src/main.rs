mod console;
mod image;
mod sim;

use crate::console::{ConsoleCommand, HELP};
use crate::image::HostDisc;
use crate::sim::{NoLicense, SweepingPosition, TimedI2s};
use anyhow::{Context, anyhow};
use cdstreamer_config::{DataLocation, StreamerConfig};
use cdstreamer_core::directory::fs::FsDirectorySource;
use cdstreamer_core::filelisting::FileListingState;
use cdstreamer_core::listing::ParsedPage;
use cdstreamer_core::mailbox::{self, HostHandle, NO_IMAGE};
use cdstreamer_core::streamer::{Collaborators, StreamingLoop};
use clap::Parser;
use env_logger::Env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use std::{fs, hint};

#[derive(Parser)]
struct Args {
    /// Directory served as the removable storage root
    #[arg(long)]
    sd_root: PathBuf,

    /// TOML config file; defaults are used for anything it does not set
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sectors per second (75 for single speed, 150 for double speed)
    #[arg(long, default_value_t = 75)]
    sector_rate: u32,

    /// Override where sectors are read from at startup (Ram / SdCard)
    #[arg(long)]
    initial_data_location: Option<DataLocation>,
}

impl Args {
    fn streamer_config(&self) -> anyhow::Result<StreamerConfig> {
        let mut config = match &self.config {
            Some(path) => StreamerConfig::load(path)?,
            None => StreamerConfig::default(),
        };

        if let Some(location) = self.initial_data_location {
            config.initial_data_location = location;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.sector_rate == 0 {
        return Err(anyhow!("--sector-rate must be positive"));
    }

    let config = args.streamer_config()?;
    let sd_root = fs::canonicalize(&args.sd_root)
        .with_context(|| format!("Unable to resolve storage root '{}'", args.sd_root.display()))?;

    log::info!("Serving '{}' at {} sectors/s", sd_root.display(), args.sector_rate);

    let (drive, host) = mailbox::new();
    let (page_tx, page_rx) = mpsc::channel();

    let start = Instant::now();
    let listing_sector_number = config.pregap + config.listing_sector;
    // Sweep from the start of data to well past the listing sector
    let window = 2 * config.listing_sector.max(1);
    let collaborators = Collaborators {
        i2s: TimedI2s::new(start, args.sector_rate, listing_sector_number, page_tx),
        disc: HostDisc::new(sd_root.clone(), config.pregap),
        position: SweepingPosition::new(
            start,
            args.sector_rate,
            config.lead_in + config.pregap,
            window,
        ),
        license: NoLicense,
        storage: FsDirectorySource::new(sd_root),
    };

    let streamer_thread = thread::Builder::new()
        .name("streamer".into())
        .spawn(move || StreamingLoop::new(collaborators, drive, &config).run())
        .context("Unable to spawn streaming thread")?;

    let sweep_time = Duration::from_secs(window as u64) / args.sector_rate;
    run_console(host, &page_rx, &streamer_thread, sweep_time + Duration::from_secs(1))?;

    if streamer_thread.is_finished() {
        return match streamer_thread.join() {
            Ok(Err(err)) => Err(err.into()),
            Ok(Ok(never)) => match never {},
            Err(_) => Err(anyhow!("Streaming thread panicked")),
        };
    }

    Ok(())
}

fn run_console<T>(
    mut host: HostHandle,
    pages: &Receiver<ParsedPage>,
    streamer_thread: &JoinHandle<T>,
    command_timeout: Duration,
) -> anyhow::Result<()> {
    host.signal_ready();
    while !host.drive_ready() {
        hint::spin_loop();
    }

    let mut listing_ready = true;
    host.set_listing_ready(listing_ready);

    if !console::wait_for_streaming(&host, streamer_thread) {
        log::error!("Streaming thread stopped during startup");
        return Ok(());
    }

    println!("{HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Error reading from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        if streamer_thread.is_finished() {
            log::error!("Streaming thread has stopped");
            return Ok(());
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Listing(state) => {
                run_listing_command(&mut host, state, pages, command_timeout);
            }
            ConsoleCommand::ToggleReady => {
                listing_ready = !listing_ready;
                host.set_listing_ready(listing_ready);
                println!("Listing ready: {listing_ready}");
            }
            ConsoleCommand::Status => print_status(&host),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return Ok(()),
        }

        stdout.flush()?;
    }

    Ok(())
}

fn run_listing_command(
    host: &mut HostHandle,
    state: FileListingState,
    pages: &Receiver<ParsedPage>,
    timeout: Duration,
) {
    // Pages that went by before this command are stale
    while pages.try_recv().is_ok() {}

    host.post_command(state);

    let deadline = Instant::now() + timeout;
    while !host.is_idle() {
        if Instant::now() >= deadline {
            println!("Timed out waiting for {state}; is the console ready?");
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }

    if matches!(state, FileListingState::MountFile(_)) {
        match host.image_index() {
            NO_IMAGE => println!("No image mounted"),
            index => println!("Mounted image entry {index}"),
        }
        return;
    }

    // The page goes out with the sector that follows the state change
    let mut page = None;
    while let Ok(received) = pages.recv_timeout(Duration::from_millis(100)) {
        page = Some(received);
    }

    match page {
        Some(page) => print_page(&page, host.page_offset()),
        None => println!("No listing page received"),
    }
}

fn print_page(page: &ParsedPage, offset: u32) {
    for (i, entry) in page.entries.iter().enumerate() {
        let kind = if entry.is_directory { "<DIR>" } else { "" };
        println!("{:>5} {kind:>5} {}", offset as usize + i, entry.name);
    }

    if let Some(total) = page.total_count {
        println!("{total} entries");
    }
    if page.has_more {
        println!("More entries: page {}", offset as usize + page.entries.len());
    }
}

fn print_status(host: &HostHandle) {
    println!("Listing state: {}", host.listing_state());
    println!("Idle: {}", host.is_idle());
    println!("Page offset: {}", host.page_offset());
    println!("Image index: {}", host.image_index());
    println!("Sector sending: {}", host.sector_sending());
    println!("Last handoff: {} us", host.last_sector_time_us());
}
