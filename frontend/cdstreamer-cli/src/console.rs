//! Line commands for the partner side of the mailbox


use cdstreamer_core::filelisting::FileListingState;
use cdstreamer_core::mailbox::{HostHandle, NO_SECTOR};
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Listing(FileListingState),
    ToggleReady,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(command) = words.next() else { return Err("empty command".into()) };
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments to '{command}'"));
        }

        let parse_argument = || -> Result<u32, String> {
            let argument = argument.ok_or_else(|| format!("'{command}' needs a number"))?;
            argument.parse().map_err(|_| format!("invalid number '{argument}'"))
        };
        let no_argument = |value: Self| match argument {
            Some(_) => Err(format!("'{command}' takes no arguments")),
            None => Ok(value),
        };

        match command {
            "root" => no_argument(Self::Listing(FileListingState::GotoRoot)),
            "parent" => no_argument(Self::Listing(FileListingState::GotoParent)),
            "cd" => Ok(Self::Listing(FileListingState::GotoDirectory(parse_argument()?))),
            "page" => Ok(Self::Listing(FileListingState::GetNextPage(parse_argument()?))),
            "mount" => Ok(Self::Listing(FileListingState::MountFile(parse_argument()?))),
            "ready" => no_argument(Self::ToggleReady),
            "status" => no_argument(Self::Status),
            "help" => no_argument(Self::Help),
            "quit" | "exit" => no_argument(Self::Quit),
            _ => Err(format!("unknown command '{command}'")),
        }
    }
}

pub const HELP: &str = "\
Commands:
  root       list the root directory
  parent     list the parent directory
  cd N       enter entry N of the current directory
  page N     list the current directory starting at entry N
  mount N    mount entry N as the disc image
  ready      toggle whether the console is ready to read listings
  status     show the shared streaming state
  quit       exit";

/// Wait for the first sector handoff, which only happens once storage is mounted. Returns false if
/// the streaming thread stopped first.
pub fn wait_for_streaming<T>(host: &HostHandle, streamer_thread: &JoinHandle<T>) -> bool {
    while host.sector_sending() == NO_SECTOR {
        if streamer_thread.is_finished() {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }

    true
}
