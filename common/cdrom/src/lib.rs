pub mod cdtime;
pub mod cue;
pub mod reader;
pub mod scramble;
pub mod sector;

use std::io;
use thiserror::Error;

// Data: 16 header bytes + 2336 bytes of subheader/user data/EDC (Mode 2)
// Audio: 1176 signed 16-bit PCM samples, half for the left channel and half for the right channel
pub const BYTES_PER_SECTOR: usize = 2352;
pub const SAMPLES_PER_SECTOR: usize = BYTES_PER_SECTOR / 2;

// Mode 2 Form 2 user data area
pub const MODE2_FORM2_DATA_LEN: usize = 2324;

pub const LEAD_IN_SECTORS: i32 = 4500;
pub const PREGAP_SECTORS: i32 = 150;

#[derive(Debug, Error)]
pub enum CdRomError {
    #[error("Unable to determine parent directory of CUE file '{0}'")]
    CueParentDir(String),
    #[error("Error parsing CUE file: {0}")]
    CueParse(String),
    #[error("Invalid/unsupported FILE line in CUE file: {0}")]
    CueInvalidFileLine(String),
    #[error("Invalid/unsupported TRACK line in CUE file: {0}")]
    CueInvalidTrackLine(String),
    #[error("Invalid/unsupported INDEX line in CUE file: {0}")]
    CueInvalidIndexLine(String),
    #[error("Error opening CUE file '{path}': {source}")]
    CueOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error opening BIN file '{path}': {source}")]
    BinOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error reading from disc: {0}")]
    DiscReadIo(#[source] io::Error),
}

pub type CdRomResult<T> = Result<T, CdRomError>;
