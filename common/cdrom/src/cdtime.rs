//! Minutes/seconds/frames disc addressing

use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const FRAMES_PER_SECOND: u32 = 75;
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Sector numbers representable with a two-digit BCD minute, i.e. up to 99:59:74
pub const MAX_SECTORS: u32 = 100 * SECONDS_PER_MINUTE * FRAMES_PER_SECOND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CdTime {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl CdTime {
    pub const ZERO: Self = Self { minutes: 0, seconds: 0, frames: 0 };

    /// # Panics
    ///
    /// Panics if seconds or frames are out of range.
    #[must_use]
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        assert!(u32::from(seconds) < SECONDS_PER_MINUTE, "seconds out of range: {seconds}");
        assert!(u32::from(frames) < FRAMES_PER_SECOND, "frames out of range: {frames}");

        Self { minutes, seconds, frames }
    }

    /// Sector numbers at or past [`MAX_SECTORS`] saturate to 99:59:74.
    #[must_use]
    pub fn from_sector_number(sector_number: u32) -> Self {
        let sector_number = sector_number.min(MAX_SECTORS - 1);
        let frames = sector_number % FRAMES_PER_SECOND;
        let total_seconds = sector_number / FRAMES_PER_SECOND;
        let seconds = total_seconds % SECONDS_PER_MINUTE;
        let minutes = total_seconds / SECONDS_PER_MINUTE;

        Self { minutes: minutes as u8, seconds: seconds as u8, frames: frames as u8 }
    }

    #[must_use]
    pub fn to_sector_number(self) -> u32 {
        (u32::from(self.minutes) * SECONDS_PER_MINUTE + u32::from(self.seconds))
            * FRAMES_PER_SECOND
            + u32::from(self.frames)
    }

    /// Minutes/seconds/frames as packed BCD, the form they take in sector headers.
    #[must_use]
    pub fn to_bcd(self) -> [u8; 3] {
        [to_bcd(self.minutes), to_bcd(self.seconds), to_bcd(self.frames)]
    }
}

fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

impl Display for CdTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minutes, self.seconds, self.frames)
    }
}

impl FromStr for CdTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(minutes), Some(seconds), Some(frames), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("invalid time string: {s}"));
        };

        let parse = |part: &str| part.parse::<u8>().map_err(|_| format!("invalid time string: {s}"));
        let (minutes, seconds, frames) = (parse(minutes)?, parse(seconds)?, parse(frames)?);

        if u32::from(seconds) >= SECONDS_PER_MINUTE || u32::from(frames) >= FRAMES_PER_SECOND {
            return Err(format!("time out of range: {s}"));
        }

        Ok(Self { minutes, seconds, frames })
    }
}
