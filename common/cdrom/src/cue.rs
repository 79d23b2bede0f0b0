//! Minimal CUE sheet support: a single BIN file with one or more tracks


use crate::cdtime::CdTime;
use crate::{CdRomError, CdRomResult};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Data,
    Audio,
}

impl FromStr for TrackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MODE1/2352" | "MODE2/2352" => Ok(Self::Data),
            "AUDIO" => Ok(Self::Audio),
            _ => Err(format!("unsupported CD track type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub number: u8,
    pub track_type: TrackType,
    /// Sector offset of INDEX 01 within the BIN file
    pub start_sector: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSheet {
    pub bin_file: String,
    pub tracks: Vec<Track>,
}

impl CueSheet {
    /// Parse the text of a CUE sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet references zero or multiple files, contains no tracks, or
    /// contains a malformed FILE/TRACK/INDEX line.
    pub fn parse(file: &str) -> CdRomResult<Self> {
        static FILE_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"FILE "(.*)" BINARY"#).unwrap());
        static TRACK_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"TRACK ([^ ]*) ([^ ]*)").unwrap());
        static INDEX_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"INDEX ([^ ]*) ([^ ]*)").unwrap());

        let mut bin_file: Option<String> = None;
        let mut tracks = Vec::new();
        let mut current_track: Option<(u8, TrackType)> = None;

        for line in file.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("FILE ") {
                if bin_file.is_some() {
                    return Err(CdRomError::CueParse(
                        "multi-file CUE sheets are not supported".into(),
                    ));
                }

                let captures = FILE_RE
                    .captures(trimmed)
                    .ok_or_else(|| CdRomError::CueInvalidFileLine(line.into()))?;
                bin_file = Some(captures[1].into());
            } else if trimmed.starts_with("TRACK ") {
                let captures = TRACK_RE
                    .captures(trimmed)
                    .ok_or_else(|| CdRomError::CueInvalidTrackLine(line.into()))?;
                let number = captures[1]
                    .parse::<u8>()
                    .map_err(|_| CdRomError::CueInvalidTrackLine(line.into()))?;
                let track_type = captures[2]
                    .parse::<TrackType>()
                    .map_err(|_| CdRomError::CueInvalidTrackLine(line.into()))?;
                current_track = Some((number, track_type));
            } else if trimmed.starts_with("INDEX ") {
                let captures = INDEX_RE
                    .captures(trimmed)
                    .ok_or_else(|| CdRomError::CueInvalidIndexLine(line.into()))?;
                if &captures[1] != "01" {
                    continue;
                }

                let Some((number, track_type)) = current_track.take() else {
                    return Err(CdRomError::CueInvalidIndexLine(line.into()));
                };
                let start_time = captures[2]
                    .parse::<CdTime>()
                    .map_err(|_| CdRomError::CueInvalidIndexLine(line.into()))?;

                tracks.push(Track {
                    number,
                    track_type,
                    start_sector: start_time.to_sector_number(),
                });
            }
        }

        let Some(bin_file) = bin_file else {
            return Err(CdRomError::CueParse("CUE file has no FILE line".into()));
        };
        if tracks.is_empty() {
            return Err(CdRomError::CueParse("CUE file has no tracks".into()));
        }

        Ok(Self { bin_file, tracks })
    }

    /// Find the track containing the given sector offset within the BIN file.
    #[must_use]
    pub fn find_track(&self, sector: u32) -> &Track {
        self.tracks
            .iter()
            .rev()
            .find(|track| track.start_sector <= sector)
            .unwrap_or(&self.tracks[0])
    }
}
