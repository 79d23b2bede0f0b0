//! Raw sector reads from a single-file CUE/BIN image


use crate::cue::{CueSheet, Track, TrackType};
use crate::{BYTES_PER_SECTOR, CdRomError, CdRomResult};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

#[derive(Debug)]
pub struct CueBinImage<F> {
    cue_sheet: CueSheet,
    file: BufReader<F>,
    position: u64,
    sector_count: u32,
}

impl CueBinImage<File> {
    /// Open a CUE sheet and the BIN file it references, which is resolved relative to the CUE
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or the CUE sheet is invalid.
    pub fn open<P: AsRef<Path>>(cue_path: P) -> CdRomResult<Self> {
        let cue_path = cue_path.as_ref();

        let cue_text = fs::read_to_string(cue_path).map_err(|source| CdRomError::CueOpen {
            path: cue_path.display().to_string(),
            source,
        })?;
        let cue_sheet = CueSheet::parse(&cue_text)?;

        let parent_dir = cue_path
            .parent()
            .ok_or_else(|| CdRomError::CueParentDir(cue_path.display().to_string()))?;
        let bin_path = parent_dir.join(&cue_sheet.bin_file);
        let file = File::open(&bin_path).map_err(|source| CdRomError::BinOpen {
            path: bin_path.display().to_string(),
            source,
        })?;

        log::info!(
            "Opened '{}' with {} track(s) from '{}'",
            bin_path.display(),
            cue_sheet.tracks.len(),
            cue_path.display()
        );

        Self::new(cue_sheet, file)
    }
}

impl<F: Read + Seek> CueBinImage<F> {
    /// # Errors
    ///
    /// Returns an error if the file length cannot be determined.
    pub fn new(cue_sheet: CueSheet, mut file: F) -> CdRomResult<Self> {
        let len = file.seek(SeekFrom::End(0)).map_err(CdRomError::DiscReadIo)?;
        file.seek(SeekFrom::Start(0)).map_err(CdRomError::DiscReadIo)?;

        Ok(Self {
            cue_sheet,
            file: BufReader::new(file),
            position: 0,
            sector_count: (len / BYTES_PER_SECTOR as u64) as u32,
        })
    }

    #[must_use]
    pub fn cue_sheet(&self) -> &CueSheet {
        &self.cue_sheet
    }

    /// Number of whole sectors in the BIN file.
    #[must_use]
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Track containing the given BIN sector.
    #[must_use]
    pub fn track(&self, sector_number: u32) -> &Track {
        self.cue_sheet.find_track(sector_number)
    }

    #[must_use]
    pub fn is_data_sector(&self, sector_number: u32) -> bool {
        self.track(sector_number).track_type == TrackType::Data
    }

    /// Read one raw sector by its offset within the BIN file.
    ///
    /// # Errors
    ///
    /// Returns an error if the sector is past the end of the file or the read fails.
    pub fn read_sector(
        &mut self,
        sector_number: u32,
        out: &mut [u8; BYTES_PER_SECTOR],
    ) -> CdRomResult<()> {
        if sector_number >= self.sector_count {
            return Err(CdRomError::DiscReadIo(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("sector {sector_number} is past the end of the image"),
            )));
        }

        let sector_addr = u64::from(sector_number) * BYTES_PER_SECTOR as u64;

        // Only seek if the file is not already at the desired position
        if self.position != sector_addr {
            self.file.seek(SeekFrom::Start(sector_addr)).map_err(CdRomError::DiscReadIo)?;
        }

        if let Err(err) = self.file.read_exact(out) {
            self.position = u64::MAX;
            return Err(CdRomError::DiscReadIo(err));
        }
        self.position = sector_addr + BYTES_PER_SECTOR as u64;

        Ok(())
    }
}
