//! Host-side disc image: a synthesized menu disc in memory, or a CUE/BIN image from the storage root

use cdrom::reader::CueBinImage;
use cdstreamer_core::DataLocation;
use cdstreamer_core::directory::{extension, fs::host_path};
use cdstreamer_core::frame::SampleBuffer;
use cdstreamer_core::hardware::DiscImage;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug)]
pub struct HostDisc {
    storage_root: PathBuf,
    pregap: i32,
    image: Option<CueBinImage<File>>,
    current_track_data: bool,
}

impl HostDisc {
    pub fn new(storage_root: PathBuf, pregap: i32) -> Self {
        Self { storage_root, pregap, image: None, current_track_data: true }
    }

    fn read_menu_sector(&mut self, out: &mut SampleBuffer, sector_number: i32) {
        // The menu disc is a single data track of empty Mode 2 sectors
        cdrom::sector::write_mode2_form2(sector_number.max(0) as u32, &[], out);
        self.current_track_data = true;
    }
}

impl DiscImage for HostDisc {
    fn read_sector(&mut self, out: &mut SampleBuffer, sector_number: i32, location: DataLocation) {
        if location == DataLocation::Ram {
            self.read_menu_sector(out, sector_number);
            return;
        }

        let Some(image) = &mut self.image else {
            out.fill(0);
            return;
        };

        // BIN files start at the end of the pregap
        let bin_sector = sector_number - self.pregap;
        if bin_sector < 0 || bin_sector as u32 >= image.sector_count() {
            out.fill(0);
            self.current_track_data = image.is_data_sector(0);
            return;
        }

        let bin_sector = bin_sector as u32;
        self.current_track_data = image.is_data_sector(bin_sector);
        if let Err(err) = image.read_sector(bin_sector, out) {
            log::warn!("Error reading sector {bin_sector} of mounted image: {err}");
            out.fill(0);
        }
    }

    fn is_current_track_data(&self) -> bool {
        self.current_track_data
    }

    fn build_sector(&mut self, sector_number: i32, out: &mut SampleBuffer, payload: &[u8]) {
        cdrom::sector::write_mode2_form2(sector_number.max(0) as u32, payload, out);
        self.current_track_data = true;
    }

    fn load(&mut self, path: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
        if !extension(path).eq_ignore_ascii_case(".cue") {
            return Err(format!("'{path}' is not a CUE file").into());
        }

        let image = CueBinImage::open(host_path(&self.storage_root, path))?;
        self.image = Some(image);

        Ok(())
    }
}
