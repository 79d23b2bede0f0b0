//! Synthesis of raw Mode 2 Form 2 sectors around an arbitrary payload

use crate::cdtime::CdTime;
use crate::{BYTES_PER_SECTOR, MODE2_FORM2_DATA_LEN};
use crc::Crc;

pub const SYNC_PATTERN: [u8; 12] =
    [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

const HEADER_LEN: usize = 4;
const SUBHEADER_LEN: usize = 8;
const DATA_START: usize = SYNC_PATTERN.len() + HEADER_LEN + SUBHEADER_LEN;
const EDC_START: usize = DATA_START + MODE2_FORM2_DATA_LEN;

const MODE_2: u8 = 0x02;

// Submode bit 5 selects Form 2 (2324 data bytes, no ECC)
const SUBMODE_FORM_2: u8 = 1 << 5;

const EDC: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_CD_ROM_EDC);

/// Write a complete Mode 2 Form 2 sector for the given absolute sector number (00:00:00 based) into
/// `out`. The payload is truncated or zero-padded to the 2324-byte user data area.
pub fn write_mode2_form2(sector_number: u32, payload: &[u8], out: &mut [u8; BYTES_PER_SECTOR]) {
    out[..SYNC_PATTERN.len()].copy_from_slice(&SYNC_PATTERN);

    let [minutes, seconds, frames] = CdTime::from_sector_number(sector_number).to_bcd();
    out[12..16].copy_from_slice(&[minutes, seconds, frames, MODE_2]);

    // Subheader is stored twice: file, channel, submode, coding info
    let subheader = [0x00, 0x00, SUBMODE_FORM_2, 0x00];
    out[16..20].copy_from_slice(&subheader);
    out[20..24].copy_from_slice(&subheader);

    let data = &mut out[DATA_START..EDC_START];
    let copy_len = payload.len().min(MODE2_FORM2_DATA_LEN);
    data[..copy_len].copy_from_slice(&payload[..copy_len]);
    data[copy_len..].fill(0);

    // EDC covers subheader + user data and excludes the header
    let edc = EDC.checksum(&out[16..EDC_START]);
    out[EDC_START..].copy_from_slice(&edc.to_le_bytes());
}

/// Read back the user data area of a Mode 2 Form 2 sector.
#[must_use]
pub fn mode2_form2_data(sector: &[u8; BYTES_PER_SECTOR]) -> &[u8] {
    &sector[DATA_START..EDC_START]
}
