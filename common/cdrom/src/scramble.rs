//! CD-ROM scrambling sequence, as applied to data sectors before they reach the disc surface
//!
//! The scrambler is a 15-bit LFSR (x^15 + x + 1) seeded to 1. The first 12 bytes of a sector (the
//! sync pattern) are never scrambled, which is why the first 6 words of the table are zero.

pub const SCRAMBLING_TABLE_LEN: usize = crate::SAMPLES_PER_SECTOR;

const UNSCRAMBLED_WORDS: usize = 6;

/// Words to XOR against the 16-bit samples of a data sector, in sample order.
pub static SCRAMBLING_TABLE: [u16; SCRAMBLING_TABLE_LEN] = generate();

const fn advance_byte(mut register: u32) -> u32 {
    let mut i = 0;
    while i < 8 {
        let feedback = ((register & 1) ^ ((register >> 1) & 1)) << 15;
        register = (feedback | register) >> 1;
        i += 1;
    }
    register
}

/// Generate the scrambling word table. Deterministic; [`SCRAMBLING_TABLE`] holds the result.
#[must_use]
pub const fn generate() -> [u16; SCRAMBLING_TABLE_LEN] {
    let mut table = [0; SCRAMBLING_TABLE_LEN];

    let mut register: u32 = 1;
    let mut i = UNSCRAMBLED_WORDS;
    while i < SCRAMBLING_TABLE_LEN {
        // Samples are little-endian, so the first byte of the pair lands in the low byte
        let first = (register & 0xFF) as u16;
        register = advance_byte(register);
        let second = (register & 0xFF) as u16;

        table[i] = (second << 8) | first;

        register = advance_byte(register);
        i += 1;
    }

    table
}
