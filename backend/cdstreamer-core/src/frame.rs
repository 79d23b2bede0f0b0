//! Conversion of raw sector samples into I2S frames, and the ping-pong buffers they are written to


use cdrom::scramble::SCRAMBLING_TABLE;
use std::array;

pub const FRAMES_PER_SECTOR: usize = cdrom::SAMPLES_PER_SECTOR;

/// One raw 2352-byte sector: 1176 little-endian signed 16-bit samples
pub type SampleBuffer = [u8; cdrom::BYTES_PER_SECTOR];

pub type FrameBuffer = [u32; FRAMES_PER_SECTOR];

/// Encode one sample as a 32-bit I2S frame. The sample occupies bits 8-23; bits 0-7 replicate
/// bit 8 so the receiver sees a sign-extended 24-bit slot.
#[inline(always)]
#[must_use]
pub fn encode_frame(sample: i16, scramble_word: u16) -> u32 {
    let value = i32::from(sample) ^ i32::from(scramble_word);
    let frame = (value << 8) as u32;
    if frame & 0x100 != 0 { frame | 0xFF } else { frame }
}

/// Inverse of [`encode_frame`].
#[inline]
#[must_use]
pub fn decode_frame(frame: u32, scramble_word: u16) -> i16 {
    ((frame >> 8) as u16 ^ scramble_word) as i16
}

/// Converts a whole sector, scrambling it if it belongs to a data track.
pub fn encode_sector(samples: &SampleBuffer, is_data_track: bool, out: &mut FrameBuffer) {
    for ((chunk, frame), &scramble_word) in
        samples.chunks_exact(2).zip(out.iter_mut()).zip(SCRAMBLING_TABLE.iter())
    {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        let scramble_word = if is_data_track { scramble_word } else { 0 };
        *frame = encode_frame(sample, scramble_word);
    }
}

/// Inverse of [`encode_sector`], used by receivers that want the sector bytes back.
pub fn decode_sector(frames: &FrameBuffer, is_data_track: bool, out: &mut SampleBuffer) {
    for ((chunk, &frame), &scramble_word) in
        out.chunks_exact_mut(2).zip(frames.iter()).zip(SCRAMBLING_TABLE.iter())
    {
        let scramble_word = if is_data_track { scramble_word } else { 0 };
        chunk.copy_from_slice(&decode_frame(frame, scramble_word).to_le_bytes());
    }
}

/// Two frame buffers: one owned by the transfer channel, the other being filled by the producer.
///
/// The producer never writes the half the transfer channel owns. Ownership only moves in
/// [`FrameProducer::handoff`], which the caller must only invoke while the channel is idle.
#[derive(Debug)]
pub struct FrameProducer {
    halves: [Box<FrameBuffer>; 2],
    loaded_sectors: [i32; 2],
    transfer_half: usize,
    fill_fresh: bool,
}

impl FrameProducer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            halves: array::from_fn(|_| Box::new([0; FRAMES_PER_SECTOR])),
            loaded_sectors: [crate::mailbox::NO_SECTOR; 2],
            transfer_half: 1,
            fill_fresh: false,
        }
    }

    fn fill_half(&self) -> usize {
        self.transfer_half ^ 1
    }

    /// Whether the fill half is free to receive a new sector.
    #[must_use]
    pub fn needs_fill(&self) -> bool {
        !self.fill_fresh
    }

    pub fn produce(&mut self, samples: &SampleBuffer, is_data_track: bool, sector: i32) {
        let fill_half = self.fill_half();
        encode_sector(samples, is_data_track, &mut self.halves[fill_half]);
        self.loaded_sectors[fill_half] = sector;
        self.fill_fresh = true;
    }

    /// Frames currently owned by the transfer channel.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn transfer_frames(&self) -> &FrameBuffer {
        &self.halves[self.transfer_half]
    }

    /// Swap halves if the fill half holds a freshly produced sector. Returns the frames the
    /// transfer channel now owns and the sector they were produced from.
    pub fn handoff(&mut self) -> Option<(&FrameBuffer, i32)> {
        if !self.fill_fresh {
            return None;
        }

        self.transfer_half = self.fill_half();
        self.fill_fresh = false;

        Some((&self.halves[self.transfer_half], self.loaded_sectors[self.transfer_half]))
    }
}

impl Default for FrameProducer {
    fn default() -> Self {
        Self::new()
    }
}
