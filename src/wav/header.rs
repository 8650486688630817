//! Fixed 44-byte canonical WAV header.

/// Size of the canonical PCM header in bytes.
pub const HEADER_LEN: usize = 44;

/// Bits per sample of every file this crate writes.
pub const BITS_PER_SAMPLE: u16 = 16;

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Field values of a canonical 44-byte WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for 16-bit PCM.  The caller guarantees the products fit in
    /// 32 bits.
    pub(crate) fn pcm16(channels: u16, sample_rate: u32, data_size: u32) -> Self {
        let block_align = channels * (BITS_PER_SAMPLE / 8);
        Self {
            chunk_size: 36 + data_size,
            fmt_chunk_size: FMT_CHUNK_LEN,
            audio_format: PCM_FORMAT,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    /// Append the 44 header bytes to `out`.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&self.chunk_size.to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&self.fmt_chunk_size.to_le_bytes());
        out.extend_from_slice(&self.audio_format.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&self.data_size.to_le_bytes());
    }

    /// Read the canonical layout back.  Returns `None` when the buffer is
    /// shorter than 44 bytes or any of the four chunk tags is wrong.
    ///
    /// Only the fixed layout written by this crate is understood; WAV files
    /// with extra chunks (`LIST`, `fact`, …) go through the decoder instead.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        if &bytes[0..4] != b"RIFF"
            || &bytes[8..12] != b"WAVE"
            || &bytes[12..16] != b"fmt "
            || &bytes[36..40] != b"data"
        {
            return None;
        }

        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);

        Some(Self {
            chunk_size: u32_at(4),
            fmt_chunk_size: u32_at(16),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_header_is_44_bytes_and_parses_back() {
        let header = WavHeader::pcm16(2, 16_000, 400);
        let mut out = Vec::new();
        header.write_to(&mut out);
        assert_eq!(out.len(), HEADER_LEN);
        assert_eq!(WavHeader::parse(&out), Some(header));
    }

    #[test]
    fn derived_fields() {
        let h = WavHeader::pcm16(2, 16_000, 400);
        assert_eq!(h.chunk_size, 436);
        assert_eq!(h.byte_rate, 64_000);
        assert_eq!(h.block_align, 4);
        assert_eq!(h.bits_per_sample, 16);
        assert_eq!(h.audio_format, 1);
        assert_eq!(h.fmt_chunk_size, 16);
    }

    #[test]
    fn parse_rejects_short_or_foreign_input() {
        assert_eq!(WavHeader::parse(&[0; 43]), None);

        let mut out = Vec::new();
        WavHeader::pcm16(1, 8_000, 0).write_to(&mut out);
        out[36..40].copy_from_slice(b"LIST");
        assert_eq!(WavHeader::parse(&out), None);
    }
}
