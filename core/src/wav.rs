use crate::error::{AfskError, Result, StreamSection};
use crate::WAV_HEADER_SIZE;
use std::fmt;
use std::io::{ErrorKind, Read};

/// Four-character chunk tag such as `RIFF` or `data`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Canonical 44-byte RIFF/WAVE header
///
/// Fields are taken at fixed offsets; nothing is validated at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_id: FourCc,
    pub chunk_size: u32,
    pub format: FourCc,
    pub subchunk1_id: FourCc,
    pub subchunk1_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub subchunk2_id: FourCc,
    pub subchunk2_size: u32,
}

/// Little-endian cursor over the fixed header buffer
struct HeaderCursor<'a> {
    bytes: &'a [u8; WAV_HEADER_SIZE],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn tag(&mut self) -> FourCc {
        FourCc(self.take::<4>())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take::<4>())
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take::<2>())
    }
}

impl WavHeader {
    pub fn parse(bytes: &[u8; WAV_HEADER_SIZE]) -> Self {
        let mut cur = HeaderCursor { bytes, pos: 0 };
        Self {
            chunk_id: cur.tag(),
            chunk_size: cur.u32(),
            format: cur.tag(),
            subchunk1_id: cur.tag(),
            subchunk1_size: cur.u32(),
            audio_format: cur.u16(),
            num_channels: cur.u16(),
            sample_rate: cur.u32(),
            byte_rate: cur.u32(),
            block_align: cur.u16(),
            bits_per_sample: cur.u16(),
            subchunk2_id: cur.tag(),
            subchunk2_size: cur.u32(),
        }
    }

    /// Read exactly [`WAV_HEADER_SIZE`] bytes and parse them
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; WAV_HEADER_SIZE];
        read_section(reader, &mut buf, StreamSection::Header)?;
        Ok(Self::parse(&buf))
    }

    /// Serialize back into the 44-byte layout
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut out = [0u8; WAV_HEADER_SIZE];
        out[0..4].copy_from_slice(self.chunk_id.as_bytes());
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(self.format.as_bytes());
        out[12..16].copy_from_slice(self.subchunk1_id.as_bytes());
        out[16..20].copy_from_slice(&self.subchunk1_size.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(self.subchunk2_id.as_bytes());
        out[40..44].copy_from_slice(&self.subchunk2_size.to_le_bytes());
        out
    }

    /// Header for a canonical 16-bit stereo PCM file with `data_len` payload bytes
    pub fn pcm_stereo16(sample_rate: u32, data_len: u32) -> Self {
        Self {
            chunk_id: FourCc(*b"RIFF"),
            chunk_size: data_len.saturating_add(36),
            format: FourCc(*b"WAVE"),
            subchunk1_id: FourCc(*b"fmt "),
            subchunk1_size: 16,
            audio_format: 1,
            num_channels: 2,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(4),
            block_align: 4,
            bits_per_sample: 16,
            subchunk2_id: FourCc(*b"data"),
            subchunk2_size: data_len,
        }
    }

    /// Check the header describes the only layout the demodulator understands
    pub fn check_pcm_stereo16(&self) -> Result<()> {
        if self.chunk_id.as_bytes() != b"RIFF" || self.format.as_bytes() != b"WAVE" {
            return Err(AfskError::UnsupportedFormat(format!(
                "expected RIFF/WAVE, found {}/{}",
                self.chunk_id, self.format
            )));
        }
        if self.audio_format != 1 {
            return Err(AfskError::UnsupportedFormat(format!(
                "audio format {} is not PCM",
                self.audio_format
            )));
        }
        if self.num_channels != 2 || self.bits_per_sample != 16 {
            return Err(AfskError::UnsupportedFormat(format!(
                "{} channels at {} bits, expected 2 channels at 16 bits",
                self.num_channels, self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Payload duration in seconds, 0.0 when the byte rate is unusable
    pub fn duration_secs(&self) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        self.subchunk2_size as f64 / self.byte_rate as f64
    }
}

/// Parsed header together with its raw PCM payload
#[derive(Debug, Clone)]
pub struct WavData {
    pub header: WavHeader,
    pub payload: Vec<u8>,
}

impl WavData {
    /// Read the header, then exactly `subchunk2_size` payload bytes
    ///
    /// The reader is consumed so it is dropped on every return path.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let header = WavHeader::read_from(&mut reader)?;
        let expected = header.subchunk2_size as usize;

        // grow with the data actually present rather than the declared size
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(expected as u64)
            .read_to_end(&mut payload)?;
        if payload.len() < expected {
            return Err(AfskError::TruncatedStream {
                section: StreamSection::Payload,
                expected,
                actual: payload.len(),
            });
        }
        Ok(Self { header, payload })
    }

    /// Interleaved payload as signed 16-bit samples
    pub fn samples(&self) -> Vec<i16> {
        pcm16_le_samples(&self.payload)
    }
}

/// Decode little-endian 16-bit PCM; a trailing odd byte is ignored
pub fn pcm16_le_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Fill `buf` completely or report how far the stream got
fn read_section<R: Read>(reader: &mut R, buf: &mut [u8], section: StreamSection) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(AfskError::TruncatedStream {
                    section,
                    expected: buf.len(),
                    actual: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
