//! AFSK text decoder for 16-bit stereo PCM WAV recordings
//!
//! Pipeline: 44-byte WAV header + PCM payload -> mono downmix -> sign-run
//! bit slicing -> 11-bit byte frames -> marker sync -> 30+1 byte checksummed
//! blocks -> ASCII text.

pub mod error;
pub mod wav;
pub mod mono;
pub mod signal;
pub mod framing;
pub mod stream;
pub mod decoder;

pub use decoder::{decoded_message_or_failure, AfskDecoder, DecodeStats, Decoded, DecoderConfig};
pub use error::{AfskError, Result, StreamSection};
pub use stream::{DecodeEvent, StreamState};
pub use wav::{FourCc, WavData, WavHeader};

// WAV container
pub const WAV_HEADER_SIZE: usize = 44;

// Bit timing
pub const ONE_SIGNAL_SECS: f64 = 0.000320; // nominal duration of a "1" half-wave
pub const RUN_LENGTH_TOLERANCE: u32 = 1; // samples; real waveforms are not ideal rectangles

// Byte framing: start bit + 8 data bits + 2 stop bits
pub const FRAME_BITS: usize = 11;
pub const START_BIT_POSITION: usize = 0;
pub const DATA_BITS: std::ops::RangeInclusive<usize> = 1..=7; // bit 8 is on the wire but never read
pub const FIRST_STOP_BIT_POSITION: usize = 9;
pub const SECOND_STOP_BIT_POSITION: usize = 10;

// Payload framing
pub const STREAM_MARKER: [u8; 2] = [0x42, 0x03];
pub const TONE_BLOCK_SIZE: usize = 30;
pub const PAYLOAD_BUDGET: usize = 1984; // 64 blocks of 30 data bytes + 1 checksum byte

/// Returned by [`decoded_message_or_failure`] when the stream cannot be read
pub const FAILURE_MESSAGE: &str = "Something went wrong: the audio stream could not be decoded";
