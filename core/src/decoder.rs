use crate::error::{AfskError, Result};
use crate::framing::decode_frame;
use crate::mono::stereo_to_mono;
use crate::signal::{BitAccumulator, RunOutcome, RunSlicer, RunThresholds};
use crate::stream::{DecodeEvent, PayloadAssembler, PayloadLayout};
use crate::wav::WavData;
use crate::{
    FAILURE_MESSAGE, ONE_SIGNAL_SECS, PAYLOAD_BUDGET, RUN_LENGTH_TOLERANCE, STREAM_MARKER,
    TONE_BLOCK_SIZE,
};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Tunable protocol parameters
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Nominal length of a "1" half-wave in seconds
    pub one_signal_secs: f64,
    /// Samples subtracted from each run-length threshold
    pub tolerance: u32,
    pub marker: [u8; 2],
    /// Data bytes per tone-data block (one checksum byte follows each block)
    pub block_size: usize,
    /// Total payload bytes, checksums included, after which decoding stops
    pub payload_budget: usize,
    /// Reject headers that are not RIFF/WAVE 16-bit stereo PCM
    pub strict_format: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            one_signal_secs: ONE_SIGNAL_SECS,
            tolerance: RUN_LENGTH_TOLERANCE,
            marker: STREAM_MARKER,
            block_size: TONE_BLOCK_SIZE,
            payload_budget: PAYLOAD_BUDGET,
            strict_format: false,
        }
    }
}

impl DecoderConfig {
    fn validate(&self) -> Result<()> {
        if !(self.one_signal_secs.is_finite() && self.one_signal_secs > 0.0) {
            return Err(AfskError::InvalidConfig(format!(
                "one_signal_secs must be positive, got {}",
                self.one_signal_secs
            )));
        }
        if self.block_size == 0 {
            return Err(AfskError::InvalidConfig("block_size must be non-zero".into()));
        }
        if self.payload_budget == 0 {
            return Err(AfskError::InvalidConfig("payload_budget must be non-zero".into()));
        }
        Ok(())
    }

    fn layout(&self) -> PayloadLayout {
        PayloadLayout {
            marker: self.marker,
            block_size: self.block_size,
            payload_budget: self.payload_budget,
        }
    }
}

/// Counters collected while walking the samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub mono_samples: usize,
    /// Samples consumed before decoding stopped
    pub samples_scanned: usize,
    pub bits: usize,
    pub dropped_runs: usize,
    pub frames_accepted: usize,
    pub frames_rejected: usize,
}

/// Result of a successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub message: String,
    /// Payload bytes consumed, checksum bytes included
    pub payload_bytes: usize,
    pub thresholds: RunThresholds,
    pub events: Vec<DecodeEvent>,
    pub stats: DecodeStats,
}

impl Decoded {
    pub fn checksum_mismatches(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DecodeEvent::ChecksumMismatch { .. }))
            .count()
    }

    pub fn marker_found(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, DecodeEvent::MarkerFound { .. }))
    }
}

/// AFSK text decoder
///
/// Holds configuration only; every decode call starts from fresh state.
pub struct AfskDecoder {
    config: DecoderConfig,
}

impl AfskDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a mono sample sequence
    ///
    /// Signal, frame and checksum anomalies never fail the call; they show up
    /// in [`Decoded::events`] and [`Decoded::stats`].
    pub fn decode_samples(&self, mono: &[i16], sample_rate: u32) -> Decoded {
        let thresholds =
            RunThresholds::new(sample_rate, self.config.one_signal_secs, self.config.tolerance);
        debug!(
            "Run thresholds at {} Hz: one >= {}, zero >= {}",
            sample_rate, thresholds.min_one_run, thresholds.min_zero_run
        );
        self.decode_with(mono, thresholds, Vec::new())
    }

    fn decode_with(
        &self,
        mono: &[i16],
        thresholds: RunThresholds,
        preamble_events: Vec<DecodeEvent>,
    ) -> Decoded {
        let mut slicer = RunSlicer::new(thresholds);
        let mut accumulator = BitAccumulator::new();
        let mut assembler = PayloadAssembler::new(self.config.layout());
        for event in preamble_events {
            assembler.note(event);
        }

        let mut stats = DecodeStats {
            mono_samples: mono.len(),
            ..DecodeStats::default()
        };

        for &sample in mono {
            if assembler.is_terminal() {
                break;
            }
            stats.samples_scanned += 1;

            let bit = match slicer.push(sample) {
                Some(RunOutcome::Bit(bit)) => bit,
                Some(RunOutcome::Dropped { .. }) => {
                    stats.dropped_runs += 1;
                    continue;
                }
                Some(RunOutcome::Seed) | None => continue,
            };
            stats.bits += 1;

            let Some(frame) = accumulator.push(bit) else {
                continue;
            };
            match decode_frame(&frame) {
                Some(byte) => {
                    stats.frames_accepted += 1;
                    assembler.push_byte(byte);
                }
                None => stats.frames_rejected += 1,
            }
        }

        let payload = assembler.finish();
        info!(
            "Decoded {} characters from {} payload bytes ({} frames accepted, {} rejected)",
            payload.message.len(),
            payload.payload_bytes,
            stats.frames_accepted,
            stats.frames_rejected
        );

        Decoded {
            message: payload.message,
            payload_bytes: payload.payload_bytes,
            thresholds,
            events: payload.events,
            stats,
        }
    }

    /// Decode an already-read WAV container
    pub fn decode_wav(&self, wav: &WavData) -> Result<Decoded> {
        let header = &wav.header;
        let mut events = Vec::new();
        if let Err(e) = header.check_pcm_stereo16() {
            if self.config.strict_format {
                return Err(e);
            }
            warn!("{}; decoding as 16-bit stereo PCM anyway", e);
            events.push(DecodeEvent::UnexpectedFormat {
                reason: e.to_string(),
            });
        }

        let mono = stereo_to_mono(&wav.samples());
        debug!(
            "{} Hz, {} payload bytes -> {} mono samples",
            header.sample_rate,
            wav.payload.len(),
            mono.len()
        );

        let thresholds = RunThresholds::new(
            header.sample_rate,
            self.config.one_signal_secs,
            self.config.tolerance,
        );
        Ok(self.decode_with(&mono, thresholds, events))
    }

    /// Read a WAV stream to its declared payload size and decode it
    pub fn decode_reader<R: Read>(&self, reader: R) -> Result<Decoded> {
        let wav = WavData::read_from(reader)?;
        self.decode_wav(&wav)
    }

    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<Decoded> {
        let file = File::open(path)?;
        self.decode_reader(BufReader::new(file))
    }
}

impl Default for AfskDecoder {
    fn default() -> Self {
        Self {
            config: DecoderConfig::default(),
        }
    }
}

/// Decode with default settings, collapsing every failure into [`FAILURE_MESSAGE`]
pub fn decoded_message_or_failure<R: Read>(reader: R) -> String {
    match AfskDecoder::default().decode_reader(reader) {
        Ok(decoded) => decoded.message,
        Err(e) => {
            warn!("Decode failed: {}", e);
            FAILURE_MESSAGE.to_string()
        }
    }
}
