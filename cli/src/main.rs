use afskwav_core::{AfskDecoder, DecodeEvent, Decoded, DecoderConfig, WavHeader};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "afskwav")]
#[command(about = "Decode AFSK text messages from 16-bit stereo WAV recordings")]
struct Cli {
    /// Log decoder diagnostics (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a WAV file to text
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Write the message here instead of stdout
        #[arg(short, long, value_name = "OUTPUT.TXT")]
        output: Option<PathBuf>,

        /// Reject files that are not RIFF/WAVE 16-bit stereo PCM
        #[arg(long)]
        strict: bool,

        /// Print message, statistics and diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Nominal "1" half-wave duration in microseconds
        #[arg(long, default_value = "320")]
        one_signal_us: f64,

        /// Run-length tolerance in samples
        #[arg(long, default_value = "1")]
        tolerance: u32,
    },

    /// Print the WAV header fields
    Info {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonReport<'a> {
    message: &'a str,
    payload_bytes: usize,
    min_one_run: usize,
    min_zero_run: usize,
    mono_samples: usize,
    samples_scanned: usize,
    bits: usize,
    dropped_runs: usize,
    frames_accepted: usize,
    frames_rejected: usize,
    checksum_mismatches: usize,
    events: Vec<JsonEvent>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonEvent {
    UnexpectedFormat { reason: String },
    MarkerFound { bytes_before: usize },
    ChecksumMatched { block: usize, checksum: u8 },
    ChecksumMismatch { block: usize, computed: u8, received: u8 },
    PayloadComplete { payload_bytes: usize },
    IncompleteBlock { bytes: usize },
}

impl From<&DecodeEvent> for JsonEvent {
    fn from(event: &DecodeEvent) -> Self {
        match event.clone() {
            DecodeEvent::UnexpectedFormat { reason } => JsonEvent::UnexpectedFormat { reason },
            DecodeEvent::MarkerFound { bytes_before } => JsonEvent::MarkerFound { bytes_before },
            DecodeEvent::ChecksumMatched { block, checksum } => {
                JsonEvent::ChecksumMatched { block, checksum }
            }
            DecodeEvent::ChecksumMismatch { block, computed, received } => {
                JsonEvent::ChecksumMismatch { block, computed, received }
            }
            DecodeEvent::PayloadComplete { payload_bytes } => {
                JsonEvent::PayloadComplete { payload_bytes }
            }
            DecodeEvent::IncompleteBlock { bytes } => JsonEvent::IncompleteBlock { bytes },
        }
    }
}

impl<'a> From<&'a Decoded> for JsonReport<'a> {
    fn from(decoded: &'a Decoded) -> Self {
        Self {
            message: &decoded.message,
            payload_bytes: decoded.payload_bytes,
            min_one_run: decoded.thresholds.min_one_run,
            min_zero_run: decoded.thresholds.min_zero_run,
            mono_samples: decoded.stats.mono_samples,
            samples_scanned: decoded.stats.samples_scanned,
            bits: decoded.stats.bits,
            dropped_runs: decoded.stats.dropped_runs,
            frames_accepted: decoded.stats.frames_accepted,
            frames_rejected: decoded.stats.frames_rejected,
            checksum_mismatches: decoded.checksum_mismatches(),
            events: decoded.events.iter().map(JsonEvent::from).collect(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Decode {
            input,
            output,
            strict,
            json,
            one_signal_us,
            tolerance,
        } => {
            let config = DecoderConfig {
                one_signal_secs: one_signal_us / 1_000_000.0,
                tolerance,
                strict_format: strict,
                ..DecoderConfig::default()
            };
            decode_command(&input, output.as_deref(), config, json)?
        }
        Commands::Info { input } => info_command(&input)?,
    }

    Ok(())
}

fn decode_command(
    input_path: &Path,
    output_path: Option<&Path>,
    config: DecoderConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = AfskDecoder::new(config)?;
    let decoded = decoder.decode_file(input_path)?;
    log::info!(
        "Decoded {} payload bytes from {}",
        decoded.payload_bytes,
        input_path.display()
    );

    if !decoded.marker_found() {
        log::warn!("No stream marker found in {}", input_path.display());
    }

    let rendered = if json {
        serde_json::to_string_pretty(&JsonReport::from(&decoded))?
    } else {
        decoded.message.clone()
    };

    match output_path {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("Wrote {} characters to {}", rendered.chars().count(), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn info_command(input_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let header = WavHeader::read_from(&mut BufReader::new(file))?;

    println!("chunk_id:        {}", header.chunk_id);
    println!("chunk_size:      {}", header.chunk_size);
    println!("format:          {}", header.format);
    println!("subchunk1_id:    {}", header.subchunk1_id);
    println!("subchunk1_size:  {}", header.subchunk1_size);
    println!("audio_format:    {}", header.audio_format);
    println!("num_channels:    {}", header.num_channels);
    println!("sample_rate:     {}", header.sample_rate);
    println!("byte_rate:       {}", header.byte_rate);
    println!("block_align:     {}", header.block_align);
    println!("bits_per_sample: {}", header.bits_per_sample);
    println!("subchunk2_id:    {}", header.subchunk2_id);
    println!("subchunk2_size:  {}", header.subchunk2_size);
    println!("duration:        {:.3} s", header.duration_secs());

    if let Err(e) = header.check_pcm_stereo16() {
        println!("warning:         {}", e);
    }

    Ok(())
}
