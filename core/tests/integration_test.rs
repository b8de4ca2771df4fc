use afskwav_core::framing::encode_frame;
use afskwav_core::stream::block_checksum;
use afskwav_core::{
    decoded_message_or_failure, AfskDecoder, AfskError, DecodeEvent, DecoderConfig,
    StreamSection, WavHeader, FAILURE_MESSAGE, ONE_SIGNAL_SECS, PAYLOAD_BUDGET, STREAM_MARKER,
    TONE_BLOCK_SIZE,
};
use rand::Rng;
use std::io::Cursor;

/// Route decoder diagnostics to the test output (`RUST_LOG=debug` to see them)
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test-only AFSK synthesizer: one same-sign half-wave per bit
struct Synth {
    sample_rate: u32,
    one_len: usize,
    mono: Vec<i16>,
    level: i16,
}

impl Synth {
    fn new(sample_rate: u32) -> Self {
        init_logging();
        let one_len = (sample_rate as f64 * ONE_SIGNAL_SECS).round() as usize;
        let mut synth = Self {
            sample_rate,
            one_len,
            mono: vec![0; 100],
            level: 9000,
        };
        // carrier before the first bit; only seeds the slicer
        synth.run(40);
        synth
    }

    fn run(&mut self, len: usize) {
        self.mono.extend(std::iter::repeat(self.level).take(len));
        self.level = -self.level;
    }

    /// Dead air followed by a fresh carrier run, as after a transmitter pause
    fn pause(&mut self, len: usize) {
        self.mono.extend(std::iter::repeat(0).take(len));
        self.run(40);
    }

    fn bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            let len = if bit { self.one_len } else { self.one_len * 2 };
            self.run(len);
        }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.bits(&encode_frame(byte));
        }
    }

    fn block(&mut self, block: &[u8]) {
        self.bytes(block);
        self.bytes(&[block_checksum(block)]);
    }

    /// Close the last bit run and render a stereo WAV file
    fn into_wav(mut self) -> Vec<u8> {
        self.run(40);
        let mut rng = rand::thread_rng();
        let mut payload = Vec::with_capacity(self.mono.len() * 4);
        for &m in &self.mono {
            // channels differ in amplitude but never in sign
            let (l, r) = match m {
                0 => (0i16, 0i16),
                m => {
                    let a = rng.gen_range(500..=m.unsigned_abs() as i16);
                    let b = rng.gen_range(500..=m.unsigned_abs() as i16);
                    (a * m.signum(), b * m.signum())
                }
            };
            payload.extend_from_slice(&l.to_le_bytes());
            payload.extend_from_slice(&r.to_le_bytes());
        }
        let header = WavHeader::pcm_stereo16(self.sample_rate, payload.len() as u32);
        let mut wav = header.to_bytes().to_vec();
        wav.extend_from_slice(&payload);
        wav
    }
}

fn hello_block() -> Vec<u8> {
    let mut block = b"HELLO, AFSK WORLD".to_vec();
    block.resize(TONE_BLOCK_SIZE, b' ');
    block
}

#[test]
fn test_decode_hello_block() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.block(&hello_block());
    let wav = synth.into_wav();

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(wav))
        .expect("Failed to decode");

    assert_eq!(decoded.message, "HELLO, AFSK WORLD             ");
    assert_eq!(decoded.payload_bytes, 31);
    assert_eq!(decoded.checksum_mismatches(), 0);
    assert!(decoded.marker_found());
}

#[test]
fn test_host_contract_returns_message() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.block(&hello_block());

    let message = decoded_message_or_failure(Cursor::new(synth.into_wav()));
    assert_eq!(message.as_bytes(), hello_block().as_slice());
}

#[test]
fn test_decode_at_other_sample_rates() {
    for rate in [8_000, 22_050, 48_000] {
        let mut synth = Synth::new(rate);
        synth.bytes(&STREAM_MARKER);
        synth.block(&hello_block());

        let decoded = AfskDecoder::default()
            .decode_reader(Cursor::new(synth.into_wav()))
            .expect("Failed to decode");
        assert_eq!(
            decoded.message.as_bytes(),
            hello_block().as_slice(),
            "round trip failed at {} Hz",
            rate
        );
    }
}

#[test]
fn test_noise_before_marker_is_skipped() {
    let mut synth = Synth::new(44_100);
    // an all-ones frame has a bad start bit
    synth.bits(&[true; 11]);
    synth.bytes(b"\x42junk\x03");
    synth.bytes(&STREAM_MARKER);
    synth.block(&hello_block());

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message.as_bytes(), hello_block().as_slice());
    assert_eq!(decoded.stats.frames_rejected, 1);
    assert!(decoded
        .events
        .contains(&DecodeEvent::MarkerFound { bytes_before: 6 }));
}

#[test]
fn test_short_glitches_are_ignored() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    for (i, &byte) in hello_block().iter().enumerate() {
        synth.bytes(&[byte]);
        if i % 5 == 0 {
            synth.run(3);
        }
    }
    synth.bytes(&[block_checksum(&hello_block())]);

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message.as_bytes(), hello_block().as_slice());
    assert_eq!(decoded.stats.dropped_runs, 6);
}

#[test]
fn test_pause_between_frames_adds_no_bits() {
    let block = hello_block();
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.bytes(&block[..12]);
    synth.pause(200);
    synth.bytes(&block[12..]);
    synth.bytes(&[block_checksum(&block)]);

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message.as_bytes(), block.as_slice());
    assert_eq!(decoded.stats.frames_rejected, 0);
    assert_eq!(decoded.stats.bits, 33 * 11);
    assert_eq!(decoded.checksum_mismatches(), 0);
}

#[test]
fn test_checksum_mismatch_is_not_fatal() {
    let block = hello_block();
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.bytes(&block);
    synth.bytes(&[block_checksum(&block).wrapping_add(1)]);

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message.as_bytes(), block.as_slice());
    assert_eq!(decoded.payload_bytes, 31);
    assert_eq!(decoded.checksum_mismatches(), 1);
}

#[test]
fn test_full_payload_then_stop() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);

    let blocks = PAYLOAD_BUDGET / (TONE_BLOCK_SIZE + 1);
    let mut expected = String::new();
    for i in 0..blocks {
        let text = format!("block {:02} of a longer message", i);
        let mut block = text.into_bytes();
        block.resize(TONE_BLOCK_SIZE, b' ');
        expected.push_str(std::str::from_utf8(&block).unwrap());
        synth.block(&block);
    }
    // past the budget; never decoded
    synth.block(&[b'!'; TONE_BLOCK_SIZE]);

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message, expected);
    assert_eq!(decoded.payload_bytes, PAYLOAD_BUDGET);
    assert_eq!(
        decoded.events.last(),
        Some(&DecodeEvent::PayloadComplete { payload_bytes: PAYLOAD_BUDGET })
    );
}

#[test]
fn test_unterminated_message_keeps_complete_blocks() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.block(&hello_block());
    synth.bytes(b"cut off");

    let decoded = AfskDecoder::default()
        .decode_reader(Cursor::new(synth.into_wav()))
        .unwrap();

    assert_eq!(decoded.message.as_bytes(), hello_block().as_slice());
    assert_eq!(decoded.events.last(), Some(&DecodeEvent::IncompleteBlock { bytes: 7 }));
}

#[test]
fn test_truncated_header_fails() {
    init_logging();
    let header = WavHeader::pcm_stereo16(44_100, 0).to_bytes();
    let short = header[..30].to_vec();

    match AfskDecoder::default().decode_reader(Cursor::new(short.clone())) {
        Err(AfskError::TruncatedStream {
            section: StreamSection::Header,
            ..
        }) => {}
        other => panic!("Expected truncated header, got {:?}", other),
    }
    assert_eq!(decoded_message_or_failure(Cursor::new(short)), FAILURE_MESSAGE);
}

#[test]
fn test_truncated_payload_fails() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&STREAM_MARKER);
    synth.block(&hello_block());
    let mut wav = synth.into_wav();
    wav.truncate(wav.len() - 100);

    match AfskDecoder::default().decode_reader(Cursor::new(wav.clone())) {
        Err(AfskError::TruncatedStream {
            section: StreamSection::Payload,
            ..
        }) => {}
        other => panic!("Expected truncated payload, got {:?}", other),
    }
    assert_eq!(decoded_message_or_failure(Cursor::new(wav)), FAILURE_MESSAGE);
}

#[test]
fn test_custom_protocol_parameters() {
    let mut synth = Synth::new(44_100);
    synth.bytes(&[0x7E, 0x11]);
    synth.block(b"decode");

    let decoder = AfskDecoder::new(DecoderConfig {
        marker: [0x7E, 0x11],
        block_size: 6,
        payload_budget: 7,
        ..DecoderConfig::default()
    })
    .unwrap();
    let decoded = decoder.decode_reader(Cursor::new(synth.into_wav())).unwrap();

    assert_eq!(decoded.message, "decode");
    assert_eq!(decoded.checksum_mismatches(), 0);
    assert_eq!(decoded.payload_bytes, 7);
}
