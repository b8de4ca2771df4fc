use log::{debug, info, warn};

/// Where the payload state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Looking for the two-byte marker; `armed` once the first byte was seen
    Searching { armed: bool },
    /// Collecting tone-data blocks
    Reading,
    /// Payload budget consumed; further bytes are ignored
    Terminal,
}

/// Diagnostic side channel of a decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Header does not describe 16-bit stereo PCM; decoding went ahead anyway
    UnexpectedFormat { reason: String },
    /// Stream marker found after `bytes_before` framed bytes
    MarkerFound { bytes_before: usize },
    ChecksumMatched { block: usize, checksum: u8 },
    /// Block kept despite the mismatch
    ChecksumMismatch { block: usize, computed: u8, received: u8 },
    /// Payload budget reached
    PayloadComplete { payload_bytes: usize },
    /// Input ended with a partly filled block, which was dropped
    IncompleteBlock { bytes: usize },
}

/// Sum of the block bytes modulo 256
pub fn block_checksum(block: &[u8]) -> u8 {
    block.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Payload framing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLayout {
    pub marker: [u8; 2],
    pub block_size: usize,
    pub payload_budget: usize,
}

impl Default for PayloadLayout {
    fn default() -> Self {
        Self {
            marker: crate::STREAM_MARKER,
            block_size: crate::TONE_BLOCK_SIZE,
            payload_budget: crate::PAYLOAD_BUDGET,
        }
    }
}

/// Output of a finished [`PayloadAssembler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPayload {
    pub message: String,
    pub payload_bytes: usize,
    pub events: Vec<DecodeEvent>,
}

/// Turns framed bytes into the text message
///
/// Searching -> (marker) -> Reading -> (budget reached) -> Terminal
pub struct PayloadAssembler {
    layout: PayloadLayout,
    state: StreamState,
    block: Vec<u8>,
    blocks_read: usize,
    bytes_seen: usize,
    payload_bytes: usize,
    message: String,
    events: Vec<DecodeEvent>,
}

impl PayloadAssembler {
    pub fn new(layout: PayloadLayout) -> Self {
        Self {
            layout,
            state: StreamState::Searching { armed: false },
            block: Vec::with_capacity(layout.block_size),
            blocks_read: 0,
            bytes_seen: 0,
            payload_bytes: 0,
            message: String::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state == StreamState::Terminal
    }

    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record a diagnostic that did not come from byte framing
    pub fn note(&mut self, event: DecodeEvent) {
        self.events.push(event);
    }

    pub fn push_byte(&mut self, byte: u8) {
        match self.state {
            StreamState::Searching { armed } => self.search_marker(armed, byte),
            StreamState::Reading => self.read_payload(byte),
            StreamState::Terminal => {}
        }
        self.bytes_seen += 1;
    }

    fn search_marker(&mut self, armed: bool, byte: u8) {
        let [first, second] = self.layout.marker;
        if armed && byte == second {
            debug!("Stream marker found after {} bytes", self.bytes_seen);
            self.events.push(DecodeEvent::MarkerFound {
                bytes_before: self.bytes_seen.saturating_sub(1),
            });
            self.state = StreamState::Reading;
        } else {
            self.state = StreamState::Searching { armed: byte == first };
        }
    }

    fn read_payload(&mut self, byte: u8) {
        if self.block.len() < self.layout.block_size {
            self.block.push(byte);
            return;
        }

        // the byte after a full block is its checksum
        let block = self.blocks_read;
        let computed = block_checksum(&self.block);
        if computed == byte {
            debug!("Block {} checksum ok ({})", block, computed);
            self.events.push(DecodeEvent::ChecksumMatched { block, checksum: computed });
        } else {
            warn!(
                "Block {} checksum mismatch: computed {}, received {}",
                block, computed, byte
            );
            self.events.push(DecodeEvent::ChecksumMismatch {
                block,
                computed,
                received: byte,
            });
        }

        self.message.extend(self.block.drain(..).map(char::from));
        self.blocks_read += 1;
        self.payload_bytes += self.layout.block_size + 1;

        if self.payload_bytes >= self.layout.payload_budget {
            info!("Payload complete: {} bytes in {} blocks", self.payload_bytes, self.blocks_read);
            self.events.push(DecodeEvent::PayloadComplete {
                payload_bytes: self.payload_bytes,
            });
            self.state = StreamState::Terminal;
        }
    }

    pub fn finish(mut self) -> AssembledPayload {
        if self.state == StreamState::Reading && !self.block.is_empty() {
            debug!("Dropping incomplete block of {} bytes", self.block.len());
            self.events.push(DecodeEvent::IncompleteBlock {
                bytes: self.block.len(),
            });
        }
        AssembledPayload {
            message: self.message,
            payload_bytes: self.payload_bytes,
            events: self.events,
        }
    }
}
