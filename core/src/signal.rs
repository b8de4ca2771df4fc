use crate::FRAME_BITS;

/// Sign of a single mono sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Positive,
    Negative,
    Zero,
}

impl SignalState {
    pub fn of(sample: i16) -> Self {
        match sample {
            s if s > 0 => SignalState::Positive,
            s if s < 0 => SignalState::Negative,
            _ => SignalState::Zero,
        }
    }
}

/// Minimum same-sign run lengths (in samples) for each bit value
///
/// A "1" is one nominal half-wave long, a "0" is two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunThresholds {
    pub min_one_run: usize,
    pub min_zero_run: usize,
}

impl RunThresholds {
    pub fn new(sample_rate: u32, one_signal_secs: f64, tolerance: u32) -> Self {
        let nominal = sample_rate as f64 * one_signal_secs;
        let tolerance = tolerance as f64;
        Self {
            min_one_run: (nominal - tolerance).max(0.0) as usize,
            min_zero_run: (nominal * 2.0 - tolerance).max(0.0) as usize,
        }
    }

    /// `Some(bit)` for a classifiable run, `None` when it is too short
    pub fn classify(&self, run_len: usize) -> Option<bool> {
        if run_len >= self.min_zero_run {
            Some(false)
        } else if run_len >= self.min_one_run {
            Some(true)
        } else {
            None
        }
    }
}

/// What closing a run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// First run of the signal; only establishes the starting state
    Seed,
    /// Run shorter than the "1" threshold
    Dropped { run_len: usize },
    Bit(bool),
}

/// Walks mono samples and turns same-sign runs into bits
#[derive(Debug, Clone)]
pub struct RunSlicer {
    thresholds: RunThresholds,
    state: Option<SignalState>,
    run_len: usize,
    seeded: bool,
}

impl RunSlicer {
    pub fn new(thresholds: RunThresholds) -> Self {
        Self {
            thresholds,
            state: None,
            run_len: 0,
            seeded: false,
        }
    }

    /// Feed one sample; returns an outcome whenever a run closes
    pub fn push(&mut self, sample: i16) -> Option<RunOutcome> {
        let next = SignalState::of(sample);
        let current = match self.state {
            // leading silence is not a signal yet
            None if next == SignalState::Zero => return None,
            None => {
                self.state = Some(next);
                self.run_len = 1;
                return None;
            }
            Some(current) => current,
        };

        if current == next {
            self.run_len += 1;
            return None;
        }

        let closed_len = self.run_len;
        let was_seeded = self.seeded;
        if next == SignalState::Zero {
            // silence drops back to "no signal yet"; the next run seeds again
            self.state = None;
            self.run_len = 0;
            self.seeded = false;
        } else {
            self.state = Some(next);
            self.run_len = 1;
            self.seeded = true;
        }

        if !was_seeded {
            return Some(RunOutcome::Seed);
        }

        Some(match self.thresholds.classify(closed_len) {
            Some(bit) => RunOutcome::Bit(bit),
            None => RunOutcome::Dropped { run_len: closed_len },
        })
    }
}

/// Collects bits until a full 11-bit frame is available
#[derive(Debug, Clone, Default)]
pub struct BitAccumulator {
    bits: [bool; FRAME_BITS],
    len: usize,
}

impl BitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a bit; the completed frame is handed out and the buffer cleared
    pub fn push(&mut self, bit: bool) -> Option<[bool; FRAME_BITS]> {
        self.bits[self.len] = bit;
        self.len += 1;
        if self.len < FRAME_BITS {
            return None;
        }
        let frame = self.bits;
        self.clear();
        Some(frame)
    }

    pub fn clear(&mut self) {
        self.bits = [false; FRAME_BITS];
        self.len = 0;
    }
}
