//! Loopback self-test bookkeeping
//!
//! With TX wired to RX, each channel sends a counting pattern
//! (`0, 1, 2, ...`) and expects the same bytes back. The probe only tracks
//! the test; moving bytes is left to the driver's service loop, so a test
//! round spans several service cycles and never blocks.

/// Service cycles to wait for the pattern to come back
pub const DEFAULT_TIMEOUT_CYCLES: u16 = 50;

/// Byte at position `index` of the test pattern
pub const fn pattern_byte(index: usize) -> u8 {
    index as u8
}

/// Result of a finished test round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeOutcome {
    /// Every byte came back in order
    Passed,
    /// A byte differs from the pattern
    Mismatch {
        /// Position of the first wrong byte
        index: u16,
        /// Pattern byte expected there
        expected: u8,
        /// Byte actually received
        received: u8,
    },
    /// The pattern did not come back in time
    TimedOut {
        /// Bytes received before giving up
        received: u16,
    },
}

impl ProbeOutcome {
    /// Check if the round passed
    pub fn passed(&self) -> bool {
        matches!(self, ProbeOutcome::Passed)
    }
}

/// Probe phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbePhase {
    /// Ready to send a new pattern
    #[default]
    Idle,
    /// Pattern queued, waiting for it to come back
    Waiting {
        /// Service cycles elapsed since the pattern was queued
        cycles: u16,
    },
}

/// Per-channel loopback test tracker
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackProbe {
    len: u16,
    timeout: u16,
    phase: ProbePhase,
    passes: u32,
    failures: u32,
}

impl LoopbackProbe {
    /// Create a probe sending `len` bytes per round
    pub fn new(len: u16) -> Self {
        Self {
            len: len.max(1),
            timeout: DEFAULT_TIMEOUT_CYCLES,
            phase: ProbePhase::Idle,
            passes: 0,
            failures: 0,
        }
    }

    /// Pattern length in bytes
    pub fn pattern_len(&self) -> usize {
        self.len as usize
    }

    /// Current phase
    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Rounds that passed
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Rounds that failed or timed out
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Check if a new round can start
    pub fn is_idle(&self) -> bool {
        self.phase == ProbePhase::Idle
    }

    /// Write the pattern into `buf`, returning the number of bytes written
    pub fn fill(&self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.pattern_len());
        for (i, slot) in buf[..count].iter_mut().enumerate() {
            *slot = pattern_byte(i);
        }
        count
    }

    /// Mark the pattern as queued
    pub fn start(&mut self) {
        self.phase = ProbePhase::Waiting { cycles: 0 };
    }

    /// Account for one service cycle with `received` bytes available
    ///
    /// Returns `Some(TimedOut)` once the wait exceeds the timeout; the
    /// probe is then idle again and the caller should drop whatever
    /// partial pattern it holds.
    pub fn tick(&mut self, received: usize) -> Option<ProbeOutcome> {
        let ProbePhase::Waiting { cycles } = self.phase else {
            return None;
        };

        let cycles = cycles.saturating_add(1);
        if cycles > self.timeout {
            self.phase = ProbePhase::Idle;
            self.failures += 1;
            return Some(ProbeOutcome::TimedOut {
                received: received.min(u16::MAX as usize) as u16,
            });
        }

        self.phase = ProbePhase::Waiting { cycles };
        None
    }

    /// Compare a complete round against the pattern and finish it
    pub fn check(&mut self, received: &[u8]) -> ProbeOutcome {
        self.phase = ProbePhase::Idle;

        let expected_len = self.pattern_len();
        let mismatch = received
            .iter()
            .take(expected_len)
            .enumerate()
            .find(|&(i, &byte)| byte != pattern_byte(i));

        let outcome = match mismatch {
            Some((index, &byte)) => ProbeOutcome::Mismatch {
                index: index as u16,
                expected: pattern_byte(index),
                received: byte,
            },
            None if received.len() < expected_len => ProbeOutcome::TimedOut {
                received: received.len() as u16,
            },
            None => ProbeOutcome::Passed,
        };

        if outcome.passed() {
            self.passes += 1;
        } else {
            self.failures += 1;
        }
        outcome
    }
}
