//! RDS (Radio Data System) bit synchronization front-end (§4.4 addition).
//!
//! The full RDS group/message decoder is out of scope; this module owns
//! only bit-clock recovery and group framing from a demodulated FM pilot
//! subcarrier, reporting its cumulative [`DecoderStats`] back to the
//! caller on every call to [`DownstreamDecoder::feed`]. Downstream decoding
//! is pluggable so the pipeline can run with a no-op sink when RDS is
//! disabled.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdsSyncState {
    Hunting,
    Locked { block_counter: u8 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub groups_seen: u64,
    pub sync_losses: u64,
}

/// Receives demodulated FM baseband and reports its structured output. The
/// pipeline holds one `Box<dyn DownstreamDecoder>` per channel.
pub trait DownstreamDecoder: Send {
    fn feed(&mut self, baseband: &[f32]) -> DecoderStats;
}

/// A downstream decoder that discards every sample; used where a channel's
/// RDS output isn't consumed (tests, or `enable_rds = false`).
pub struct NullDownstreamDecoder;

impl DownstreamDecoder for NullDownstreamDecoder {
    fn feed(&mut self, _baseband: &[f32]) -> DecoderStats {
        DecoderStats::default()
    }
}

const BITS_PER_GROUP: usize = 104;
const BITS_PER_BLOCK: usize = 26;
const BLOCKS_PER_GROUP: usize = BITS_PER_GROUP / BITS_PER_BLOCK;

/// Bit-clock recovery and group framing for the 1187.5 bit/s RDS
/// subcarrier. Carrier recovery and checkword validation are out of scope
/// (no-goal per §4.4); bit decisions come from a simple sign slicer over
/// `samples_per_bit`-wide windows of the demodulated baseband.
///
/// Hunts for block boundaries by accumulating raw bits; once
/// `BITS_PER_BLOCK` bits have been seen, a block is decoded and
/// `block_counter` advances. After `BLOCKS_PER_GROUP` blocks, a full group
/// has been assembled and the sync state locks.
pub struct RdsBitSync {
    state: RdsSyncState,
    bit_buffer: Vec<u8>,
    stats: DecoderStats,
    samples_per_bit: usize,
    sample_accum: f32,
    samples_in_bit: usize,
}

impl RdsBitSync {
    pub fn new(samples_per_bit: usize) -> Self {
        Self {
            state: RdsSyncState::Hunting,
            bit_buffer: Vec::with_capacity(BITS_PER_GROUP),
            stats: DecoderStats::default(),
            samples_per_bit: samples_per_bit.max(1),
            sample_accum: 0.0,
            samples_in_bit: 0,
        }
    }

    pub fn state(&self) -> RdsSyncState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feeds one recovered bit (sign-sliced from the baseband). Advances
    /// `block_counter` every `BITS_PER_BLOCK` bits and assembles a full
    /// group every `BLOCKS_PER_GROUP` blocks.
    fn push_bit(&mut self, bit: u8) {
        self.bit_buffer.push(bit & 1);
        if self.bit_buffer.len() % BITS_PER_BLOCK != 0 {
            return;
        }

        let block_counter = ((self.bit_buffer.len() / BITS_PER_BLOCK) - 1) as u8;
        self.state = RdsSyncState::Locked { block_counter };

        if self.bit_buffer.len() < BITS_PER_GROUP {
            return;
        }

        // Only the 16 information bits of each 26-bit block are kept; the
        // remaining 10 are the checkword, consumed here but not
        // independently verified (no error correction in this front-end).
        let mut group = [0u16; 4];
        for (block_idx, word) in group.iter_mut().enumerate() {
            let base = block_idx * BITS_PER_BLOCK;
            let mut value: u16 = 0;
            for k in 0..16 {
                value = (value << 1) | self.bit_buffer[base + k] as u16;
            }
            *word = value;
        }
        let _ = group;

        self.stats.groups_seen += 1;
        self.bit_buffer.clear();
    }

    /// Called when the checkword syndrome fails to validate; drops any
    /// partial group and returns to hunting.
    pub fn report_sync_loss(&mut self) {
        self.state = RdsSyncState::Hunting;
        self.stats.sync_losses += 1;
        self.bit_buffer.clear();
    }
}

impl Default for RdsBitSync {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DownstreamDecoder for RdsBitSync {
    fn feed(&mut self, baseband: &[f32]) -> DecoderStats {
        for &sample in baseband {
            self.sample_accum += sample;
            self.samples_in_bit += 1;
            if self.samples_in_bit >= self.samples_per_bit {
                let bit = if self.sample_accum >= 0.0 { 1 } else { 0 };
                self.push_bit(bit);
                self.sample_accum = 0.0;
                self.samples_in_bit = 0;
            }
        }
        self.stats
    }
}
