use crate::error::Error;

/// Number of usable bits; the sign bit stays clear so IDs fit a positive `i64`.
pub const USABLE_BITS: u8 = 63;

/// Bit layout of a Snowflake ID.
///
/// From the most significant usable bit downwards: timestamp, worker id,
/// sequence. The three widths must add up to [`USABLE_BITS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLayout"))]
pub struct SnowflakeLayout {
    timestamp_bits: u8,
    worker_id_bits: u8,
    sequence_bits: u8,
}

/// Unchecked wire form; deserialization goes through [`SnowflakeLayout::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLayout {
    timestamp_bits: u8,
    worker_id_bits: u8,
    sequence_bits: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLayout> for SnowflakeLayout {
    type Error = Error;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        SnowflakeLayout::new(raw.timestamp_bits, raw.worker_id_bits, raw.sequence_bits)
    }
}

impl Default for SnowflakeLayout {
    /// The classic 41/10/12 split.
    fn default() -> Self {
        Self {
            timestamp_bits: 41,
            worker_id_bits: 10,
            sequence_bits: 12,
        }
    }
}

impl SnowflakeLayout {
    /// Construct a validated layout.
    pub fn new(timestamp_bits: u8, worker_id_bits: u8, sequence_bits: u8) -> Result<Self, Error> {
        let layout = Self {
            timestamp_bits,
            worker_id_bits,
            sequence_bits,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Check the layout invariants: every width positive, 63 bits in total.
    pub fn validate(&self) -> Result<(), Error> {
        if self.timestamp_bits == 0 {
            return Err(Error::ZeroBitLength("timestamp_bits"));
        }
        if self.worker_id_bits == 0 {
            return Err(Error::ZeroBitLength("worker_id_bits"));
        }
        if self.sequence_bits == 0 {
            return Err(Error::ZeroBitLength("sequence_bits"));
        }
        let total = u16::from(self.timestamp_bits)
            + u16::from(self.worker_id_bits)
            + u16::from(self.sequence_bits);
        if total != u16::from(USABLE_BITS) {
            return Err(Error::InvalidBitLength(
                self.timestamp_bits,
                self.worker_id_bits,
                self.sequence_bits,
            ));
        }
        Ok(())
    }

    /// Width of the timestamp field.
    pub fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    /// Width of the worker id field.
    pub fn worker_id_bits(&self) -> u8 {
        self.worker_id_bits
    }

    /// Width of the sequence field.
    pub fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Largest elapsed-milliseconds value the timestamp field holds.
    pub fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    /// `2^worker_id_bits - 1`
    pub fn max_worker_id(&self) -> u64 {
        mask(self.worker_id_bits)
    }

    /// `2^sequence_bits - 1`
    pub fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Offset of the worker id field.
    pub fn worker_shift(&self) -> u32 {
        u32::from(self.sequence_bits)
    }

    /// Offset of the timestamp field.
    pub fn timestamp_shift(&self) -> u32 {
        u32::from(self.sequence_bits) + u32::from(self.worker_id_bits)
    }

    /// Pack the three fields into an ID. Inputs wider than their field are
    /// masked.
    pub fn encode(&self, timestamp: u64, worker_id: u64, sequence: u64) -> u64 {
        (timestamp & self.max_timestamp()) << self.timestamp_shift()
            | (worker_id & self.max_worker_id()) << self.worker_shift()
            | (sequence & self.max_sequence())
    }

    /// Split an ID into `(timestamp, worker_id, sequence)`.
    pub fn split(&self, id: u64) -> (u64, u64, u64) {
        (
            (id >> self.timestamp_shift()) & self.max_timestamp(),
            (id >> self.worker_shift()) & self.max_worker_id(),
            id & self.max_sequence(),
        )
    }
}

fn mask(bits: u8) -> u64 {
    match 1u64.checked_shl(u32::from(bits)) {
        Some(bound) => bound - 1,
        None => u64::MAX,
    }
}
