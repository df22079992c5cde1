use crate::builder::Builder;
use crate::clock::{wait_past, Clock};
use crate::error::*;
use crate::layout::SnowflakeLayout;
use crate::worker::WorkerIdResolver;
use chrono::prelude::*;
use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex},
};

/// What `next_id` does when the clock reads earlier than the last issued ID.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ClockRollbackPolicy {
    /// Fail the call with [`Error::ClockMovedBackwards`].
    #[default]
    Raise,
    /// Spin until the clock passes the last issued timestamp.
    Wait,
}

impl fmt::Display for ClockRollbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockRollbackPolicy::Raise => f.write_str("raise"),
            ClockRollbackPolicy::Wait => f.write_str("wait"),
        }
    }
}

impl FromStr for ClockRollbackPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("raise") {
            Ok(ClockRollbackPolicy::Raise)
        } else if s.eq_ignore_ascii_case("wait") {
            Ok(ClockRollbackPolicy::Wait)
        } else {
            Err(Error::InvalidRollbackPolicy(s.to_owned()))
        }
    }
}

/// Mutable generator state, only touched while the mutex is held.
#[derive(Debug, Default)]
pub(crate) struct Internals {
    /// Clock reading of the last issued ID; `None` until the first one.
    pub(crate) last_timestamp: Option<i64>,
    pub(crate) sequence: u64,
}

/// SharedSnowflake is shared between Snowflake instances.
pub(crate) struct SharedSnowflake {
    pub(crate) epoch_ms: i64,
    pub(crate) worker_id: u64,
    pub(crate) layout: SnowflakeLayout,
    pub(crate) rollback_policy: ClockRollbackPolicy,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) internals: Mutex<Internals>,
}

/// Snowflake is a distributed unique ID generator.
/// It is thread-safe and can be cloned to be used in multiple threads; clones
/// share one sequence and never hand out the same ID.
pub struct Snowflake(pub(crate) Arc<SharedSnowflake>);

impl Snowflake {
    /// Create a new Snowflake whose worker id comes from the `WORKER_ID`
    /// environment variable, with every other option at its default.
    /// For custom configuration see [`builder`].
    ///
    /// [`builder`]: struct.Snowflake.html#method.builder
    pub fn new() -> Result<Self, Error> {
        Builder::new()
            .worker_id_resolver(WorkerIdResolver::from_env())
            .finalize()
    }

    /// Create a new [`Builder`] to construct a Snowflake.
    ///
    /// [`Builder`]: struct.Builder.html
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn new_inner(shared: Arc<SharedSnowflake>) -> Self {
        Self(shared)
    }

    /// Generate the next unique id.
    ///
    /// When the sequence for the current millisecond is used up this spins
    /// until the clock ticks over. A failed call leaves the generator state
    /// untouched.
    pub fn next_id(&self) -> Result<u64, Error> {
        let shared = &*self.0;
        let layout = shared.layout;
        let mut internals = shared.internals.lock().map_err(|_| Error::MutexPoisoned)?;

        let mut now = shared.clock.now_millis();
        let mut sequence = 0;

        if let Some(last) = internals.last_timestamp {
            if now < last {
                tracing::warn!(now, last, policy = %shared.rollback_policy, "clock moved backwards");
                match shared.rollback_policy {
                    ClockRollbackPolicy::Raise => {
                        return Err(Error::ClockMovedBackwards { now, last });
                    }
                    ClockRollbackPolicy::Wait => now = wait_past(shared.clock.as_ref(), last),
                }
            }

            if now == last {
                sequence = (internals.sequence + 1) & layout.max_sequence();
                if sequence == 0 {
                    now = wait_past(shared.clock.as_ref(), last);
                }
            }
        }

        let elapsed = i128::from(now) - i128::from(shared.epoch_ms);
        if elapsed < 0 {
            tracing::error!(now, epoch = shared.epoch_ms, "clock reads earlier than the epoch");
            return Err(Error::BeforeEpoch {
                now,
                epoch: shared.epoch_ms,
            });
        }
        if elapsed > i128::from(layout.max_timestamp()) {
            tracing::error!(
                now,
                epoch = shared.epoch_ms,
                timestamp_bits = layout.timestamp_bits(),
                "timestamp field exhausted"
            );
            return Err(Error::OverTimeLimit {
                elapsed: i64::try_from(elapsed).unwrap_or(i64::MAX),
                max: layout.max_timestamp(),
            });
        }

        internals.last_timestamp = Some(now);
        internals.sequence = sequence;

        Ok(layout.encode(elapsed as u64, shared.worker_id, sequence))
    }

    /// Alias of [`Snowflake::next_id`].
    pub fn generate(&self) -> Result<u64, Error> {
        self.next_id()
    }

    /// Break an ID produced with this generator's layout and epoch into its
    /// parts.
    pub fn decompose(&self, id: u64) -> DecomposedSnowflake {
        DecomposedSnowflake::decompose(id, &self.0.layout, self.0.epoch_ms)
    }

    /// The worker id resolved when the generator was built.
    pub fn worker_id(&self) -> u64 {
        self.0.worker_id
    }

    /// The bit layout IDs are encoded with.
    pub fn layout(&self) -> SnowflakeLayout {
        self.0.layout
    }

    /// The epoch in milliseconds since the Unix epoch.
    pub fn epoch_ms(&self) -> i64 {
        self.0.epoch_ms
    }

    /// What happens when the clock moves backwards.
    pub fn rollback_policy(&self) -> ClockRollbackPolicy {
        self.0.rollback_policy
    }
}

/// Returns a new `Snowflake` referencing the same state as `self`.
impl Clone for Snowflake {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snowflake")
            .field("worker_id", &self.0.worker_id)
            .field("epoch_ms", &self.0.epoch_ms)
            .field("layout", &self.0.layout)
            .field("rollback_policy", &self.0.rollback_policy)
            .finish_non_exhaustive()
    }
}

/// DecomposedSnowflake is the parts of a Snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecomposedSnowflake {
    pub id: u64,
    /// Absolute timestamp in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl DecomposedSnowflake {
    /// Break an ID up into its parts, re-adding `epoch_ms` to the timestamp.
    pub fn decompose(id: u64, layout: &SnowflakeLayout, epoch_ms: i64) -> Self {
        let (elapsed, worker_id, sequence) = layout.split(id);
        Self {
            id,
            // at most 61 bits, always fits
            timestamp_ms: epoch_ms.saturating_add(elapsed as i64),
            worker_id,
            sequence,
        }
    }

    /// The timestamp as a UTC date time, if it is representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }
}
