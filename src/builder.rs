use crate::clock::{Clock, SystemClock, DEFAULT_EPOCH_MS};
use crate::error::Error;
use crate::layout::SnowflakeLayout;
use crate::snowflake::{ClockRollbackPolicy, Internals, SharedSnowflake, Snowflake};
use crate::worker::WorkerIdResolver;
use chrono::prelude::*;
use std::sync::{Arc, Mutex};

/// A builder for building the ['Snowflake'] generator.
///
/// Every configuration problem is reported by [`Builder::finalize`]; a
/// generator that was built successfully only fails on clock problems.
///
/// [`Snowflake`]: struct.Snowflake.html
pub struct Builder {
    worker_id: Option<i64>,
    worker_id_resolver: Option<WorkerIdResolver>,
    epoch_ms: i64,
    clock: Option<Arc<dyn Clock>>,
    rollback_policy: ClockRollbackPolicy,
    bit_len_time: u8,
    bit_len_worker_id: u8,
    bit_len_sequence: u8,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Construct a new builder for the build of ['Snowflake'].
    ///
    /// [`Snowflake`]: struct.Snowflake.html
    pub fn new() -> Self {
        let layout = SnowflakeLayout::default();
        Self {
            worker_id: None,
            worker_id_resolver: None,
            epoch_ms: DEFAULT_EPOCH_MS,
            clock: None,
            rollback_policy: ClockRollbackPolicy::default(),
            bit_len_time: layout.timestamp_bits(),
            bit_len_worker_id: layout.worker_id_bits(),
            bit_len_sequence: layout.sequence_bits(),
        }
    }

    /// Set the worker ID directly.
    /// Cannot be combined with [`Builder::worker_id_resolver`].
    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Set the strategy that resolves the worker ID during `finalize`.
    /// Cannot be combined with [`Builder::worker_id`].
    pub fn worker_id_resolver(mut self, resolver: WorkerIdResolver) -> Self {
        self.worker_id_resolver = Some(resolver);
        self
    }

    /// Set the epoch in milliseconds since the Unix epoch.
    pub fn epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    /// Set the epoch.
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch_ms = epoch.timestamp_millis();
        self
    }

    /// Set all three bit lengths from a layout.
    pub fn layout(mut self, layout: SnowflakeLayout) -> Self {
        self.bit_len_time = layout.timestamp_bits();
        self.bit_len_worker_id = layout.worker_id_bits();
        self.bit_len_sequence = layout.sequence_bits();
        self
    }

    /// Set the bit length of the timestamp section.
    pub fn bit_len_time(mut self, bit_len_time: u8) -> Self {
        self.bit_len_time = bit_len_time;
        self
    }

    /// Set the bit length of the worker ID section.
    pub fn bit_len_worker_id(mut self, bit_len_worker_id: u8) -> Self {
        self.bit_len_worker_id = bit_len_worker_id;
        self
    }

    /// Set the bit length of the sequence section.
    pub fn bit_len_sequence(mut self, bit_len_sequence: u8) -> Self {
        self.bit_len_sequence = bit_len_sequence;
        self
    }

    /// Replace the system clock, e.g. with a simulated one in tests.
    pub fn clock_source(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Set what happens when the clock moves backwards. Defaults to
    /// [`ClockRollbackPolicy::Raise`].
    pub fn rollback_policy(mut self, rollback_policy: ClockRollbackPolicy) -> Self {
        self.rollback_policy = rollback_policy;
        self
    }

    /// Finish building and create a Snowflake instance.
    /// This method will return an error if the layout is invalid, if not exactly
    /// one worker ID source was given, or if the worker ID cannot be resolved.
    pub fn finalize(self) -> Result<Snowflake, Error> {
        let layout =
            SnowflakeLayout::new(self.bit_len_time, self.bit_len_worker_id, self.bit_len_sequence)?;

        let resolver = match (self.worker_id, self.worker_id_resolver) {
            (Some(_), Some(_)) => return Err(Error::ConflictingWorkerIdSource),
            (None, None) => return Err(Error::MissingWorkerIdSource),
            (Some(worker_id), None) => WorkerIdResolver::Static(worker_id),
            (None, Some(resolver)) => resolver,
        };
        let worker_id = resolver.resolve(layout.max_worker_id())?;

        tracing::debug!(
            worker_id,
            epoch_ms = self.epoch_ms,
            timestamp_bits = layout.timestamp_bits(),
            worker_id_bits = layout.worker_id_bits(),
            sequence_bits = layout.sequence_bits(),
            rollback_policy = %self.rollback_policy,
            "snowflake generator ready"
        );

        let shared = Arc::new(SharedSnowflake {
            epoch_ms: self.epoch_ms,
            worker_id,
            layout,
            rollback_policy: self.rollback_policy,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            internals: Mutex::new(Internals::default()),
        });
        Ok(Snowflake::new_inner(shared))
    }
}
