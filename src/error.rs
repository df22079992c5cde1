// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::num::ParseIntError;
use thiserror::Error;

/// The error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "invalid bit length configuration: time({0}) + worker_id({1}) + sequence({2}) must be 63"
    )]
    InvalidBitLength(u8, u8, u8),
    #[error("invalid bit length configuration: `{0}` must be positive")]
    ZeroBitLength(&'static str),
    #[error("provide either a worker_id or a worker_id_resolver, not both")]
    ConflictingWorkerIdSource,
    #[error("no worker_id or worker_id_resolver was provided")]
    MissingWorkerIdSource,
    #[error("worker_id {worker_id} is out of range 0..={max_worker_id}")]
    WorkerIdOutOfRange { worker_id: i64, max_worker_id: u64 },
    #[error("environment variable `{0}` is not set")]
    WorkerIdEnvMissing(String),
    #[error("environment variable `{var}` must be an integer, got {value:?}")]
    WorkerIdEnvInvalid {
        var: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("environment variable `{var}` is not valid unicode, got {value:?}")]
    WorkerIdEnvNotUnicode { var: String, value: String },
    #[error("could not determine the local hostname: {0}")]
    HostnameUnavailable(#[source] std::io::Error),
    #[error("unknown clock rollback policy {0:?}, expected \"raise\" or \"wait\"")]
    InvalidRollbackPolicy(String),
    #[error("clock moved backwards: now={now}ms < last={last}ms")]
    ClockMovedBackwards { now: i64, last: i64 },
    #[error("timestamp earlier than epoch: now={now}ms, epoch={epoch}ms")]
    BeforeEpoch { now: i64, epoch: i64 },
    #[error("over the time limit: {elapsed}ms since epoch exceeds the timestamp field maximum {max}")]
    OverTimeLimit { elapsed: i64, max: u64 },
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
}

impl Error {
    /// Whether this error can only be raised while building a generator.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidBitLength(..)
                | Error::ZeroBitLength(_)
                | Error::ConflictingWorkerIdSource
                | Error::MissingWorkerIdSource
                | Error::WorkerIdOutOfRange { .. }
                | Error::WorkerIdEnvMissing(_)
                | Error::WorkerIdEnvInvalid { .. }
                | Error::WorkerIdEnvNotUnicode { .. }
                | Error::HostnameUnavailable(_)
                | Error::InvalidRollbackPolicy(_)
        )
    }

    /// Whether this error was caused by the clock reading, either a rollback
    /// or a reading outside the range the layout can encode.
    pub fn is_clock(&self) -> bool {
        matches!(
            self,
            Error::ClockMovedBackwards { .. } | Error::BeforeEpoch { .. } | Error::OverTimeLimit { .. }
        )
    }
}
