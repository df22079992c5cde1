use crate::error::Error;
use blake2::{digest::consts::U8, Blake2b, Digest};
use std::env::{self, VarError};

/// BLAKE2b with an 8-byte digest.
type Blake2b64 = Blake2b<U8>;

/// Environment variable read by [`WorkerIdResolver::from_env`].
pub const DEFAULT_WORKER_ID_ENV: &str = "WORKER_ID";

/// Strategy used to pick this instance's worker id.
///
/// Uniqueness across a fleet depends on every running generator holding a
/// distinct worker id. Assigning them is up to the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerIdResolver {
    /// A fixed, caller-provided value.
    Static(i64),
    /// A base-10 integer read from the named environment variable.
    Env { var: String },
    /// Hash of the local hostname and a salt, reduced into range.
    ///
    /// Two hosts whose `hostname|salt` hashes land in the same bucket get the
    /// same worker id and may emit colliding IDs. Nothing detects this at
    /// runtime; use [`WorkerIdResolver::Env`] or [`WorkerIdResolver::Static`]
    /// where uniqueness must be guaranteed.
    Hash { salt: String },
}

impl WorkerIdResolver {
    /// Read the worker id from `WORKER_ID`.
    pub fn from_env() -> Self {
        Self::from_env_var(DEFAULT_WORKER_ID_ENV)
    }

    /// Read the worker id from the named environment variable.
    pub fn from_env_var(var: impl Into<String>) -> Self {
        WorkerIdResolver::Env { var: var.into() }
    }

    /// Use `WORKER_ID` when it is set, otherwise hash the hostname with `salt`.
    ///
    /// Meant for local and development runs that should work without extra
    /// setup. Deployments should set `WORKER_ID` explicitly.
    pub fn from_env_or_hashed(salt: impl Into<String>) -> Self {
        if env::var_os(DEFAULT_WORKER_ID_ENV).is_some() {
            Self::from_env()
        } else {
            Self::hashed_with_salt(salt)
        }
    }

    /// Hash the hostname without a salt.
    pub fn hashed() -> Self {
        Self::hashed_with_salt("")
    }

    /// Hash the hostname together with `salt`.
    pub fn hashed_with_salt(salt: impl Into<String>) -> Self {
        WorkerIdResolver::Hash { salt: salt.into() }
    }

    /// Produce a worker id in `0..=max_worker_id`.
    pub fn resolve(&self, max_worker_id: u64) -> Result<u64, Error> {
        match self {
            WorkerIdResolver::Static(worker_id) => check_range(*worker_id, max_worker_id),
            WorkerIdResolver::Env { var } => {
                let value = env::var(var).map_err(|err| match err {
                    VarError::NotPresent => Error::WorkerIdEnvMissing(var.clone()),
                    VarError::NotUnicode(value) => Error::WorkerIdEnvNotUnicode {
                        var: var.clone(),
                        value: value.to_string_lossy().into_owned(),
                    },
                })?;
                let worker_id = value
                    .parse::<i64>()
                    .map_err(|source| Error::WorkerIdEnvInvalid {
                        var: var.clone(),
                        value: value.clone(),
                        source,
                    })?;
                check_range(worker_id, max_worker_id)
            }
            WorkerIdResolver::Hash { salt } => {
                let host = hostname()?;
                let worker_id = resolve_hash_for_host(&host, salt, max_worker_id);
                tracing::warn!(
                    %host,
                    worker_id,
                    "worker id derived from a hostname hash; distinct hosts may share a worker id"
                );
                Ok(worker_id)
            }
        }
    }
}

/// Map `host|salt` to a worker id: 8-byte BLAKE2b digest read big-endian,
/// modulo `max_worker_id + 1`.
pub fn resolve_hash_for_host(host: &str, salt: &str, max_worker_id: u64) -> u64 {
    let mut hasher = Blake2b64::new();
    hasher.update(host.as_bytes());
    hasher.update(b"|");
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest);
    let n = u64::from_be_bytes(head);
    match max_worker_id.checked_add(1) {
        Some(buckets) => n % buckets,
        None => n,
    }
}

fn check_range(worker_id: i64, max_worker_id: u64) -> Result<u64, Error> {
    match u64::try_from(worker_id) {
        Ok(id) if id <= max_worker_id => Ok(id),
        _ => Err(Error::WorkerIdOutOfRange {
            worker_id,
            max_worker_id,
        }),
    }
}

#[cfg(unix)]
fn hostname() -> Result<String, Error> {
    let name = nix::unistd::gethostname()
        .map_err(|errno| Error::HostnameUnavailable(std::io::Error::from(errno)))?;
    Ok(name.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn hostname() -> Result<String, Error> {
    env::var("COMPUTERNAME")
        .or_else(|_| env::var("HOSTNAME"))
        .map_err(|_| {
            Error::HostnameUnavailable(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "neither COMPUTERNAME nor HOSTNAME is set",
            ))
        })
}
