use hifitime::Epoch;
use strum_macros::Display;
use thiserror::Error;

use crate::station::StationCode;

/// Errors fatal to one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown station \"{0}\"")]
    UnknownStation(String),
    #[error("station {0} has no active reference coordinate")]
    NoReference(StationCode),
    #[error("invalid time range: start {start} is not before end {end}")]
    InvalidRange { start: Epoch, end: Epoch },
    #[error("invalid timestamp \"{0}\", expecting YYYY-MM-DDTHH:MM:SSZ")]
    TimestampFormat(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("no samples to aggregate")]
    NoSamples,
    #[error("longitudes of the {0} samples cancel out, no mean longitude")]
    IndeterminateLongitude(usize),
    #[error("incomplete metadata: {0}")]
    IncompleteMetadata(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("write error: {0}")]
    Write(String),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl Error {
    /// Process exit status reported by the command line tool.
    /// Each error kind has its own non-zero code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownStation(_) => 3,
            Self::InvalidRange { .. } | Self::TimestampFormat(_) => 4,
            Self::Network(_) => 5,
            Self::Auth(_) => 6,
            Self::NoSamples => 7,
            Self::IncompleteMetadata(_) => 8,
            Self::Encoding(_) => 9,
            Self::Write(_) => 10,
            Self::NoReference(_) => 11,
            Self::Registry(_) => 12,
            Self::IndeterminateLongitude(_) => 13,
        }
    }
}

/// Failures surfaced by a [crate::sample::SampleSource].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("access denied: {0}")]
    Auth(String),
    #[error("upstream rejected time range {start} - {end}")]
    InvalidRange { start: Epoch, end: Epoch },
    #[error("upstream does not know station \"{0}\"")]
    UnknownStation(String),
    #[error("malformed upstream data: {0}")]
    Malformed(String),
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Network(msg) => Self::Network(msg),
            FetchError::Auth(msg) => Self::Auth(msg),
            FetchError::InvalidRange { start, end } => Self::InvalidRange { start, end },
            FetchError::UnknownStation(station) => Self::UnknownStation(station),
            FetchError::Malformed(msg) => Self::Encoding(msg),
        }
    }
}

/// [crate::station::Registry] construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("station {station} has two references effective since {since}")]
    DuplicateReference { station: StationCode, since: Epoch },
    #[error("reference for {0} lies outside valid coordinate range")]
    InvalidCoordinates(StationCode),
}

/// Pipeline stage that failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Validate,
    Lookup,
    Fetch,
    Estimate,
    Metadata,
    Encode,
    Write,
}

/// [Error] with enough context to diagnose without re-running.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{station} [{start} - {end}] {stage} stage failed: {error}")]
pub struct PipelineError {
    /// Stage that failed
    pub stage: Stage,
    /// Requested station
    pub station: StationCode,
    /// Requested window start
    pub start: Epoch,
    /// Requested window end
    pub end: Epoch,
    /// Root cause
    #[source]
    pub error: Error,
}

impl PipelineError {
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}
