//! SPICE stations and their reference coordinates
mod registry;

pub use registry::Registry;

use hifitime::Epoch;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::errors::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported station codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StationCode {
    #[strum(serialize = "SPICE34")]
    Spice34,
    #[strum(serialize = "SPICE35")]
    Spice35,
    #[strum(serialize = "SPICE36")]
    Spice36,
    #[strum(serialize = "SPICE37")]
    Spice37,
    #[strum(serialize = "SPICE38")]
    Spice38,
}

impl std::str::FromStr for StationCode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::iter()
            .find(|code| code.as_ref().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::UnknownStation(s.to_string()))
    }
}

/// How a [StationReference] was established.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, AsRefStr, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferenceSource {
    /// Field survey of the antenna position
    #[default]
    #[strum(serialize = "survey")]
    Survey,
    /// Long term average, frozen by an operator
    #[strum(serialize = "derived-average")]
    DerivedAverage,
}

/// Administratively curated coordinate of a station.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationReference {
    /// Station this reference applies to
    pub station: StationCode,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Instant from which this reference is active
    pub effective_since: Epoch,
    /// Provenance
    pub source: ReferenceSource,
}

impl StationReference {
    /// Builds a surveyed [StationReference].
    pub fn surveyed(station: StationCode, latitude: f64, longitude: f64, since: Epoch) -> Self {
        Self {
            station,
            latitude,
            longitude,
            effective_since: since,
            source: ReferenceSource::Survey,
        }
    }

    /// Copies and returns [StationReference] with desired [ReferenceSource].
    pub fn with_source(&self, source: ReferenceSource) -> Self {
        let mut s = *self;
        s.source = source;
        s
    }

    /// Provenance tag written in output files,
    /// for example `survey since 2021-06-01T00:00:00Z`.
    pub fn provenance(&self) -> String {
        format!(
            "{} since {}",
            self.source,
            crate::sample::format_utc(self.effective_since)
        )
    }
}
