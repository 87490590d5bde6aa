//! Representative coordinate selection
mod aggregate;

pub use aggregate::{estimate, weight, AggregateEstimate, CEP_FLOOR};

use hifitime::Epoch;
use log::{debug, warn};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    errors::Error,
    sample::PositionSample,
    station::{Registry, StationCode, StationReference},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean Earth radius (m)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Origin of the representative (scalar) coordinate.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, EnumIter, EnumString, AsRefStr, Display,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AggregationMode {
    /// Legacy behavior: weighted centroid of the current request.
    /// Drifts from one run to another and is kept for comparison only.
    PerRunAverage,
    /// Curated [StationReference] from the [Registry].
    #[default]
    StableReference,
}

/// Coordinate written as the station location.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Representative {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// [AggregationMode] that produced this coordinate
    pub mode: AggregationMode,
    /// Registry entry, in [AggregationMode::StableReference] only
    pub reference: Option<StationReference>,
}

impl Representative {
    /// Great circle distance (m) between this coordinate and the centroid
    /// of the current request.
    pub fn drift_from(&self, aggregate: &AggregateEstimate) -> f64 {
        let (phi_1, phi_2) = (self.latitude.to_radians(), aggregate.latitude.to_radians());
        let d_phi = phi_2 - phi_1;
        let d_lambda = (aggregate.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Provenance tag written in output files.
    pub fn provenance(&self) -> String {
        match &self.reference {
            Some(reference) => format!("{}: {}", self.mode, reference.provenance()),
            None => format!("{}: inverse-CEP weighted centroid of this request", self.mode),
        }
    }
}

/// [Estimator] selects the representative coordinate of a station
/// following the selected [AggregationMode].
#[derive(Debug, Copy, Clone)]
pub struct Estimator<'a> {
    registry: &'a Registry,
    mode: AggregationMode,
    epoch: Epoch,
}

impl<'a> Estimator<'a> {
    /// Builds a new [Estimator] in [AggregationMode::StableReference],
    /// selecting the [StationReference] active at `epoch`.
    pub fn new(registry: &'a Registry, epoch: Epoch) -> Self {
        Self {
            registry,
            mode: AggregationMode::default(),
            epoch,
        }
    }

    /// Copies and returns [Estimator] with desired [AggregationMode].
    pub fn with_mode(&self, mode: AggregationMode) -> Self {
        let mut s = *self;
        s.mode = mode;
        s
    }

    /// Returns the selected [AggregationMode].
    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Reduces this batch and selects the representative coordinate.
    ///
    /// The batch is always reduced, so an empty batch is rejected with
    /// [Error::NoSamples] in every mode. In [AggregationMode::StableReference]
    /// the coordinate depends on the [Registry] and the reference epoch only.
    pub fn representative(
        &self,
        station: StationCode,
        samples: &[PositionSample],
    ) -> Result<(AggregateEstimate, Representative), Error> {
        let aggregate = estimate(samples)?;

        debug!(
            "{} - {} samples: centroid ({:.6}, {:.6}), cep [{}, {}] m",
            station,
            aggregate.sample_count,
            aggregate.latitude,
            aggregate.longitude,
            aggregate.min_cep,
            aggregate.max_cep,
        );

        let representative = match self.mode {
            AggregationMode::StableReference => {
                let reference = self.registry.lookup_at(station, self.epoch)?;
                Representative {
                    latitude: reference.latitude,
                    longitude: crate::sample::normalize_longitude(reference.longitude),
                    mode: self.mode,
                    reference: Some(reference),
                }
            },
            AggregationMode::PerRunAverage => {
                warn!(
                    "{} - legacy {} mode: coordinate will vary between requests",
                    station, self.mode
                );
                Representative {
                    latitude: aggregate.latitude,
                    longitude: aggregate.longitude,
                    mode: self.mode,
                    reference: None,
                }
            },
        };

        debug!(
            "{} - representative ({:.6}, {:.6}), {:.3} m from centroid",
            station,
            representative.latitude,
            representative.longitude,
            representative.drift_from(&aggregate)
        );

        Ok((aggregate, representative))
    }
}
