//! Inverse-uncertainty weighted centroid
use itertools::{Itertools, MinMaxResult};

use crate::{errors::Error, sample::PositionSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest circular error probable (m) taken into account.
/// Prevents unbounded weights on fixes reporting a null CEP.
pub const CEP_FLOOR: f64 = 1.0e-3;

/// Smallest resultant length, relative to the weight sum, for which the
/// circular mean longitude is defined.
const MIN_RESULTANT: f64 = 1.0e-9;

/// Weight of a fix with given circular error probable (m).
pub fn weight(cep: f64) -> f64 {
    1.0 / cep.max(CEP_FLOOR)
}

/// [AggregateEstimate] of one batch of [PositionSample]s.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AggregateEstimate {
    /// Weighted latitude in decimal degrees
    pub latitude: f64,
    /// Weighted (circular) longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
    /// Sum of all weights
    pub weight_sum: f64,
    /// Number of contributing samples
    pub sample_count: usize,
    /// Smallest CEP in the batch (m)
    pub min_cep: f64,
    /// Largest CEP in the batch (m)
    pub max_cep: f64,
}

/// Reduces a batch of [PositionSample]s to their inverse-CEP weighted centroid.
///
/// Latitudes are averaged arithmetically. Longitudes are averaged on the
/// unit circle so fixes on both sides of the antimeridian do not collapse
/// towards Greenwich. Fixes whose longitudes cancel out on the circle
/// have no mean direction and are rejected with [Error::IndeterminateLongitude].
pub fn estimate(samples: &[PositionSample]) -> Result<AggregateEstimate, Error> {
    if samples.is_empty() {
        return Err(Error::NoSamples);
    }

    let (mut weight_sum, mut lat_sum, mut cos_sum, mut sin_sum) = (0.0_f64, 0.0_f64, 0.0, 0.0);

    for sample in samples.iter() {
        let w_i = weight(sample.cep);
        let lon_rad = sample.longitude.to_radians();

        weight_sum += w_i;
        lat_sum += w_i * sample.latitude;
        cos_sum += w_i * lon_rad.cos();
        sin_sum += w_i * lon_rad.sin();
    }

    let latitude = (lat_sum / weight_sum).clamp(-90.0, 90.0);

    let resultant = sin_sum.hypot(cos_sum) / weight_sum;
    if resultant < MIN_RESULTANT {
        return Err(Error::IndeterminateLongitude(samples.len()));
    }

    let longitude = sin_sum.atan2(cos_sum).to_degrees().clamp(-180.0, 180.0);

    let (min_cep, max_cep) = match samples.iter().map(|s| s.cep).minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::OneElement(cep) => (cep, cep),
        MinMaxResult::MinMax(min, max) => (min, max),
        MinMaxResult::NoElements => return Err(Error::NoSamples),
    };

    Ok(AggregateEstimate {
        latitude,
        longitude,
        weight_sum,
        sample_count: samples.len(),
        min_cep,
        max_cep,
    })
}
