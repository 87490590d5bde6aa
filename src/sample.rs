//! Raw position samples and the upstream source contract
use hifitime::Epoch;
use scan_fmt::scan_fmt;

use crate::{
    errors::{Error, FetchError},
    station::StationCode,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normalizes a longitude in decimal degrees to [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to the modulus for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Parses a strict `YYYY-MM-DDTHH:MM:SSZ` UTC timestamp.
pub fn parse_utc(s: &str) -> Result<Epoch, Error> {
    let trimmed = s.trim();

    if trimmed.len() != 20 || !trimmed.ends_with('Z') {
        return Err(Error::TimestampFormat(s.to_string()));
    }

    let (y, m, d, hh, mm, ss) = scan_fmt!(
        trimmed,
        "{d}-{d}-{d}T{d}:{d}:{d}Z",
        i32,
        u8,
        u8,
        u8,
        u8,
        u8
    );

    match (y, m, d, hh, mm, ss) {
        (Some(y), Some(m), Some(d), Some(hh), Some(mm), Some(ss)) => {
            let valid = (1..=12).contains(&m)
                && (1..=31).contains(&d)
                && hh < 24
                && mm < 60
                && ss < 60;
            if !valid {
                return Err(Error::TimestampFormat(s.to_string()));
            }
            Epoch::maybe_from_gregorian_utc(y, m, d, hh, mm, ss, 0)
                .map_err(|_| Error::TimestampFormat(s.to_string()))
        },
        _ => Err(Error::TimestampFormat(s.to_string())),
    }
}

/// Formats an [Epoch] as `YYYY-MM-DDTHH:MM:SSZ` (UTC, second precision).
pub fn format_utc(t: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = t.to_gregorian_utc();
    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z", y, m, d, hh, mm, ss)
}

/// One raw position fix reported by the upstream positioning service.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionSample {
    /// Instant of this fix
    pub epoch: Epoch,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180)
    pub longitude: f64,
    /// Circular error probable (m)
    pub cep: f64,
}

impl PositionSample {
    /// Builds a new [PositionSample] after basic well-formedness checks.
    /// Longitudes expressed within [0, 360] are accepted and normalized.
    pub fn new(epoch: Epoch, latitude: f64, longitude: f64, cep: f64) -> Result<Self, Error> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::Encoding(format!(
                "{}: latitude {} outside [-90, 90]",
                epoch, latitude
            )));
        }

        if !longitude.is_finite() || !(-180.0..=360.0).contains(&longitude) {
            return Err(Error::Encoding(format!(
                "{}: longitude {} outside [-180, 360]",
                epoch, longitude
            )));
        }

        if !cep.is_finite() || cep < 0.0 {
            return Err(Error::Encoding(format!(
                "{}: invalid circular error probable {}",
                epoch, cep
            )));
        }

        Ok(Self {
            epoch,
            latitude,
            longitude: normalize_longitude(longitude),
            cep,
        })
    }
}

/// UTC time window of a request.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeWindow {
    /// Start (inclusive)
    pub start: Epoch,
    /// End
    pub end: Epoch,
}

impl TimeWindow {
    /// Builds a new [TimeWindow]; start must strictly precede end.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, Error> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(Error::InvalidRange { start, end })
        }
    }

    /// Builds a new [TimeWindow] from two `YYYY-MM-DDTHH:MM:SSZ` timestamps.
    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        Self::new(parse_utc(start)?, parse_utc(end)?)
    }

    /// True if `t` lies within this window.
    pub fn contains(&self, t: Epoch) -> bool {
        t >= self.start && t <= self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} - {}", format_utc(self.start), format_utc(self.end))
    }
}

/// Upstream provider of [PositionSample]s.
///
/// Implementations return samples in chronological order. An empty
/// series is a valid answer; the estimator rejects it downstream.
/// Network timeouts are bounded by the implementation and surface
/// as [FetchError::Network]. Nothing is retried by the caller.
pub trait SampleSource {
    fn fetch(
        &self,
        station: StationCode,
        window: &TimeWindow,
    ) -> Result<Vec<PositionSample>, FetchError>;
}

impl<T: SampleSource + ?Sized> SampleSource for &T {
    fn fetch(
        &self,
        station: StationCode,
        window: &TimeWindow,
    ) -> Result<Vec<PositionSample>, FetchError> {
        (**self).fetch(station, window)
    }
}

#[cfg(test)]
mod test {
    use super::{format_utc, normalize_longitude, parse_utc, PositionSample, TimeWindow};
    use crate::{errors::Error, prelude::Epoch};

    #[test]
    fn longitude_normalization() {
        for (lon, expected) in [
            (0.0, 0.0),
            (15.5, 15.5),
            (-179.9, -179.9),
            (180.0, -180.0),
            (359.0, -1.0),
            (360.0, 0.0),
            (190.0, -170.0),
        ] {
            let normalized = normalize_longitude(lon);
            assert!(
                (normalized - expected).abs() < 1.0e-9,
                "{} normalized to {}",
                lon,
                normalized
            );
        }
    }

    #[test]
    fn timestamp_parsing() {
        let t = parse_utc("2023-09-01T00:00:00Z").unwrap();
        assert_eq!(t, Epoch::from_gregorian_utc_at_midnight(2023, 9, 1));

        let t = parse_utc("2023-09-02T12:34:56Z").unwrap();
        assert_eq!(t, Epoch::from_gregorian_utc_hms(2023, 9, 2, 12, 34, 56));
        assert_eq!(format_utc(t), "2023-09-02T12:34:56Z");

        for invalid in [
            "2023-09-01",
            "2023-09-01T00:00:00",
            "2023-13-01T00:00:00Z",
            "2023-09-01T25:00:00Z",
            "yesterday",
        ] {
            assert_eq!(
                parse_utc(invalid),
                Err(Error::TimestampFormat(invalid.to_string())),
                "accepted \"{}\"",
                invalid
            );
        }
    }

    #[test]
    fn time_window() {
        let window = TimeWindow::parse("2023-09-01T00:00:00Z", "2023-09-02T00:00:00Z").unwrap();
        assert!(window.contains(Epoch::from_gregorian_utc_hms(2023, 9, 1, 12, 0, 0)));
        assert!(!window.contains(Epoch::from_gregorian_utc_hms(2023, 9, 2, 12, 0, 0)));
        assert_eq!(
            window.to_string(),
            "2023-09-01T00:00:00Z - 2023-09-02T00:00:00Z"
        );

        let t = Epoch::from_gregorian_utc_at_midnight(2023, 9, 1);
        assert_eq!(
            TimeWindow::new(t, t),
            Err(Error::InvalidRange { start: t, end: t })
        );
        assert!(TimeWindow::parse("2023-09-02T00:00:00Z", "2023-09-01T00:00:00Z").is_err());
    }

    #[test]
    fn sample_checks() {
        let t = Epoch::from_gregorian_utc_at_midnight(2023, 9, 1);

        let sample = PositionSample::new(t, 77.5, 194.4, 2.0).unwrap();
        assert!((sample.longitude - (-165.6)).abs() < 1.0e-9);

        assert!(PositionSample::new(t, 91.0, 0.0, 1.0).is_err());
        assert!(PositionSample::new(t, f64::NAN, 0.0, 1.0).is_err());
        assert!(PositionSample::new(t, 0.0, -181.0, 1.0).is_err());
        assert!(PositionSample::new(t, 0.0, 0.0, -1.0).is_err());
        assert!(PositionSample::new(t, 0.0, 0.0, 0.0).is_ok());
    }
}
