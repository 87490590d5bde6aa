//! Station reference table
use std::{collections::BTreeMap, sync::OnceLock};

use hifitime::Epoch;
use log::debug;
use strum::IntoEnumIterator;

use crate::{
    errors::{Error, RegistryError},
    station::{StationCode, StationReference},
};

/// Surveyed positions of the SPICE stations.
/// SPICE37 is not set up yet and has no reference.
const SURVEYED_POSITIONS: [(StationCode, f64, f64); 4] = [
    (StationCode::Spice34, 77.08636, 15.62725),
    (StationCode::Spice35, 77.06198, 15.20614),
    (StationCode::Spice36, 78.6765, 12.0399),
    (StationCode::Spice38, 77.51715, 14.39992),
];

static BUILTIN: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();

/// Read-only table of [StationReference]s.
/// Each station may own several references over time;
/// at any instant a single one is active: the most recent one
/// already in effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    /// References per station, sorted by effective date
    references: BTreeMap<StationCode, Vec<StationReference>>,
}

impl Registry {
    /// Builds a new [Registry] from a set of [StationReference]s.
    pub fn new<I: IntoIterator<Item = StationReference>>(
        references: I,
    ) -> Result<Self, RegistryError> {
        let mut table = BTreeMap::<StationCode, Vec<StationReference>>::new();

        for reference in references {
            let valid = reference.latitude.is_finite()
                && reference.longitude.is_finite()
                && (-90.0..=90.0).contains(&reference.latitude)
                && (-180.0..=360.0).contains(&reference.longitude);

            if !valid {
                return Err(RegistryError::InvalidCoordinates(reference.station));
            }

            let entries = table.entry(reference.station).or_default();

            if entries
                .iter()
                .any(|r| r.effective_since == reference.effective_since)
            {
                return Err(RegistryError::DuplicateReference {
                    station: reference.station,
                    since: reference.effective_since,
                });
            }

            entries.push(reference);
        }

        for entries in table.values_mut() {
            entries.sort_by(|a, b| a.effective_since.cmp(&b.effective_since));
        }

        Ok(Self { references: table })
    }

    /// Builds a [Registry] of surveyed positions, all effective since `since`.
    fn surveyed(positions: &[(StationCode, f64, f64)], since: Epoch) -> Result<Self, RegistryError> {
        Self::new(
            positions
                .iter()
                .map(|(station, lat, lon)| StationReference::surveyed(*station, *lat, *lon, since)),
        )
    }

    /// Process-wide [Registry] of surveyed SPICE positions,
    /// built once on first access and never rebuilt.
    /// A table that fails to build is reported as [Error::Registry] on every access.
    pub fn builtin() -> Result<&'static Self, Error> {
        BUILTIN
            .get_or_init(|| {
                debug!("loading builtin station registry");
                Self::surveyed(
                    &SURVEYED_POSITIONS,
                    Epoch::from_gregorian_utc_at_midnight(2021, 6, 1),
                )
            })
            .as_ref()
            .map_err(|e| Error::Registry(e.clone()))
    }

    /// Returns all valid station identifiers.
    pub fn stations(&self) -> impl Iterator<Item = StationCode> {
        StationCode::iter()
    }

    /// Returns the [StationReference] active at `t`: the most recent one
    /// already in effect. References dated after `t` are ignored.
    pub fn lookup_at(&self, station: StationCode, t: Epoch) -> Result<StationReference, Error> {
        self.references
            .get(&station)
            .and_then(|entries| entries.iter().rev().find(|r| r.effective_since <= t))
            .copied()
            .ok_or(Error::NoReference(station))
    }

    /// Returns the [StationReference] active at `t` from a readable station identifier.
    /// Fails with [Error::UnknownStation] when not a supported code.
    pub fn lookup_str(&self, station: &str, t: Epoch) -> Result<StationReference, Error> {
        let code = station.parse::<StationCode>()?;
        self.lookup_at(code, t)
    }
}

#[cfg(test)]
mod test {
    use super::Registry;
    use crate::{
        errors::{Error, RegistryError},
        prelude::{Epoch, ReferenceSource, StationCode, StationReference},
    };

    fn today() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2023, 9, 1)
    }

    #[test]
    fn builtin_registry() {
        let registry = Registry::builtin().unwrap();

        // built once
        assert!(std::ptr::eq(registry, Registry::builtin().unwrap()));

        let spice38 = registry.lookup_at(StationCode::Spice38, today()).unwrap();
        assert_eq!(spice38.latitude, 77.51715);
        assert_eq!(spice38.longitude, 14.39992);
        assert_eq!(spice38.source, ReferenceSource::Survey);

        assert_eq!(registry.stations().count(), 5);

        assert_eq!(
            registry.lookup_at(StationCode::Spice37, today()),
            Err(Error::NoReference(StationCode::Spice37))
        );

        assert_eq!(
            registry.lookup_str("SPICE99", today()),
            Err(Error::UnknownStation("SPICE99".to_string()))
        );

        assert!(registry.lookup_str("SPICE34", today()).is_ok());
    }

    #[test]
    fn invalid_builtin_table() {
        let since = Epoch::from_gregorian_utc_at_midnight(2021, 6, 1);

        let err = Registry::surveyed(
            &[
                (StationCode::Spice34, 77.08636, 15.62725),
                (StationCode::Spice34, 77.0, 15.6),
            ],
            since,
        )
        .unwrap_err();

        let err = Error::from(err);
        assert_eq!(err.exit_code(), 12);
        assert!(matches!(
            err,
            Error::Registry(RegistryError::DuplicateReference { .. })
        ));

        assert!(Registry::surveyed(&[(StationCode::Spice37, -999.0, -999.0)], since).is_err());
    }

    #[test]
    fn versioned_references() {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let t1 = Epoch::from_gregorian_utc_at_midnight(2023, 1, 1);

        let registry = Registry::new([
            StationReference::surveyed(StationCode::Spice35, 77.1, 15.2, t1)
                .with_source(ReferenceSource::DerivedAverage),
            StationReference::surveyed(StationCode::Spice35, 77.0, 15.0, t0),
        ])
        .unwrap();

        let active = registry.lookup_at(StationCode::Spice35, today()).unwrap();
        assert_eq!(active.latitude, 77.1);
        assert_eq!(active.source, ReferenceSource::DerivedAverage);

        let past = registry
            .lookup_at(StationCode::Spice35, Epoch::from_gregorian_utc_at_midnight(2021, 1, 1))
            .unwrap();
        assert_eq!(past.latitude, 77.0);

        assert!(registry
            .lookup_at(StationCode::Spice35, Epoch::from_gregorian_utc_at_midnight(2019, 1, 1))
            .is_err());
    }

    #[test]
    fn future_reference_is_not_active() {
        let registry = Registry::new([
            StationReference::surveyed(
                StationCode::Spice38,
                77.51715,
                14.39992,
                Epoch::from_gregorian_utc_at_midnight(2021, 6, 1),
            ),
            StationReference::surveyed(
                StationCode::Spice38,
                10.0,
                10.0,
                Epoch::from_gregorian_utc_at_midnight(2099, 1, 1),
            ),
        ])
        .unwrap();

        let active = registry.lookup_at(StationCode::Spice38, today()).unwrap();
        assert_eq!(active.latitude, 77.51715);
        assert_eq!(active.longitude, 14.39992);

        let scheduled = registry
            .lookup_at(StationCode::Spice38, Epoch::from_gregorian_utc_at_midnight(2099, 6, 1))
            .unwrap();
        assert_eq!(scheduled.latitude, 10.0);
    }

    #[test]
    fn duplicate_references() {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);

        let err = Registry::new([
            StationReference::surveyed(StationCode::Spice36, 78.0, 12.0, t0),
            StationReference::surveyed(StationCode::Spice36, 78.5, 12.5, t0),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateReference {
                station: StationCode::Spice36,
                since: t0,
            }
        );
    }

    #[test]
    fn invalid_references() {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        assert!(Registry::new([StationReference::surveyed(
            StationCode::Spice37,
            -999.0,
            -999.0,
            t0
        )])
        .is_err());
    }
}
