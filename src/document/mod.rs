//! Self-describing output file
mod formatting;
mod parsing;

use itertools::Itertools;

use crate::{
    errors::Error,
    estimator::Representative,
    metadata::AttributeSet,
    sample::PositionSample,
};

/// Time dimension and time coordinate variable
pub const TIME: &str = "time";
/// Per sample latitude variable
pub const LATITUDE: &str = "latitude";
/// Per sample longitude variable
pub const LONGITUDE: &str = "longitude";
/// Per sample circular error probable variable
pub const CEP: &str = "cep";
/// Scalar station latitude variable
pub const LAT: &str = "lat";
/// Scalar station longitude variable
pub const LON: &str = "lon";

/// Every variable of an [OutputDocument]
pub const VARIABLES: [&str; 6] = [TIME, LATITUDE, LONGITUDE, CEP, LAT, LON];

/// Units of the time coordinate
pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00 UTC";

/// [OutputDocument] is the in-memory image of one file:
/// the time series, the station coordinate and all attributes.
/// It is fully validated at construction, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    samples: Vec<PositionSample>,
    latitude: f64,
    longitude: f64,
    attributes: AttributeSet,
}

impl OutputDocument {
    /// Builds a new [OutputDocument].
    /// Fails with [Error::Encoding] when a value does not fit its variable,
    /// or [Error::IncompleteMetadata] when attributes are missing.
    pub fn new(
        samples: Vec<PositionSample>,
        representative: &Representative,
        attributes: AttributeSet,
    ) -> Result<Self, Error> {
        Self::from_parts(
            samples,
            representative.latitude,
            representative.longitude,
            attributes,
        )
    }

    pub(crate) fn from_parts(
        samples: Vec<PositionSample>,
        latitude: f64,
        longitude: f64,
        attributes: AttributeSet,
    ) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::Encoding("empty time series".to_string()));
        }

        for (i, sample) in samples.iter().enumerate() {
            check_latitude(&format!("{}[{}]", LATITUDE, i), sample.latitude)?;
            check_longitude(&format!("{}[{}]", LONGITUDE, i), sample.longitude)?;

            if !sample.cep.is_finite() || sample.cep < 0.0 {
                return Err(Error::Encoding(format!(
                    "{}[{}] = {} is not a valid radius",
                    CEP, i, sample.cep
                )));
            }

            if !sample.epoch.to_unix_seconds().is_finite() {
                return Err(Error::Encoding(format!("{}[{}] is not finite", TIME, i)));
            }
        }

        if let Some((i, _)) = samples
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b.epoch < a.epoch)
        {
            return Err(Error::Encoding(format!(
                "{}[{}] precedes {}[{}]: samples must be chronological",
                TIME,
                i + 1,
                TIME,
                i
            )));
        }

        check_latitude(LAT, latitude)?;
        check_longitude(LON, longitude)?;

        attributes.validate(&VARIABLES)?;

        Ok(Self {
            samples,
            latitude,
            longitude,
            attributes,
        })
    }

    /// Size of the time dimension
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Time series
    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    /// Station coordinate (latitude, longitude) in decimal degrees
    pub fn coordinate(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// All attributes
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }
}

fn check_latitude(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Encoding(format!(
            "{} = {} is outside [-90, 90]",
            name, value
        )))
    }
}

fn check_longitude(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Encoding(format!(
            "{} = {} is outside [-180, 180]",
            name, value
        )))
    }
}

#[cfg(test)]
mod test {
    use super::{OutputDocument, CEP};
    use crate::{
        errors::Error,
        prelude::{
            AggregationMode, Epoch, Estimator, MetadataContext, PositionSample, Registry,
            Representative, Resolver, StationCode,
        },
    };

    fn inputs() -> (Vec<PositionSample>, Representative, crate::metadata::AttributeSet) {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2023, 9, 1);
        let samples = (0..3)
            .map(|i| {
                PositionSample::new(t0 + (i as f64) * hifitime::Unit::Hour, 77.5, 14.4, 1.0)
                    .unwrap()
            })
            .collect::<Vec<_>>();

        let (aggregate, representative) = Estimator::new(Registry::builtin().unwrap(), t0)
            .with_mode(AggregationMode::StableReference)
            .representative(StationCode::Spice38, &samples)
            .unwrap();

        let ctx = MetadataContext::new(
            StationCode::Spice38,
            aggregate,
            representative,
            &samples,
            t0,
        )
        .unwrap();

        let attributes = Resolver::default().resolve(&ctx).unwrap();
        (samples, representative, attributes)
    }

    #[test]
    fn valid_document() {
        let (samples, representative, attributes) = inputs();
        let doc = OutputDocument::new(samples, &representative, attributes).unwrap();
        assert_eq!(doc.sample_count(), 3);
        assert_eq!(doc.coordinate(), (77.51715, 14.39992));
    }

    #[test]
    fn encoding_errors() {
        let (samples, representative, attributes) = inputs();

        let mut invalid = samples.clone();
        invalid[1].latitude = 95.0;
        assert!(matches!(
            OutputDocument::new(invalid, &representative, attributes.clone()),
            Err(Error::Encoding(_))
        ));

        let mut invalid = samples.clone();
        invalid[2].cep = f64::NAN;
        assert!(matches!(
            OutputDocument::new(invalid, &representative, attributes.clone()),
            Err(Error::Encoding(_))
        ));

        let mut invalid = samples.clone();
        invalid.swap(0, 2);
        assert!(matches!(
            OutputDocument::new(invalid, &representative, attributes.clone()),
            Err(Error::Encoding(_))
        ));

        let mut off_range = representative;
        off_range.longitude = 200.0;
        assert!(matches!(
            OutputDocument::new(samples.clone(), &off_range, attributes.clone()),
            Err(Error::Encoding(_))
        ));

        assert!(matches!(
            OutputDocument::new(vec![], &representative, attributes.clone()),
            Err(Error::Encoding(_))
        ));

        let mut incomplete = attributes;
        incomplete.variables.remove(CEP);
        assert!(matches!(
            OutputDocument::new(samples, &representative, incomplete),
            Err(Error::IncompleteMetadata(_))
        ));
    }
}
