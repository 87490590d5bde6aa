//! CF / ACDD attribute resolution
mod profile;

pub use profile::MetadataProfile;

use std::collections::BTreeMap;

use hifitime::Epoch;
use log::debug;

use crate::{
    document::{CEP, LAT, LATITUDE, LON, LONGITUDE, TIME, TIME_UNITS},
    errors::Error,
    estimator::{AggregateEstimate, AggregationMode, Representative},
    sample::{format_utc, PositionSample},
    station::StationCode,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Values that denote a missing attribute rather than an actual one.
const PLACEHOLDERS: [&str; 10] = [
    "filler",
    "fill",
    "n/a",
    "na",
    "none",
    "null",
    "todo",
    "tbd",
    "not available",
    "-999",
];

/// Global attributes every file must carry.
pub const REQUIRED_GLOBAL: [&str; 35] = [
    "title",
    "summary",
    "keywords",
    "keywords_vocabulary",
    "Conventions",
    "featureType",
    "station_id",
    "institution",
    "source",
    "history",
    "date_created",
    "creator_type",
    "creator_institution",
    "creator_name",
    "creator_email",
    "creator_url",
    "project",
    "license",
    "iso_topic_category",
    "activity_type",
    "operational_status",
    "geospatial_lat_min",
    "geospatial_lat_max",
    "geospatial_lon_min",
    "geospatial_lon_max",
    "time_coverage_start",
    "time_coverage_end",
    "aggregation_mode",
    "coordinate_provenance",
    "tool_version",
    "sample_count",
    "cep_min",
    "cep_max",
    "weight_sum",
    "aggregate_offset_from_reference_m",
];

/// Attributes every variable must carry.
const REQUIRED_VARIABLE: [&str; 3] = ["long_name", "units", "coverage_content_type"];

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    Text(String),
    Double(f64),
    Int(i32),
}

impl AttributeValue {
    /// True if this value does not carry actual information.
    pub fn is_placeholder(&self) -> bool {
        match self {
            Self::Text(s) => {
                let s = s.trim();
                s.is_empty() || PLACEHOLDERS.iter().any(|p| s.eq_ignore_ascii_case(p))
            },
            Self::Double(v) => !v.is_finite() || *v == -999.0,
            Self::Int(v) => *v == -999,
        }
    }

    /// Returns text content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns numerical content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Double(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

/// Ordered attribute list (insertion order is preserved in the file).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attributes(Vec<(String, AttributeValue)>);

impl Attributes {
    /// Inserts or replaces an attribute.
    pub fn insert<V: Into<AttributeValue>>(&mut self, key: &str, value: V) {
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.0.push((key.to_string(), value));
        }
    }

    /// Copies and returns [Attributes] with one more attribute.
    pub fn with<V: Into<AttributeValue>>(mut self, key: &str, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Verifies all `required` keys exist and nothing is a placeholder.
    fn check(&self, scope: &str, required: &[&str]) -> Result<(), Error> {
        if let Some(missing) = required.iter().find(|key| self.get(key).is_none()) {
            return Err(Error::IncompleteMetadata(format!(
                "{}: missing \"{}\"",
                scope, missing
            )));
        }

        if let Some((key, value)) = self.iter().find(|(_, v)| v.is_placeholder()) {
            return Err(Error::IncompleteMetadata(format!(
                "{}: \"{}\" has no actual value (\"{}\")",
                scope, key, value
            )));
        }

        Ok(())
    }
}

/// Complete attribute set of one file.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeSet {
    /// Global attributes
    pub global: Attributes,
    /// Attributes per variable name
    pub variables: BTreeMap<String, Attributes>,
}

impl AttributeSet {
    /// Returns [Attributes] of given variable.
    pub fn variable(&self, name: &str) -> Option<&Attributes> {
        self.variables.get(name)
    }

    /// Verifies this set is complete: required keys present and
    /// no placeholder anywhere. `variables` must all be described.
    pub fn validate(&self, variables: &[&str]) -> Result<(), Error> {
        self.global.check("global attributes", &REQUIRED_GLOBAL)?;

        for name in variables {
            let attributes = self.variables.get(*name).ok_or_else(|| {
                Error::IncompleteMetadata(format!("variable \"{}\" is not described", name))
            })?;
            attributes.check(name, &REQUIRED_VARIABLE)?;
        }

        for (name, attributes) in self.variables.iter() {
            attributes.check(name, &[])?;
        }

        Ok(())
    }
}

/// Everything a [Resolver] needs to describe one file.
#[derive(Debug, Clone)]
pub struct MetadataContext {
    /// Station
    pub station: StationCode,
    /// Centroid and diagnostics of this request
    pub aggregate: AggregateEstimate,
    /// Coordinate written as station location
    pub representative: Representative,
    /// First sample [Epoch]
    pub first_epoch: Epoch,
    /// Last sample [Epoch]
    pub last_epoch: Epoch,
    /// File creation [Epoch]
    pub created: Epoch,
}

impl MetadataContext {
    /// Builds a new [MetadataContext], time coverage is deduced from the samples.
    pub fn new(
        station: StationCode,
        aggregate: AggregateEstimate,
        representative: Representative,
        samples: &[PositionSample],
        created: Epoch,
    ) -> Result<Self, Error> {
        let first_epoch = samples.first().ok_or(Error::NoSamples)?.epoch;
        let last_epoch = samples.last().ok_or(Error::NoSamples)?.epoch;
        Ok(Self {
            station,
            aggregate,
            representative,
            first_epoch,
            last_epoch,
            created,
        })
    }

    /// [AggregationMode] behind the representative coordinate.
    pub fn mode(&self) -> AggregationMode {
        self.representative.mode
    }
}

/// [Resolver] turns a [MetadataContext] into a complete [AttributeSet].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    profile: MetadataProfile,
}

impl Resolver {
    pub fn new(profile: MetadataProfile) -> Self {
        Self { profile }
    }

    /// Resolves all attributes. Fails with [Error::IncompleteMetadata]
    /// when any of them cannot be given an actual value.
    pub fn resolve(&self, ctx: &MetadataContext) -> Result<AttributeSet, Error> {
        let profile = &self.profile;
        let created = format_utc(ctx.created);
        let rep = &ctx.representative;
        let agg = &ctx.aggregate;

        let sample_count = i32::try_from(agg.sample_count).map_err(|_| {
            Error::IncompleteMetadata(format!(
                "sample_count {} does not fit the attribute type",
                agg.sample_count
            ))
        })?;

        let global = Attributes::default()
            .with("title", format!("Position data from {} station", ctx.station))
            .with("summary", profile.summary.as_str())
            .with("keywords", profile.keywords.as_str())
            .with("keywords_vocabulary", profile.keywords_vocabulary.as_str())
            .with("Conventions", "CF-1.11, ACDD-1.3")
            .with("featureType", "timeSeries")
            .with("station_id", ctx.station.to_string())
            .with("institution", profile.institution.as_str())
            .with("source", profile.source.as_str())
            .with("history", format!("{}, created file.", created))
            .with("date_created", created.as_str())
            .with("creator_type", profile.creator_type.as_str())
            .with("creator_institution", profile.institution.as_str())
            .with("creator_name", profile.creator_name.as_str())
            .with("creator_email", profile.creator_email.as_str())
            .with("creator_url", profile.creator_url.as_str())
            .with("project", profile.project.as_str())
            .with("license", profile.license.as_str())
            .with("iso_topic_category", profile.iso_topic_category.as_str())
            .with("activity_type", profile.activity_type.as_str())
            .with("operational_status", profile.operational_status.as_str())
            .with("geospatial_lat_min", rep.latitude)
            .with("geospatial_lat_max", rep.latitude)
            .with("geospatial_lat_units", "degree_north")
            .with("geospatial_lon_min", rep.longitude)
            .with("geospatial_lon_max", rep.longitude)
            .with("geospatial_lon_units", "degree_east")
            .with("time_coverage_start", format_utc(ctx.first_epoch))
            .with("time_coverage_end", format_utc(ctx.last_epoch))
            .with("aggregation_mode", ctx.mode().to_string())
            .with("coordinate_provenance", rep.provenance())
            .with(
                "tool_version",
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            )
            .with("sample_count", sample_count)
            .with("cep_min", agg.min_cep)
            .with("cep_max", agg.max_cep)
            .with("weight_sum", agg.weight_sum)
            .with("aggregate_offset_from_reference_m", rep.drift_from(agg));

        let mut variables = BTreeMap::new();

        variables.insert(
            TIME.to_string(),
            Attributes::default()
                .with("standard_name", "time")
                .with("long_name", "time of position fix")
                .with("units", TIME_UNITS)
                .with("calendar", "standard")
                .with("axis", "T")
                .with("coverage_content_type", "coordinate"),
        );

        variables.insert(
            LATITUDE.to_string(),
            Attributes::default()
                .with("standard_name", "latitude")
                .with("long_name", "latitude of position fix")
                .with("units", "degree_north")
                .with("valid_min", -90.0)
                .with("valid_max", 90.0)
                .with("coverage_content_type", "physicalMeasurement"),
        );

        variables.insert(
            LONGITUDE.to_string(),
            Attributes::default()
                .with("standard_name", "longitude")
                .with("long_name", "longitude of position fix")
                .with("units", "degree_east")
                .with("valid_min", -180.0)
                .with("valid_max", 180.0)
                .with("coverage_content_type", "physicalMeasurement"),
        );

        variables.insert(
            CEP.to_string(),
            Attributes::default()
                .with("long_name", "circular error probable of position fix")
                .with("units", "m")
                .with("valid_min", 0.0)
                .with("coverage_content_type", "qualityInformation"),
        );

        variables.insert(
            LAT.to_string(),
            Attributes::default()
                .with("standard_name", "latitude")
                .with("long_name", "station latitude")
                .with("units", "degree_north")
                .with("coverage_content_type", "referenceInformation")
                .with("comment", rep.provenance()),
        );

        variables.insert(
            LON.to_string(),
            Attributes::default()
                .with("standard_name", "longitude")
                .with("long_name", "station longitude")
                .with("units", "degree_east")
                .with("coverage_content_type", "referenceInformation")
                .with("comment", rep.provenance()),
        );

        let set = AttributeSet { global, variables };
        set.validate(&[TIME, LATITUDE, LONGITUDE, CEP, LAT, LON])?;

        debug!(
            "{} - resolved {} global attributes",
            ctx.station,
            set.global.len()
        );

        Ok(set)
    }
}
