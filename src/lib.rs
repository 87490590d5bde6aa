#![doc = "SPICE station position aggregation and self-describing netCDF synthesis."]
#![cfg_attr(docrs, feature(doc_cfg))]

pub mod document;
pub mod errors;
pub mod estimator;
pub mod metadata;
pub mod pipeline;
pub mod sample;
pub mod station;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::document::OutputDocument;
    pub use crate::errors::{Error, FetchError, PipelineError, RegistryError, Stage};
    pub use crate::estimator::{
        estimate, weight, AggregateEstimate, AggregationMode, Estimator, Representative,
        CEP_FLOOR,
    };
    pub use crate::metadata::{
        AttributeSet, AttributeValue, Attributes, MetadataContext, MetadataProfile, Resolver,
    };
    pub use crate::pipeline::{Pipeline, Report};
    pub use crate::sample::{PositionSample, SampleSource, TimeWindow};
    pub use crate::station::{ReferenceSource, Registry, StationCode, StationReference};
    // re-export
    pub use hifitime::{Duration, Epoch, TimeScale};
}
