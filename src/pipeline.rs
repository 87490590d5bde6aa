//! Fetch, reduce, describe and write one station time series
use std::path::{Path, PathBuf};

use hifitime::Epoch;
use log::{debug, info};

use crate::{
    document::OutputDocument,
    errors::{Error, PipelineError, Stage},
    estimator::{AggregateEstimate, AggregationMode, Estimator, Representative},
    metadata::{MetadataContext, MetadataProfile, Resolver},
    sample::{SampleSource, TimeWindow},
    station::{Registry, StationCode},
};

/// Outcome of a successful [Pipeline] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Station
    pub station: StationCode,
    /// Number of samples written
    pub sample_count: usize,
    /// Centroid of this request
    pub aggregate: AggregateEstimate,
    /// Coordinate written as station location
    pub representative: Representative,
    /// Written file
    pub path: PathBuf,
}

/// [Pipeline] runs one request to completion: a single station,
/// a single [TimeWindow], a single output file. Every failure is fatal.
pub struct Pipeline<'a, S: SampleSource> {
    registry: &'a Registry,
    source: S,
    mode: AggregationMode,
    resolver: Resolver,
    created: Option<Epoch>,
}

impl<'a, S: SampleSource> Pipeline<'a, S> {
    /// Builds a new [Pipeline] in [AggregationMode::StableReference],
    /// with default [MetadataProfile].
    pub fn new(registry: &'a Registry, source: S) -> Self {
        Self {
            registry,
            source,
            mode: AggregationMode::default(),
            resolver: Resolver::default(),
            created: None,
        }
    }

    /// Returns [Pipeline] with desired [AggregationMode].
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns [Pipeline] with desired [MetadataProfile].
    pub fn with_profile(mut self, profile: MetadataProfile) -> Self {
        self.resolver = Resolver::new(profile);
        self
    }

    /// Returns [Pipeline] stamping files with this creation [Epoch]
    /// instead of the system time. The station reference active
    /// at this instant is the one written.
    pub fn with_creation_epoch(mut self, created: Epoch) -> Self {
        self.created = Some(created);
        self
    }

    /// Runs the complete request, writing the result at `path`.
    pub fn run<P: AsRef<Path>>(
        &self,
        station: StationCode,
        window: TimeWindow,
        path: P,
    ) -> Result<Report, PipelineError> {
        let path = path.as_ref();

        let fail = |stage: Stage, error: Error| PipelineError {
            stage,
            station,
            start: window.start,
            end: window.end,
            error,
        };

        // re-validate: fields are public
        TimeWindow::new(window.start, window.end).map_err(|e| fail(Stage::Validate, e))?;

        // files carry the station reference in effect at creation
        let created = match self.created {
            Some(t) => t,
            None => Epoch::now().map_err(|e| {
                fail(
                    Stage::Metadata,
                    Error::IncompleteMetadata(format!("creation date: {}", e)),
                )
            })?,
        };

        if self.mode == AggregationMode::StableReference {
            // fail before any network access
            self.registry
                .lookup_at(station, created)
                .map_err(|e| fail(Stage::Lookup, e))?;
        }

        debug!("{} - fetching {}", station, window);

        let samples = self
            .source
            .fetch(station, &window)
            .map_err(|e| fail(Stage::Fetch, e.into()))?;

        debug!("{} - {} samples fetched", station, samples.len());

        let (aggregate, representative) = Estimator::new(self.registry, created)
            .with_mode(self.mode)
            .representative(station, &samples)
            .map_err(|e| fail(Stage::Estimate, e))?;

        let context = MetadataContext::new(station, aggregate, representative, &samples, created)
            .map_err(|e| fail(Stage::Metadata, e))?;

        let attributes = self
            .resolver
            .resolve(&context)
            .map_err(|e| fail(Stage::Metadata, e))?;

        let sample_count = samples.len();

        let document = OutputDocument::new(samples, &representative, attributes)
            .map_err(|e| fail(Stage::Encode, e))?;

        document.write(path).map_err(|e| fail(Stage::Write, e))?;

        info!(
            "{} - {} ({} samples, {}) written to {}",
            station,
            window,
            sample_count,
            representative.mode,
            path.display()
        );

        Ok(Report {
            station,
            sample_count,
            aggregate,
            representative,
            path: path.to_path_buf(),
        })
    }
}
