//! Suitability model facade
//!
//! Owns the reference stations, the optional visibility source, the
//! immutable training set, and the most recent calibration. Explicitly
//! constructed and owned by the caller: independent models coexist in one
//! process, which is exactly how the tests run them.

use std::sync::Arc;

use tracing::info;

use orbital_visibility::{SiteLocation, VisibilityCalculator};

use crate::calibrator::{self, CalibrationConfig, CalibrationResult, EmpiricalWeights};
use crate::features::PointOverrides;
use crate::idw::{self, IdwEstimate, IdwParams};
use crate::scorer::{self, LocationScore};
use crate::training::TrainingSetBuilder;
use crate::{ReferenceStation, Result, SuitabilityError, TrainingSample};

pub struct SuitabilityModel {
    stations: Vec<ReferenceStation>,
    calculator: Option<Arc<dyn VisibilityCalculator>>,
    config: CalibrationConfig,
    training_set: Option<crate::training::TrainingSet>,
    result: Option<CalibrationResult>,
}

impl SuitabilityModel {
    pub fn new(stations: Vec<ReferenceStation>) -> Self {
        Self {
            stations,
            calculator: None,
            config: CalibrationConfig::default(),
            training_set: None,
            result: None,
        }
    }

    /// Attach an orbital visibility source for training-sample enrichment.
    pub fn with_calculator(mut self, calculator: Arc<dyn VisibilityCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    pub fn with_config(mut self, config: CalibrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the training set (first call only), fit category weights, and
    /// swap in the new result. Re-invocation replaces the stored result
    /// wholesale; readers never observe a half-updated calibration.
    pub async fn calibrate_weights(&mut self) -> Result<CalibrationResult> {
        if self.training_set.is_none() {
            let mut builder = TrainingSetBuilder::new(self.stations.clone());
            if let Some(calculator) = &self.calculator {
                builder = builder.with_calculator(Arc::clone(calculator));
            }
            self.training_set = Some(builder.build().await?);
        }

        let set = self
            .training_set
            .as_ref()
            .ok_or(SuitabilityError::TrainingSetNotBuilt)?;
        let result = calibrator::calibrate(set, &self.config)?;

        info!(
            accuracy = result.accuracy,
            sample_count = result.training.sample_count,
            "calibration stored"
        );
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Calibrate against the explicit ROI-only degraded set, bypassing the
    /// visibility source entirely.
    pub async fn calibrate_degraded(&mut self) -> Result<CalibrationResult> {
        let set = TrainingSetBuilder::new(self.stations.clone()).build_degraded()?;
        let result = calibrator::calibrate(&set, &self.config)?;
        self.training_set = Some(set);
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Model-based score for an arbitrary coordinate. Requires a prior
    /// successful calibration.
    pub fn score_location(
        &self,
        lat: f64,
        lon: f64,
        overrides: Option<&PointOverrides>,
    ) -> Result<LocationScore> {
        check_coordinates(lat, lon)?;
        let result = self.result.as_ref().ok_or(SuitabilityError::NotCalibrated)?;
        let samples = self.samples()?;
        Ok(scorer::score_location(
            samples,
            &result.weights,
            lat,
            lon,
            overrides,
        ))
    }

    /// Distance-weighted interpolation of raw outcomes. Independent of the
    /// calibrated weights, but needs the training set the calibration built.
    pub fn interpolate_idw(&self, lat: f64, lon: f64, params: IdwParams) -> Result<IdwEstimate> {
        check_coordinates(lat, lon)?;
        let samples = self.samples()?;
        Ok(idw::interpolate(samples, lat, lon, params))
    }

    pub fn calibration_result(&self) -> Option<&CalibrationResult> {
        self.result.as_ref()
    }

    pub fn weights(&self) -> Option<&EmpiricalWeights> {
        self.result.as_ref().map(|r| &r.weights)
    }

    pub fn training_samples(&self) -> Option<&[TrainingSample]> {
        self.training_set.as_ref().map(|s| s.samples.as_slice())
    }

    pub fn stations(&self) -> &[ReferenceStation] {
        &self.stations
    }

    fn samples(&self) -> Result<&[TrainingSample]> {
        self.training_set
            .as_ref()
            .map(|s| s.samples.as_slice())
            .ok_or(SuitabilityError::TrainingSetNotBuilt)
    }
}

fn check_coordinates(lat: f64, lon: f64) -> Result<()> {
    if SiteLocation::new(lat, lon).is_valid() {
        Ok(())
    } else {
        Err(SuitabilityError::InvalidCoordinates(format!(
            "lat={lat}, lon={lon}"
        )))
    }
}
