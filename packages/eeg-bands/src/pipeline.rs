//! Per-participant processing pipeline
//!
//! 1. Band-limit the raw signal to 2-50 Hz (zero-phase)
//! 2. Log-compress amplitude
//! 3. Decompose into the five EEG bands
//! 4. Detect peaks per band and channel
//!
//! A run is a pure function of its input; nothing is shared between
//! participants.

use crate::bands;
use crate::compress;
use crate::error::{EegError, Result};
use crate::filters::ZeroPhaseBandpass;
use crate::peaks;
use crate::profile_scope;
use crate::types::{
    check_shape, ProcessOutput, RawRecording, BROADBAND_HIGH_HZ, BROADBAND_LOW_HZ,
    MIN_SAMPLE_RATE_HZ,
};
use serde::{Deserialize, Serialize};

/// Pipeline settings shared by every participant of a batch. The sample
/// rate belongs to the recording, not to the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Butterworth order of each half (high-pass and low-pass) of every band-pass
    #[serde(default = "default_filter_order")]
    pub filter_order: usize,
}

fn default_filter_order() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter_order: default_filter_order(),
        }
    }
}

impl PipelineConfig {
    pub fn new(filter_order: usize) -> Self {
        Self { filter_order }
    }

    /// Check everything that does not depend on the samples themselves.
    ///
    /// Sample rate first, then the band table, so a rate of 80 Hz reports
    /// `InvalidSampleRate` rather than a band failure.
    pub fn validate(&self, sample_rate: f64) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        bands::validate_band_ranges(sample_rate)?;
        if self.filter_order == 0 {
            return Err(EegError::InvalidParameter(
                "filter order must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The broadband filter needs `sample_rate > 100` to represent its 50 Hz edge.
pub fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > MIN_SAMPLE_RATE_HZ {
        Ok(())
    } else {
        Err(EegError::InvalidSampleRate(sample_rate))
    }
}

/// Zero-phase 2-50 Hz band-pass of every channel.
pub fn band_limit(channels: &[Vec<f64>], sample_rate: f64, order: usize) -> Result<Vec<Vec<f64>>> {
    validate_sample_rate(sample_rate)?;
    let filter = ZeroPhaseBandpass::design(
        "broadband",
        BROADBAND_LOW_HZ,
        BROADBAND_HIGH_HZ,
        sample_rate,
        order,
    )?;
    Ok(channels.iter().map(|ch| filter.filtfilt(ch)).collect())
}

/// Run the whole pipeline on one recording at its own sample rate.
pub fn process(raw: &RawRecording, config: &PipelineConfig) -> Result<ProcessOutput> {
    let sample_rate = raw.sample_rate_hz;
    config.validate(sample_rate)?;
    check_shape(&raw.channels)?;
    // Before filtering: a NaN would otherwise smear over the whole channel
    compress::check_finite(&raw.channels)?;

    log::debug!(
        "Processing {} channels x {} samples at {} Hz",
        raw.num_channels(),
        raw.num_samples(),
        sample_rate
    );

    let filtered = {
        profile_scope!("band-limit");
        band_limit(&raw.channels, sample_rate, config.filter_order)?
    };

    let compressed = {
        profile_scope!("compression");
        compress::compress(&filtered)?
    };
    drop(filtered);

    let bands = {
        profile_scope!("band-decomposition");
        bands::decompose(&compressed, sample_rate, config.filter_order)?
    };

    let peaks = {
        profile_scope!("peak-detection");
        peaks::detect(&bands)
    };

    log::debug!("Detected {} peaks", peaks.total());

    Ok(ProcessOutput { bands, peaks })
}

/// Run the pipeline with the default configuration.
pub fn process_recording(raw: &RawRecording) -> Result<ProcessOutput> {
    process(raw, &PipelineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_recording(sample_rate: f64) -> RawRecording {
        RawRecording::new(vec![vec![1.0; 300]; 8], sample_rate).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate(250.0).is_ok());
        assert_eq!(config.filter_order, 4);
    }

    #[test]
    fn test_sample_rate_boundaries() {
        assert!(validate_sample_rate(100.0).is_err());
        assert!(validate_sample_rate(100.5).is_ok());
        assert!(validate_sample_rate(f64::NAN).is_err());
        assert!(validate_sample_rate(f64::INFINITY).is_err());
        assert!(validate_sample_rate(-250.0).is_err());
    }

    #[test]
    fn test_low_rate_reports_sample_rate_not_band() {
        let err = PipelineConfig::default().validate(80.0).unwrap_err();
        assert!(matches!(err, EegError::InvalidSampleRate(r) if r == 80.0));
        assert_eq!(err.stage(), "band-limit");
    }

    #[test]
    fn test_zero_order_rejected() {
        assert!(matches!(
            PipelineConfig::new(0).validate(250.0),
            Err(EegError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_default_order() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.filter_order, 4);
        let config: PipelineConfig = serde_json::from_str(r#"{"filter_order": 2}"#).unwrap();
        assert_eq!(config.filter_order, 2);
    }

    #[test]
    fn test_process_uses_recording_sample_rate() {
        let out = process(&flat_recording(500.0), &PipelineConfig::new(2)).unwrap();
        assert_eq!(out.num_samples(), 300);

        let err = process(&flat_recording(90.0), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, EegError::InvalidSampleRate(r) if r == 90.0));
    }

    #[test]
    fn test_non_finite_reported_at_raw_position() {
        let mut raw = flat_recording(250.0);
        raw.channels[4][150] = f64::INFINITY;

        let err = process_recording(&raw).unwrap_err();
        assert!(matches!(
            err,
            EegError::NonFiniteInput {
                channel: 5,
                sample: 150
            }
        ));
        assert_eq!(err.stage(), "compression");
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let mut raw = flat_recording(250.0);
        raw.channels[6].truncate(200);

        let err = process_recording(&raw).unwrap_err();
        assert!(matches!(err, EegError::MalformedInput(ref m) if m.contains("channel 7")));
    }

    #[test]
    fn test_band_limit_keeps_shape() {
        let raw = flat_recording(250.0);
        let out = band_limit(&raw.channels, 250.0, 4).unwrap();
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|ch| ch.len() == 300));
    }

    #[test]
    fn test_process_flat_recording() {
        let out = process_recording(&flat_recording(250.0)).unwrap();
        assert_eq!(out.num_channels(), 8);
        assert_eq!(out.num_samples(), 300);
        assert_eq!(out.peaks.total(), 0);
    }
}
