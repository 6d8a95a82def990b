//! Band decomposition into the canonical EEG bands.

use crate::error::{EegError, Result};
use crate::filters::ZeroPhaseBandpass;
use crate::types::{BandSignal, BAND_RANGES};

/// Check every band of the table against the Nyquist frequency of `sample_rate`.
pub fn validate_band_ranges(sample_rate: f64) -> Result<()> {
    let nyquist = sample_rate / 2.0;
    for (band, (low, high)) in BAND_RANGES {
        if !(high < nyquist) {
            return Err(EegError::InvalidBandRange {
                band: band.name().to_string(),
                low,
                high,
                nyquist,
            });
        }
    }
    Ok(())
}

/// Split a multichannel signal into one zero-phase band-passed copy per band.
///
/// Every band uses the same Butterworth design of the given `order`; only the
/// cutoffs change.
pub fn decompose(channels: &[Vec<f64>], sample_rate: f64, order: usize) -> Result<BandSignal> {
    validate_band_ranges(sample_rate)?;

    let mut bands = Vec::with_capacity(BAND_RANGES.len());
    for (band, (low, high)) in BAND_RANGES {
        let filter = ZeroPhaseBandpass::design(band.name(), low, high, sample_rate, order)?;
        log::debug!(
            "Band {}: {}-{} Hz, {} sections",
            band,
            low,
            high,
            filter.sections().len()
        );
        let data = channels.iter().map(|ch| filter.filtfilt(ch)).collect();
        bands.push((band, data));
    }

    Ok(BandSignal::from_bands(bands))
}
