//! Adaptive-threshold peak detection.

use crate::types::{BandSignal, PeakSet};

/// Population mean and standard deviation (divisor `n`).
pub fn mean_std(x: &[f64]) -> (f64, f64) {
    if x.is_empty() {
        return (0.0, 0.0);
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Threshold a sample must exceed to count as a peak: `mean + 2 * std`.
pub fn adaptive_threshold(x: &[f64]) -> f64 {
    let (mean, std) = mean_std(x);
    mean + 2.0 * std
}

/// Indices of strict local maxima above `height`, ascending.
///
/// The first and last samples have a single neighbour and never qualify;
/// plateaus never qualify either.
pub fn find_peaks(x: &[f64], height: f64) -> Vec<usize> {
    if x.len() < 3 {
        return Vec::new();
    }
    x.windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] > height)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Peaks of a single channel against its own adaptive threshold.
pub fn detect_channel(x: &[f64]) -> Vec<usize> {
    find_peaks(x, adaptive_threshold(x))
}

/// Run detection on every channel of every band. Channels are keyed 1-based.
pub fn detect(bands: &BandSignal) -> PeakSet {
    let mut peaks = PeakSet::default();
    for (band, channels) in bands.iter() {
        for (idx, channel) in channels.iter().enumerate() {
            peaks.insert(band, idx + 1, detect_channel(channel));
        }
    }
    peaks
}
