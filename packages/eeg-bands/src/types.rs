use crate::error::{EegError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed 8-channel montage, in recording order
pub const MONTAGE: [&str; 8] = ["FP1", "FP2", "F3", "F4", "C3", "C4", "O1", "O2"];

/// Broad physiological band kept before compression (Hz)
pub const BROADBAND_LOW_HZ: f64 = 2.0;
pub const BROADBAND_HIGH_HZ: f64 = 50.0;

/// Sample rates at or below this cannot represent the broadband upper edge
pub const MIN_SAMPLE_RATE_HZ: f64 = 2.0 * BROADBAND_HIGH_HZ;

/// Canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    /// Nominal (low, high) cutoffs in Hz
    pub fn range_hz(self) -> (f64, f64) {
        BAND_RANGES[self as usize].1
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Band::ALL.into_iter().find(|b| b.name() == name)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Band table, indexed by `Band as usize`
pub const BAND_RANGES: [(Band, (f64, f64)); 5] = [
    (Band::Delta, (1.0, 4.0)),
    (Band::Theta, (4.0, 8.0)),
    (Band::Alpha, (8.0, 12.0)),
    (Band::Beta, (12.0, 30.0)),
    (Band::Gamma, (30.0, 50.0)),
];

/// One participant's raw recording: `channels[channel][sample]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecording {
    pub channels: Vec<Vec<f64>>,
    pub sample_rate_hz: f64,
    pub channel_names: Vec<String>,
}

impl RawRecording {
    /// Build a recording on the fixed montage.
    ///
    /// Fails with `MalformedInput` when the channel count does not match the
    /// montage or channels differ in length. The sample rate is checked later,
    /// by the pipeline, so that it is reported as a band-limit failure.
    pub fn new(channels: Vec<Vec<f64>>, sample_rate_hz: f64) -> Result<Self> {
        if channels.len() != MONTAGE.len() {
            return Err(EegError::MalformedInput(format!(
                "expected {} channels ({}), found {}",
                MONTAGE.len(),
                MONTAGE.join(", "),
                channels.len()
            )));
        }
        check_shape(&channels)?;

        Ok(Self {
            channels,
            sample_rate_hz,
            channel_names: MONTAGE.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate_hz
    }
}

/// All channels must hold the same number of samples.
pub fn check_shape(channels: &[Vec<f64>]) -> Result<()> {
    let num_samples = channels.first().map_or(0, Vec::len);
    if let Some((idx, ch)) = channels
        .iter()
        .enumerate()
        .find(|(_, ch)| ch.len() != num_samples)
    {
        return Err(EegError::MalformedInput(format!(
            "channel {} has {} samples, expected {}",
            idx + 1,
            ch.len(),
            num_samples
        )));
    }
    Ok(())
}

/// Band-limited copies of a multichannel signal, one per band, in canonical order
#[derive(Debug, Clone, PartialEq)]
pub struct BandSignal {
    bands: Vec<(Band, Vec<Vec<f64>>)>,
}

impl BandSignal {
    pub(crate) fn from_bands(bands: Vec<(Band, Vec<Vec<f64>>)>) -> Self {
        Self { bands }
    }

    pub fn get(&self, band: Band) -> Option<&[Vec<f64>]> {
        self.bands
            .iter()
            .find(|(b, _)| *b == band)
            .map(|(_, data)| data.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, &[Vec<f64>])> {
        self.bands.iter().map(|(b, data)| (*b, data.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Peak indices per band, per 1-based channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakSet {
    peaks: BTreeMap<Band, BTreeMap<usize, Vec<usize>>>,
}

impl PeakSet {
    pub(crate) fn insert(&mut self, band: Band, channel: usize, indices: Vec<usize>) {
        self.peaks.entry(band).or_default().insert(channel, indices);
    }

    /// Peaks of `channel` (1-based) in `band`
    pub fn get(&self, band: Band, channel: usize) -> Option<&[usize]> {
        self.peaks
            .get(&band)
            .and_then(|chans| chans.get(&channel))
            .map(Vec::as_slice)
    }

    pub fn band(&self, band: Band) -> Option<&BTreeMap<usize, Vec<usize>>> {
        self.peaks.get(&band)
    }

    pub fn total(&self) -> usize {
        self.peaks
            .values()
            .flat_map(|chans| chans.values())
            .map(Vec::len)
            .sum()
    }

    /// Total peaks per band, canonical order
    pub fn counts(&self) -> Vec<(Band, usize)> {
        self.peaks
            .iter()
            .map(|(band, chans)| (*band, chans.values().map(Vec::len).sum()))
            .collect()
    }
}

pub fn channel_key(channel: usize) -> String {
    format!("channel_{}", channel)
}

struct ChannelPeaks<'a>(&'a BTreeMap<usize, Vec<usize>>);

impl Serialize for ChannelPeaks<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (channel, indices) in self.0 {
            map.serialize_entry(&channel_key(*channel), indices)?;
        }
        map.end()
    }
}

// Band keys keep canonical order; serde_json's own map would sort them.
impl Serialize for PeakSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.peaks.len()))?;
        for (band, chans) in &self.peaks {
            map.serialize_entry(band.name(), &ChannelPeaks(chans))?;
        }
        map.end()
    }
}

/// Everything a pipeline run produces for one participant
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub bands: BandSignal,
    pub peaks: PeakSet,
}

impl ProcessOutput {
    pub fn num_channels(&self) -> usize {
        self.bands.iter().next().map_or(0, |(_, data)| data.len())
    }

    pub fn num_samples(&self) -> usize {
        self.bands
            .iter()
            .next()
            .and_then(|(_, data)| data.first())
            .map_or(0, Vec::len)
    }
}
