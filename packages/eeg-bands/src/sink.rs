//! Result sink: one CSV per band plus one JSON peak file per participant.

use crate::error::{EegError, Result};
use crate::types::{Band, PeakSet, ProcessOutput};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_DELIMITER: u8 = b';';

/// `<participant>_<band>.csv`
pub fn band_file_name(participant: &str, band: Band) -> String {
    format!("{}_{}.csv", participant, band)
}

/// `<participant>_picos_transicoes.json`, the name downstream analysis expects
pub fn peaks_file_name(participant: &str) -> String {
    format!("{}_picos_transicoes.json", participant)
}

/// Column label of a 1-based channel in the band tables
pub fn column_label(channel: usize) -> String {
    format!("Canal_{}", channel)
}

/// Write every artifact of one participant into `output_dir`, replacing
/// files of the same name. Returns the written paths, band files first.
pub fn write_results(output_dir: &Path, participant: &str, output: &ProcessOutput) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(output.bands.len() + 1);
    for (band, channels) in output.bands.iter() {
        let path = output_dir.join(band_file_name(participant, band));
        write_band_csv(&path, channels)?;
        written.push(path);
    }

    let path = output_dir.join(peaks_file_name(participant));
    write_peaks_json(&path, &output.peaks)?;
    written.push(path);

    log::info!(
        "Wrote {} files for participant {} to {}",
        written.len(),
        participant,
        output_dir.display()
    );
    Ok(written)
}

/// One row per sample, one column per channel. Channels must be of equal length.
pub fn write_band_csv(path: &Path, channels: &[Vec<f64>]) -> Result<()> {
    let num_samples = channels.first().map_or(0, Vec::len);
    if let Some(idx) = channels.iter().position(|ch| ch.len() != num_samples) {
        return Err(EegError::MalformedInput(format!(
            "cannot tabulate {}: channel {} has {} samples, expected {}",
            path.display(),
            idx + 1,
            channels[idx].len(),
            num_samples
        )));
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(path)?;

    writer.write_record((1..=channels.len()).map(column_label))?;

    let mut row = Vec::with_capacity(channels.len());
    for s in 0..num_samples {
        row.clear();
        row.extend(channels.iter().map(|ch| ch[s].to_string()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Band -> channel -> peak indices, indented with four spaces.
pub fn write_peaks_json(path: &Path, peaks: &PeakSet) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    peaks.serialize(&mut serializer)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BandSignal;

    fn sample_output() -> ProcessOutput {
        let bands = BandSignal::from_bands(
            Band::ALL
                .iter()
                .map(|b| (*b, vec![vec![0.5, -1.0, 2.0], vec![0.0, 0.25, 3.0]]))
                .collect(),
        );
        let mut peaks = PeakSet::default();
        for band in Band::ALL {
            peaks.insert(band, 1, vec![]);
            peaks.insert(band, 2, vec![1]);
        }
        ProcessOutput { bands, peaks }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(band_file_name("sub-01", Band::Alpha), "sub-01_alpha.csv");
        assert_eq!(peaks_file_name("sub-01"), "sub-01_picos_transicoes.json");
        assert_eq!(column_label(3), "Canal_3");
    }

    #[test]
    fn test_write_results_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("out");
        let written = write_results(&out_dir, "p7", &sample_output()).unwrap();

        assert_eq!(written.len(), 6);
        assert!(written[0].ends_with("p7_delta.csv"));
        assert!(written[5].ends_with("p7_picos_transicoes.json"));

        let csv_text = std::fs::read_to_string(out_dir.join("p7_beta.csv")).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines, vec!["Canal_1;Canal_2", "0.5;0", "-1;0.25", "2;3"]);
    }

    #[test]
    fn test_peaks_json_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peaks.json");
        write_peaks_json(&path, &sample_output().peaks).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"delta\": {\n        \"channel_1\": [],"));

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["gamma"]["channel_2"], serde_json::json!([1]));
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn test_ragged_band_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1_theta.csv");

        let err = write_band_csv(&path, &[vec![1.0, 2.0, 3.0], vec![4.0]]).unwrap_err();
        assert!(matches!(err, EegError::MalformedInput(ref m) if m.contains("channel 2")));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_results_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1_alpha.csv");
        std::fs::write(&path, "stale contents that are longer than the new file\n".repeat(50)).unwrap();

        write_results(dir.path(), "p1", &sample_output()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Canal_1;Canal_2"));
        assert!(!text.contains("stale"));
    }
}
