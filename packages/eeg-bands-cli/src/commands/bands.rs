use crate::cli::BandsArgs;
use crate::exit_codes;
use crate::output;
use eeg_bands::{BAND_RANGES, BROADBAND_HIGH_HZ, BROADBAND_LOW_HZ, MIN_SAMPLE_RATE_HZ};
use serde::Serialize;

#[derive(Serialize)]
struct BandInfo {
    name: &'static str,
    low_hz: f64,
    high_hz: f64,
}

pub fn execute(args: BandsArgs) -> i32 {
    let bands: Vec<BandInfo> = BAND_RANGES
        .iter()
        .map(|(band, (low, high))| BandInfo {
            name: band.name(),
            low_hz: *low,
            high_hz: *high,
        })
        .collect();

    if args.json {
        if let Err(e) = output::print_json(&bands) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("EEG Frequency Bands:\n");
        println!("  {:<8} {:>8} {:>8}", "Band", "Low Hz", "High Hz");
        println!("  {}", "-".repeat(26));
        for b in &bands {
            println!("  {:<8} {:>8} {:>8}", b.name, b.low_hz, b.high_hz);
        }
        println!();
        println!(
            "Recordings are first band-limited to {}-{} Hz (sample rate must exceed {} Hz).",
            BROADBAND_LOW_HZ, BROADBAND_HIGH_HZ, MIN_SAMPLE_RATE_HZ
        );
    }

    exit_codes::SUCCESS
}
