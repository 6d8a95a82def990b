use clap::{Args, Parser, Subcommand};
use eeg_bands::DEFAULT_DATA_FIELD;

#[derive(Parser)]
#[command(
    name = "eegbands",
    version,
    about = "EEG band decomposition and peak detection",
    long_about = "Split raw 8-channel EEG recordings (JSON) into delta, theta, alpha, beta and gamma\n\
                  time series and detect peaks per band and channel.\n\
                  Writes <participant>_<band>.csv and <participant>_picos_transicoes.json for every recording."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process every recording in a directory
    Process(ProcessArgs),
    /// Check that a recording file can be loaded
    Validate(ValidateArgs),
    /// List the EEG frequency bands
    Bands(BandsArgs),
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Directory containing one <participant>.json recording per participant
    #[arg(long)]
    pub input_dir: String,

    /// Directory for the band tables and peak files (created if missing)
    #[arg(long)]
    pub output_dir: String,

    /// Sampling rate in Hz, applied to every recording
    #[arg(long, env = "EEGBANDS_SAMPLE_RATE", default_value_t = 250.0)]
    pub sr: f64,

    /// JSON field holding the channels x samples matrix
    #[arg(long, default_value = DEFAULT_DATA_FIELD)]
    pub field: String,

    /// Butterworth order of each filter half
    #[arg(long, default_value_t = 4)]
    pub filter_order: usize,

    /// Process participants on N worker threads
    #[arg(long, conflicts_with = "fail_fast")]
    pub jobs: Option<usize>,

    /// Stop at the first failing participant
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// List the recordings that would be processed and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print a JSON batch summary on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Recording file path
    #[arg(long)]
    pub file: String,

    /// JSON field holding the channels x samples matrix
    #[arg(long, default_value = DEFAULT_DATA_FIELD)]
    pub field: String,

    /// Sampling rate in Hz, used to report the duration
    #[arg(long, env = "EEGBANDS_SAMPLE_RATE", default_value_t = 250.0)]
    pub sr: f64,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct BandsArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
