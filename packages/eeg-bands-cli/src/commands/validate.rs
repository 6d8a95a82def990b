use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use eeg_bands::{load_recording, MONTAGE};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    valid: bool,
    channels: Option<usize>,
    channel_names: Vec<&'static str>,
    samples: Option<usize>,
    duration_secs: Option<f64>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);
    let exists = path.is_file();

    let loaded = if exists {
        Some(load_recording(path, &args.field, args.sr))
    } else {
        None
    };

    let result = match loaded {
        None => ValidateOutput {
            file: args.file.clone(),
            exists,
            valid: false,
            channels: None,
            channel_names: Vec::new(),
            samples: None,
            duration_secs: None,
            error: Some(format!("File not found: {}", args.file)),
        },
        Some(Ok(rec)) => ValidateOutput {
            file: args.file.clone(),
            exists,
            valid: true,
            channels: Some(rec.num_channels()),
            channel_names: MONTAGE.to_vec(),
            samples: Some(rec.num_samples()),
            duration_secs: Some(rec.duration_secs()),
            error: None,
        },
        Some(Err(e)) => ValidateOutput {
            file: args.file.clone(),
            exists,
            valid: false,
            channels: None,
            channel_names: Vec::new(),
            samples: None,
            duration_secs: None,
            error: Some(e.to_string()),
        },
    };

    if args.json {
        if let Err(e) = output::print_json(&result) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else if let Some(ref err) = result.error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({} channels, {} samples, {:.2}s at {} Hz)",
            args.file,
            result.channels.unwrap_or(0),
            result.samples.unwrap_or(0),
            result.duration_secs.unwrap_or(0.0),
            args.sr
        );
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::INPUT_ERROR
    }
}
