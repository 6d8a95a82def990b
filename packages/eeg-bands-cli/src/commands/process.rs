use crate::cli::ProcessArgs;
use crate::exit_codes;
use crate::output;
use eeg_bands::{
    load_recording, process, write_results, ParticipantError, PipelineConfig, ProcessOutput,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Serialize)]
struct BandPeaks {
    band: &'static str,
    peaks: usize,
}

#[derive(Debug, Serialize)]
struct ParticipantReport {
    participant: String,
    file: String,
    succeeded: bool,
    num_samples: Option<usize>,
    peaks: Vec<BandPeaks>,
    stage: Option<&'static str>,
    error: Option<String>,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    total: usize,
    succeeded: usize,
    failed: usize,
    sample_rate: f64,
    output_dir: String,
    elapsed_secs: f64,
    participants: Vec<ParticipantReport>,
}

pub fn execute(args: ProcessArgs) -> i32 {
    let files = match discover_recordings(Path::new(&args.input_dir)) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No recordings (*.json) found in {}", args.input_dir);
        return exit_codes::INPUT_ERROR;
    }

    // Dry-run mode: print file list and exit
    if args.dry_run {
        for f in &files {
            println!("{}", f.display());
        }
        if !args.quiet {
            eprintln!("Found {} recording(s)", files.len());
        }
        return exit_codes::SUCCESS;
    }

    // Configuration problems are reported once, before any participant
    let config = PipelineConfig::new(args.filter_order);
    if let Err(e) = config.validate(args.sr) {
        eprintln!("Error: {} ({} stage)", e, e.stage());
        return exit_codes::INPUT_ERROR;
    }

    let output_dir = PathBuf::from(&args.output_dir);
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        eprintln!(
            "Error: Failed to create output directory '{}': {}",
            args.output_dir, e
        );
        return exit_codes::EXECUTION_ERROR;
    }

    let start_time = Instant::now();
    let reports = match args.jobs {
        Some(jobs) if jobs > 1 => {
            match run_parallel(&files, &args, &config, &output_dir, jobs) {
                Ok(r) => r,
                Err(msg) => {
                    eprintln!("Error: {}", msg);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
        }
        _ => run_sequential(&files, &args, &config, &output_dir),
    };
    let elapsed = start_time.elapsed();

    let total = files.len();
    let succeeded = reports.iter().filter(|r| r.succeeded).count();
    let failed = reports.len() - succeeded;

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} succeeded, {}/{} failed, {:.1}s",
            succeeded,
            total,
            failed,
            total,
            elapsed.as_secs_f64()
        );
    }

    if args.json {
        let summary = BatchSummary {
            total,
            succeeded,
            failed,
            sample_rate: args.sr,
            output_dir: args.output_dir.clone(),
            elapsed_secs: elapsed.as_secs_f64(),
            participants: reports,
        };
        if let Err(e) = output::print_json(&summary) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn run_sequential(
    files: &[PathBuf],
    args: &ProcessArgs,
    config: &PipelineConfig,
    output_dir: &Path,
) -> Vec<ParticipantReport> {
    let total = files.len();
    let mut reports = Vec::with_capacity(total);

    for (i, path) in files.iter().enumerate() {
        if !args.quiet {
            eprintln!("[{}/{}] {}...", i + 1, total, path.display());
        }

        let report = run_and_report(path, args, config, output_dir);
        let failed = !report.succeeded;
        if let Some(ref err) = report.error {
            eprintln!("  Error: {}", err);
        }
        reports.push(report);

        if failed && args.fail_fast {
            break;
        }
    }

    reports
}

fn run_parallel(
    files: &[PathBuf],
    args: &ProcessArgs,
    config: &PipelineConfig,
    output_dir: &Path,
    jobs: usize,
) -> Result<Vec<ParticipantReport>, String> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| format!("Failed to start {} worker threads: {}", jobs, e))?;

    log::info!("Processing {} recordings on {} threads", files.len(), jobs);

    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let report = run_and_report(path, args, config, output_dir);
                if let Some(ref err) = report.error {
                    eprintln!("Error: {}", err);
                } else if !args.quiet {
                    eprintln!("Done: {}", path.display());
                }
                report
            })
            .collect()
    }))
}

fn run_and_report(
    path: &Path,
    args: &ProcessArgs,
    config: &PipelineConfig,
    output_dir: &Path,
) -> ParticipantReport {
    let start = Instant::now();
    let result = run_participant(path, &args.field, args.sr, config, output_dir);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let participant = participant_id(path);
    let file = path.display().to_string();
    match result {
        Ok(out) => {
            log::info!(
                "{}: {} samples, {} peaks in {:.1}ms",
                participant,
                out.num_samples(),
                out.peaks.total(),
                elapsed_ms
            );
            ParticipantReport {
                participant,
                file,
                succeeded: true,
                num_samples: Some(out.num_samples()),
                peaks: out
                    .peaks
                    .counts()
                    .into_iter()
                    .map(|(band, peaks)| BandPeaks {
                        band: band.name(),
                        peaks,
                    })
                    .collect(),
                stage: None,
                error: None,
                elapsed_ms,
            }
        }
        Err(err) => {
            log::debug!("{:?}", err);
            ParticipantReport {
                participant,
                file,
                succeeded: false,
                num_samples: None,
                peaks: Vec::new(),
                stage: Some(err.stage),
                error: Some(err.to_string()),
                elapsed_ms,
            }
        }
    }
}

/// Load, process and persist one participant. Nothing is written unless the
/// whole pipeline succeeded.
fn run_participant(
    path: &Path,
    field: &str,
    sample_rate: f64,
    config: &PipelineConfig,
    output_dir: &Path,
) -> Result<ProcessOutput, ParticipantError> {
    let participant = participant_id(path);

    let raw = load_recording(path, field, sample_rate)
        .map_err(|e| e.for_participant(&participant))?;
    let out = process(&raw, config).map_err(|e| e.for_participant(&participant))?;
    write_results(output_dir, &participant, &out).map_err(|e| e.for_participant(&participant))?;

    Ok(out)
}

/// Participant identifier: the recording's file name without extension
fn participant_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// All `*.json` files directly inside `dir`, sorted by path
fn discover_recordings(dir: &Path) -> Result<Vec<PathBuf>, String> {
    if !dir.is_dir() {
        return Err(format!("Input directory not found: {}", dir.display()));
    }
    let dir_str = dir
        .to_str()
        .ok_or_else(|| format!("Input directory is not valid UTF-8: {}", dir.display()))?;
    let pattern = format!("{}/*.json", glob::Pattern::escape(dir_str));

    let paths = glob::glob(&pattern)
        .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                log::warn!("glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}
