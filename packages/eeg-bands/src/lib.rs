pub mod bands;
pub mod compress;
pub mod error;
pub mod filters;
pub mod loader;
pub mod mmap_utils;
pub mod peaks;
pub mod pipeline;
pub mod profiling;
pub mod sink;
pub mod types;

pub use error::{EegError, ParticipantError, Result};
pub use loader::{load_recording, DEFAULT_DATA_FIELD};
pub use pipeline::{process, process_recording, PipelineConfig};
pub use sink::write_results;
pub use types::*;
