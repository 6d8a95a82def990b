use thiserror::Error;

#[derive(Error, Debug)]
pub enum EegError {
    #[error("Invalid sample rate: {0} Hz (must be finite and above {min} Hz)", min = crate::types::MIN_SAMPLE_RATE_HZ)]
    InvalidSampleRate(f64),

    #[error("Non-finite sample at channel {channel}, index {sample}")]
    NonFiniteInput { channel: usize, sample: usize },

    #[error("Invalid band range for {band}: {low}-{high} Hz with Nyquist at {nyquist} Hz")]
    InvalidBandRange {
        band: String,
        low: f64,
        high: f64,
        nyquist: f64,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl EegError {
    /// Name of the processing stage that produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            EegError::InvalidSampleRate(_) => "band-limit",
            EegError::NonFiniteInput { .. } => "compression",
            EegError::InvalidBandRange { .. } => "band-decomposition",
            EegError::InvalidParameter(_) => "config",
            EegError::MalformedInput(_) | EegError::JsonError(_) => "load",
            EegError::IoError(_) | EegError::CsvError(_) => "io",
        }
    }

    /// Attach the participant this error belongs to
    pub fn for_participant(self, participant: impl Into<String>) -> ParticipantError {
        ParticipantError {
            participant: participant.into(),
            stage: self.stage(),
            source: self,
        }
    }
}

/// A pipeline failure scoped to one participant of a batch
#[derive(Error, Debug)]
#[error("participant {participant}: {stage} failed: {source}")]
pub struct ParticipantError {
    pub participant: String,
    pub stage: &'static str,
    #[source]
    pub source: EegError,
}

pub type Result<T> = std::result::Result<T, EegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_error_context() {
        let err = EegError::NonFiniteInput {
            channel: 2,
            sample: 40,
        }
        .for_participant("sub-03");

        assert_eq!(err.participant, "sub-03");
        assert_eq!(err.stage, "compression");
        assert_eq!(
            err.to_string(),
            "participant sub-03: compression failed: Non-finite sample at channel 2, index 40"
        );
    }

    #[test]
    fn test_sample_rate_message() {
        let msg = EegError::InvalidSampleRate(80.0).to_string();
        assert_eq!(msg, "Invalid sample rate: 80 Hz (must be finite and above 100 Hz)");
    }
}
