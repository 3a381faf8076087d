// ABOUTME: Typed error model for extraction, normalization and upload failures
// ABOUTME: Every variant is fatal for the invocation; recovery is rerunning the job

use thiserror::Error;

pub type Result<T, E = EtlError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Operator-supplied or source-supplied value could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Report payload was not in the expected encoding or file format.
    #[error("Unexpected payload from report endpoint: {0}")]
    Decoding(String),

    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(String),

    #[error("Column '{0}' not found in source data")]
    MissingColumn(String),

    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// Hint logged alongside decoding failures. The report server answers with
    /// an HTML challenge page when the firewall flags the caller as a bot.
    pub const DECODING_HINT: &'static str = "Unexpected file type returned from the report endpoint. \
        Check that you are on the city network. It's likely that your request is getting \
        flagged as a bot by the web app firewall.";

    pub fn is_decoding(&self) -> bool {
        matches!(self, EtlError::Decoding(_))
    }
}
