// Error taxonomy for a single analysis run.
//
// Every variant is terminal for the run that produced it; the only
// recoverable case is a per-record `InvalidInput`, which the derivation step
// collects into `RejectedRecord`s instead of returning.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("invalid record '{supplier}': {reason}")]
    InvalidInput { supplier: String, reason: String },

    #[error("no usable supplier records in batch")]
    EmptyBatch,

    #[error("unreadable source data: {detail}")]
    SourceFormat { detail: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("pdf export failed: {detail}")]
    Export { detail: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl KpiError {
    pub fn invalid(supplier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            supplier: supplier.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for KpiError {
    fn from(err: csv::Error) -> Self {
        // csv wraps io failures; keep those distinct from malformed content.
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::SourceFormat {
                    detail: format!("{other:?}"),
                },
            }
        } else {
            Self::SourceFormat {
                detail: err.to_string(),
            }
        }
    }
}

impl From<calamine::Error> for KpiError {
    fn from(err: calamine::Error) -> Self {
        match err {
            calamine::Error::Io(io) => Self::Io(io),
            other => Self::SourceFormat {
                detail: other.to_string(),
            },
        }
    }
}

impl From<printpdf::Error> for KpiError {
    fn from(err: printpdf::Error) -> Self {
        Self::Export {
            detail: err.to_string(),
        }
    }
}
