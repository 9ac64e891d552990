//! Error taxonomy for loading and analysing financial tables.

use thiserror::Error;

/// Errors raised by the loader, the aggregator and the remote narrator.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The input could not be read as a delimited table.
    #[error("Invalid data format: {0}")]
    DataFormat(String),

    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The ranking metric is not a numeric column of the table.
    #[error("Metric '{0}' is not a numeric column of the data")]
    InvalidMetric(String),

    /// The text-generation endpoint failed.
    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteService(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_requirement() {
        let err = ReportError::MissingColumn("Net_Income".to_string());
        assert_eq!(err.to_string(), "Missing required column: Net_Income");

        let err = ReportError::InvalidMetric("Sector".to_string());
        assert!(err.to_string().contains("'Sector'"));
    }
}
