use thiserror::Error;

/// Fatal failure classes of an analysis run. Carried inside `anyhow::Error`
/// so callers can add context and still downcast to the root cause.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("schema mismatch: table `{table}` has no column `{column}`")]
    MissingColumn { table: String, column: String },

    #[error("schema mismatch: table `{table}` column `{column}` row {row}: {reason}")]
    BadValue {
        table: String,
        column: String,
        row: usize,
        reason: String,
    },

    #[error("degenerate statistics: {0}")]
    Degenerate(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::Degenerate(msg.into())
    }

    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
