use crate::foundation::ids::CaseId;

/// Convenience result type used across skelqc.
pub type QcResult<T> = Result<T, QcError>;

/// One case whose render job did not produce a usable artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseFailure {
    /// Case the job was rendering.
    pub case: CaseId,
    /// Engine or verification message.
    pub reason: String,
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum QcError {
    /// Malformed run configuration (coordinate spec, worker count, engine spec).
    #[error("config error: {0}")]
    Config(String),

    /// Case list or image directories missing, unreadable, or unmatched.
    #[error("discovery error: {0}")]
    Discovery(String),

    /// A single engine invocation failed.
    #[error("render error: {0}")]
    RenderJob(String),

    /// Aggregate of every failed case in a render pass.
    #[error("render error: {} case(s) failed: {}", .failed.len(), describe_failures(.failed))]
    Render {
        /// Failed cases in case order.
        failed: Vec<CaseFailure>,
    },

    /// Failure while writing the HTML report.
    #[error("report write error: {0}")]
    ReportWrite(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QcError {
    /// Build a [`QcError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`QcError::Discovery`] value.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Build a [`QcError::RenderJob`] value.
    pub fn render_job(msg: impl Into<String>) -> Self {
        Self::RenderJob(msg.into())
    }

    /// Build a [`QcError::ReportWrite`] value.
    pub fn report_write(msg: impl Into<String>) -> Self {
        Self::ReportWrite(msg.into())
    }

    /// Failed cases carried by an aggregate render error, empty otherwise.
    pub fn failed_cases(&self) -> &[CaseFailure] {
        match self {
            Self::Render { failed } => failed,
            _ => &[],
        }
    }
}

fn describe_failures(failed: &[CaseFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{} ({})", f.case, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
