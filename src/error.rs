use thiserror::Error;

/// Rejections raised before any job is launched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("job name must not be empty")]
    EmptyName,

    #[error("duplicate job name: {0}")]
    DuplicateName(String),

    #[error("concurrency budget must be at least 1")]
    ZeroBudget,
}

/// Errors that stop an orchestration run outright.
///
/// A failing job is never one of these: job failures are recorded in the
/// run report. Everything here means the catalog was malformed or the host
/// environment (display, runtime) is broken.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid catalog: {0}")]
    Validation(#[from] CatalogError),

    #[error("progress display failed: {0}")]
    Render(#[from] std::io::Error),

    #[error("admission control closed while jobs were queued")]
    AdmissionClosed,

    #[error("job {job} cannot move from {from} to {to}")]
    InvalidTransition {
        job: String,
        from: String,
        to: String,
    },

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl OrchestrationError {
    /// True when the error comes from the host environment rather than from
    /// the caller's input.
    pub fn is_environment(&self) -> bool {
        !matches!(self, OrchestrationError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::DuplicateName("desktop-desktop-qt6-debug".into());
        assert_eq!(err.to_string(), "duplicate job name: desktop-desktop-qt6-debug");
        assert_eq!(
            CatalogError::ZeroBudget.to_string(),
            "concurrency budget must be at least 1"
        );
    }

    #[test]
    fn validation_is_not_environment() {
        let err = OrchestrationError::from(CatalogError::EmptyName);
        assert!(!err.is_environment());
        assert_eq!(err.to_string(), "invalid catalog: job name must not be empty");

        let err = OrchestrationError::from(std::io::Error::other("broken pipe"));
        assert!(err.is_environment());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OrchestrationError>();
    }
}
