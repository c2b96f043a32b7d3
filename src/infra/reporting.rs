use crate::domain::ports::ErrorReporter;
use crate::error::AppError;
use tracing::error;

/// Reports unexpected failures to the log pipeline at ERROR level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: &str, err: &AppError) {
        error!(context, error = ?err, "unexpected failure");
    }
}
