use crate::models::diagnostics::DiagnosticEvent;

/// Destination for failures the core swallows to keep the stream running.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Default sink: every swallowed failure becomes a `warn!` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        log::warn!("{}", event);
    }
}
