use crate::gateway::UpstreamError;

/// Error type for import workflows
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The social graph rejected a call.
    #[error("Facebook error: {}", .0.message())]
    Graph(UpstreamError),
    /// The dashboard rejected a call; shown with its raw error text.
    #[error("{}", .0.message())]
    Dashboard(UpstreamError),
    /// The workflow was invoked for something the store does not hold.
    /// Raised before any signal is emitted.
    #[error("{0}")]
    Precondition(String),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ImportError {
    /// Text shown to the operator and carried by failure signals.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, ImportError::Precondition(_))
    }
}
