use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI provider returned an unexpected response: {0}")]
    BadResponse(String),

    #[error("no AI provider configured")]
    Unconfigured,
}

impl AiError {
    /// The shared retry helper calls this to decide whether to retry —
    /// only network-level failures and 429/503 are worth a second try.
    pub fn is_retriable(&self) -> bool {
        match self {
            AiError::Request(err) => {
                err.is_timeout()
                    || err
                        .status()
                        .map(|s| s.as_u16() == 429 || s.as_u16() == 503)
                        .unwrap_or(true)
            }
            _ => false,
        }
    }
}

impl From<AiError> for codemesh_core::CoreError {
    fn from(err: AiError) -> Self {
        codemesh_core::CoreError::ExternalDependency(err.to_string())
    }
}
