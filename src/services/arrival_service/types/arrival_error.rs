#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ArrivalError {
    #[error("No transit API credential is configured")]
    CredentialMissing,
    #[error("Transit API responded with status {0}")]
    UpstreamError(u16),
    #[error("Failed to reach transit API: {0}")]
    NetworkFailure(String),
    #[error("Transit API returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl ArrivalError {
    pub fn kind(&self) -> &'static str {
        match self {
            ArrivalError::CredentialMissing => "credential_missing",
            ArrivalError::UpstreamError(_) => "upstream_error",
            ArrivalError::NetworkFailure(_) => "network_failure",
            ArrivalError::InvalidResponse(_) => "invalid_response",
        }
    }
}
