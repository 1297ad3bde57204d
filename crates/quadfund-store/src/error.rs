use quadfund_core::ProjectId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached (connect, timeout, open circuit)
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Store answered with a non-success status
    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// Store answered with a body that does not fit the project schema
    #[error("store returned malformed data: {0}")]
    Decode(String),
    #[error("project {0} not found")]
    NotFound(ProjectId),
}

impl StoreError {
    /// Whether the failure means the store itself is unhealthy, which is what
    /// sends callers down the fallback chain and counts against the circuit.
    ///
    /// A 4xx answer is about the request, except for credential failures and
    /// throttling, which say the store cannot serve anyone.
    pub fn is_outage(&self) -> bool {
        match self {
            StoreError::NotFound(_) => false,
            StoreError::Rejected { status, .. } => {
                !(400..500).contains(status) || matches!(status, 401 | 403 | 429)
            }
            StoreError::Unavailable(_) | StoreError::Decode(_) => true,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}
