use thiserror::Error;

#[derive(Debug, Error)]
pub enum SonicPesaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach SonicPesa: {0}")]
    RestRequestError(String),
    #[error("SonicPesa did not respond in time: {0}")]
    Timeout(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {message}")]
    JsonError { message: String, payload: String },
    #[error("Query failed. Error {status}.")]
    QueryError { status: u16, payload: String },
    #[error("SonicPesa rejected the request: {message}")]
    Rejected { message: String, payload: String },
}

impl SonicPesaApiError {
    /// The raw response body, where the provider sent one. Only intended for diagnostic logging.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::JsonError { payload, .. } | Self::QueryError { payload, .. } | Self::Rejected { payload, .. } => {
                Some(payload.as_str())
            },
            _ => None,
        }
    }
}
