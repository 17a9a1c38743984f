use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid request head: {reason}")]
    InvalidHead { reason: String },

    #[error("invalid http method: {source}")]
    InvalidMethod {
        #[from]
        source: http::method::InvalidMethod,
    },

    #[error("invalid query string: {source}")]
    InvalidQuery {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid json body: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("request body has not been collected")]
    MissingBody,
}

impl RequestError {
    pub fn invalid_head<S: ToString>(str: S) -> Self {
        Self::InvalidHead { reason: str.to_string() }
    }
}
