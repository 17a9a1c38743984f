use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("missing header: {key}")]
    MissingKey { key: String },
}

impl HeaderError {
    pub fn missing_key<S: ToString>(key: S) -> Self {
        Self::MissingKey { key: key.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("redirect url must be a string, status: {status}")]
    InvalidRedirectContent { status: StatusCode },

    #[error("unknown charset: {charset}")]
    UnknownCharset { charset: String },

    #[error("content can not be encoded with charset {charset}")]
    UnencodableContent { charset: String },

    #[error("json content must be an object")]
    NotAnObject,

    #[error("invalid response part: {source}")]
    Http {
        #[from]
        source: http::Error,
    },

    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl ResponseError {
    pub fn invalid_redirect_content(status: StatusCode) -> Self {
        Self::InvalidRedirectContent { status }
    }

    pub fn unknown_charset<S: ToString>(charset: S) -> Self {
        Self::UnknownCharset { charset: charset.to_string() }
    }

    pub fn unencodable_content<S: ToString>(charset: S) -> Self {
        Self::UnencodableContent { charset: charset.to_string() }
    }
}
