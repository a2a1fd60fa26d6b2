//! Error type shared by the HTTP adapter, the view server and the binary.

use thiserror::Error;

/// Errors returned by library functions.
///
/// The adapter is a pass-through shim: transport failures surface as
/// [`BerryError::Request`] without retries or translation.
#[derive(Error, Debug)]
#[allow(clippy::module_name_repetitions, reason = "exported at the crate root")]
pub enum BerryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request failed when running {context}: {source}")]
    RequestContext {
        context: Box<str>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(Box<str>),
    #[error("malformed response (status {status}): {message}; snippet: {snippet}")]
    BadResponseSerde {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error("serialisation failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(Box<ortho_config::OrthoError>),
}

impl BerryError {
    pub(crate) fn invalid_request(message: impl Into<Box<str>>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<ortho_config::OrthoError> for BerryError {
    fn from(err: ortho_config::OrthoError) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<url::ParseError> for BerryError {
    fn from(err: url::ParseError) -> Self {
        Self::RequestContext {
            context: "build request URL".into(),
            source: Box::new(err),
        }
    }
}
