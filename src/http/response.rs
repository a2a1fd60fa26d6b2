//! Status and body of a completed request.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::BerryError;

const BODY_SNIPPET_LEN: usize = 500;

/// What an [`HttpClient`](super::HttpClient) hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub data: Bytes,
}

impl Response {
    #[must_use]
    pub const fn new(status_code: u16, data: Bytes) -> Self {
        Self { status_code, data }
    }

    /// The body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BerryError::BadResponseSerde`] naming the failing path and
    /// quoting the start of the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BerryError> {
        let mut de = serde_json::Deserializer::from_slice(&self.data);
        serde_path_to_error::deserialize(&mut de).map_err(|e| {
            let path = e.path().to_string();
            let inner = e.into_inner();
            BerryError::BadResponseSerde {
                status: self.status_code,
                message: format!("{inner} at {path}").into(),
                snippet: snippet(&self.text(), BODY_SNIPPET_LEN).into(),
            }
        })
    }
}

fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let mut out = text.chars().take(max).collect::<String>();
        out.push_str("...");
        out
    }
}
