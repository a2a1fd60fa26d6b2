//! Request context injected by the GraphQL view.

use std::collections::BTreeMap;

use hyper::HeaderMap;

/// Value every request context carries under `custom_value`.
pub const CUSTOM_VALUE: &str = "a value";

/// Per-request data available to resolvers through `Context::data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    pub custom_value: String,
    /// Request headers with lower-cased names. Non-UTF-8 values are skipped.
    pub headers: BTreeMap<String, String>,
}

/// Build the context for a request with the given headers.
#[must_use]
pub fn get_context(headers: &HeaderMap) -> TestContext {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();
    TestContext {
        custom_value: CUSTOM_VALUE.to_owned(),
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, USER_AGENT};

    #[test]
    fn context_carries_custom_value_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("berry-test"));
        headers.insert(
            "x-binary",
            HeaderValue::from_bytes(b"\xff").expect("opaque header value"),
        );
        let ctx = get_context(&headers);
        assert_eq!(ctx.custom_value, CUSTOM_VALUE);
        assert_eq!(
            ctx.headers.get("user-agent").map(String::as_str),
            Some("berry-test")
        );
        assert!(!ctx.headers.contains_key("x-binary"));
    }
}
