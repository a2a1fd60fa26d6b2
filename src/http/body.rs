//! Request construction for GraphQL operations.
//!
//! One [`GraphQLRequest`] can be sent as a GET query string, a JSON POST
//! body, or a multipart POST when files are attached. The helpers here
//! decide the shape; the transport lives in [`super::client`].

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::BerryError;

/// GraphQL variables, always a JSON object.
pub type Variables = Map<String, Value>;
/// Uploaded files as `(part name, content)`, in attachment order.
pub type Files = Vec<(String, Bytes)>;
/// Request headers. Names are compared case-insensitively.
pub type Headers = BTreeMap<String, String>;

/// Methods a GraphQL operation can be sent with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphQLMethod {
    Get,
    Post,
}

/// Methods accepted by the generic request helper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl From<GraphQLMethod> for HttpMethod {
    fn from(method: GraphQLMethod) -> Self {
        match method {
            GraphQLMethod::Get => Self::Get,
            GraphQLMethod::Post => Self::Post,
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// A GraphQL operation together with its attachments.
///
/// # Examples
///
/// ```
/// use berry::http::GraphQLRequest;
/// use serde_json::{Map, json};
///
/// let mut vars = Map::new();
/// vars.insert("name".into(), json!("berry"));
/// let request = GraphQLRequest::new("query($name: String) { hello(name: $name) }")
///     .variables(vars)
///     .header("X-Trace", "1");
/// assert!(request.files.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphQLRequest {
    pub query: Option<String>,
    pub variables: Option<Variables>,
    pub operation_name: Option<String>,
    pub files: Option<Files>,
    pub headers: Option<Headers>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Attach a file under the multipart part `name`.
    ///
    /// Re-attaching an existing name replaces its content in place, so list
    /// variables keep pairing with files in attachment order.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content = content.into();
        let files = self.files.get_or_insert_with(Files::new);
        match files.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = content,
            None => files.push((name, content)),
        }
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    fn has_files(&self) -> bool {
        self.files.as_ref().is_some_and(|files| !files.is_empty())
    }
}

/// The encoded form of a [`GraphQLRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Query-string parameters for GET. Non-string values are JSON-encoded.
    Params(Vec<(String, String)>),
    /// JSON body for POST.
    Json(Value),
    /// Multipart fields for POST with files; the files follow as parts.
    Multipart { operations: String, map: String },
}

/// Encode `request` for `method`.
///
/// Returns `Ok(None)` when the request carries no query at all.
///
/// # Errors
///
/// Returns [`BerryError::InvalidRequest`] when variables or files are given
/// without a query or files are sent over GET. Multipart bodies also fail
/// when there are no variables to map files into, or when a list variable
/// has more entries than there are attached files.
pub fn build_body(
    request: &GraphQLRequest,
    method: GraphQLMethod,
) -> Result<Option<RequestBody>, BerryError> {
    let Some(query) = &request.query else {
        if request.variables.is_some() || request.files.is_some() {
            return Err(BerryError::invalid_request(
                "variables and files need a query",
            ));
        }
        return Ok(None);
    };

    let mut body = Map::new();
    body.insert("query".into(), Value::String(query.clone()));
    if let Some(variables) = request.variables.as_ref().filter(|v| !v.is_empty()) {
        body.insert("variables".into(), Value::Object(variables.clone()));
    }
    if let Some(name) = &request.operation_name {
        body.insert("operationName".into(), Value::String(name.clone()));
    }

    match (method, request.has_files()) {
        (GraphQLMethod::Get, true) => Err(BerryError::invalid_request(
            "file uploads must be sent with POST",
        )),
        (GraphQLMethod::Get, false) => Ok(Some(RequestBody::Params(
            body.into_iter()
                .map(|(key, value)| match value {
                    Value::String(text) => (key, text),
                    other => (key, other.to_string()),
                })
                .collect(),
        ))),
        (GraphQLMethod::Post, false) => Ok(Some(RequestBody::Json(Value::Object(body)))),
        (GraphQLMethod::Post, true) => {
            let variables = request.variables.as_ref().ok_or_else(|| {
                BerryError::invalid_request("file uploads need variables to map files into")
            })?;
            let files = request.files.as_deref().unwrap_or_default();
            let map = build_file_map(variables, files)?;
            Ok(Some(RequestBody::Multipart {
                operations: serde_json::to_string(&body)?,
                map: serde_json::to_string(&map)?,
            }))
        }
    }
}

/// Map multipart part names to the variable paths they fill.
///
/// A list variable takes the attached files in order, one per element,
/// starting again from the first file for every list. An empty list maps
/// nothing. An object variable is treated as a folder: its first key names
/// the nested value, which is then mapped the same way. Any other variable
/// is filled by the part carrying its own name.
///
/// # Errors
///
/// Returns [`BerryError::InvalidRequest`] when a list has more elements than
/// there are files.
///
/// # Examples
///
/// ```
/// use berry::http::build_file_map;
/// use bytes::Bytes;
/// use serde_json::json;
///
/// let vars = json!({ "textFile": null, "files": [null, null] });
/// let files = vec![
///     ("file1".to_owned(), Bytes::from_static(b"a")),
///     ("file2".to_owned(), Bytes::from_static(b"b")),
/// ];
/// let map = build_file_map(vars.as_object().expect("object"), &files).expect("map");
/// assert_eq!(map["textFile"], ["variables.textFile"]);
/// assert_eq!(map["file2"], ["variables.files.1"]);
/// ```
pub fn build_file_map(
    variables: &Variables,
    files: &[(String, Bytes)],
) -> Result<BTreeMap<String, Vec<String>>, BerryError> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in variables {
        let (path, value) = match value {
            Value::Object(folder) => match folder.iter().next() {
                Some((folder_key, inner)) => (format!("{key}.{folder_key}"), inner),
                None => (key.clone(), value),
            },
            _ => (key.clone(), value),
        };
        if let Value::Array(items) = value {
            let mut names = files.iter().map(|(name, _)| name);
            for index in 0..items.len() {
                let name = names.next().ok_or_else(|| {
                    BerryError::invalid_request(format!(
                        "`{path}` lists {} files but only {} are attached",
                        items.len(),
                        files.len()
                    ))
                })?;
                map.entry(name.clone())
                    .or_default()
                    .push(format!("variables.{path}.{index}"));
            }
        } else {
            map.insert(path.clone(), vec![format!("variables.{path}")]);
        }
    }
    Ok(map)
}

/// Headers to send for a GraphQL request.
///
/// A POST without files is declared as JSON. Caller headers are applied on
/// top and win, whatever their case; names are lower-cased.
#[must_use]
pub fn build_headers(method: GraphQLMethod, headers: Option<&Headers>, has_files: bool) -> Headers {
    let mut out = Headers::new();
    if method == GraphQLMethod::Post && !has_files {
        out.insert("content-type".into(), "application/json".into());
    }
    for (name, value) in headers.into_iter().flatten() {
        out.insert(name.to_ascii_lowercase(), value.clone());
    }
    out
}
