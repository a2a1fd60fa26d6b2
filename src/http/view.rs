//! The GraphQL view mounted by [`super::TestClient`] and `berry serve`.
//!
//! [`GraphQLView::handle`] turns a buffered `hyper` request into a response
//! without any I/O of its own, so it can be driven directly in tests or
//! behind the loopback server.

use std::fmt;
use std::sync::Arc;

use async_graphql::http::{GraphiQLSource, MultipartOptions, parse_query_string, receive_body};
use async_graphql::parser::{parse_query, types::OperationType};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, StatusCode};
use log::{debug, warn};
use serde_json::Value;

use crate::context::get_context;
use crate::schema::{AppSchema, build_schema};

/// Path the view answers on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Replaces the default processing of an execution result.
pub type ResultOverride = Arc<dyn Fn(&async_graphql::Response) -> Value + Send + Sync>;

/// Serialises the processed result into the response body.
pub type JsonEncoder = fn(&Value) -> serde_json::Result<Vec<u8>>;

fn encode_compact(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// Behaviour switches for [`GraphQLView`].
#[derive(Clone)]
pub struct ViewOptions {
    /// Serve GraphiQL to browsers on a bare GET.
    pub graphiql: bool,
    pub allow_queries_via_get: bool,
    pub json_encoder: JsonEncoder,
    pub result_override: Option<ResultOverride>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            graphiql: true,
            allow_queries_via_get: true,
            json_encoder: encode_compact,
            result_override: None,
        }
    }
}

impl fmt::Debug for ViewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewOptions")
            .field("graphiql", &self.graphiql)
            .field("allow_queries_via_get", &self.allow_queries_via_get)
            .field("result_override", &self.result_override.is_some())
            .finish_non_exhaustive()
    }
}

impl ViewOptions {
    #[must_use]
    pub fn graphiql(mut self, enabled: bool) -> Self {
        self.graphiql = enabled;
        self
    }

    #[must_use]
    pub fn allow_queries_via_get(mut self, allowed: bool) -> Self {
        self.allow_queries_via_get = allowed;
        self
    }

    #[must_use]
    pub fn json_encoder(mut self, encoder: JsonEncoder) -> Self {
        self.json_encoder = encoder;
        self
    }

    #[must_use]
    pub fn result_override<F>(mut self, f: F) -> Self
    where
        F: Fn(&async_graphql::Response) -> Value + Send + Sync + 'static,
    {
        self.result_override = Some(Arc::new(f));
        self
    }
}

/// Executes GraphQL requests against the demo schema.
pub struct GraphQLView {
    schema: AppSchema,
    options: ViewOptions,
}

type HttpResponse = hyper::Response<Full<Bytes>>;

impl GraphQLView {
    #[must_use]
    pub fn new(options: ViewOptions) -> Self {
        Self::with_schema(build_schema(), options)
    }

    #[must_use]
    pub const fn with_schema(schema: AppSchema, options: ViewOptions) -> Self {
        Self { schema, options }
    }

    #[must_use]
    pub const fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// Answer one request.
    pub async fn handle(&self, req: Request<Bytes>) -> HttpResponse {
        debug!("{} {}", req.method(), req.uri());
        if req.uri().path() != GRAPHQL_PATH {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }
        match *req.method() {
            Method::GET => self.handle_get(&req).await,
            Method::POST => self.handle_post(&req).await,
            _ => plain(
                StatusCode::METHOD_NOT_ALLOWED,
                "GraphQL only supports GET and POST requests.",
            ),
        }
    }

    async fn handle_get(&self, req: &Request<Bytes>) -> HttpResponse {
        let query_string = req.uri().query().unwrap_or_default();
        let has_query = url::form_urlencoded::parse(query_string.as_bytes())
            .any(|(key, _)| key == "query");
        if !has_query && accepts_html(req) {
            if !self.options.graphiql {
                return plain(StatusCode::NOT_FOUND, "Not Found");
            }
            let page = GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish();
            return with_type(StatusCode::OK, "text/html; charset=utf-8", page.into());
        }
        if !has_query {
            return plain(StatusCode::BAD_REQUEST, "No GraphQL query found in the request");
        }
        if !self.options.allow_queries_via_get {
            return plain(StatusCode::BAD_REQUEST, "queries are not allowed when using GET");
        }
        let request = match parse_query_string(query_string) {
            Ok(request) => request,
            Err(e) => return plain(StatusCode::BAD_REQUEST, &e.to_string()),
        };
        if is_mutation(&request) {
            return plain(StatusCode::BAD_REQUEST, "mutations are not allowed when using GET");
        }
        self.execute(req, request).await
    }

    async fn handle_post(&self, req: &Request<Bytes>) -> HttpResponse {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let request = if content_type.starts_with("application/json") {
            match serde_json::from_slice::<async_graphql::Request>(req.body()) {
                Ok(request) => request,
                Err(e) => {
                    debug!("rejected JSON body: {e}");
                    return plain(
                        StatusCode::BAD_REQUEST,
                        "Unable to parse request body as JSON",
                    );
                }
            }
        } else if content_type.starts_with("multipart/form-data") {
            let body = req.body().as_ref();
            match receive_body(Some(content_type), body, MultipartOptions::default()).await {
                Ok(request) => request,
                Err(e) => return plain(StatusCode::BAD_REQUEST, &e.to_string()),
            }
        } else {
            return plain(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type");
        };
        self.execute(req, request).await
    }

    async fn execute(
        &self,
        req: &Request<Bytes>,
        request: async_graphql::Request,
    ) -> HttpResponse {
        let request = request.data(get_context(req.headers()));
        let response = self.schema.execute(request).await;
        let result = match &self.options.result_override {
            Some(process) => process(&response),
            None => match serde_json::to_value(&response) {
                Ok(value) => value,
                Err(e) => return internal_error(&e),
            },
        };
        match (self.options.json_encoder)(&result) {
            Ok(body) => with_type(StatusCode::OK, "application/json", body.into()),
            Err(e) => internal_error(&e),
        }
    }
}

fn accepts_html(req: &Request<Bytes>) -> bool {
    req.headers()
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("text/html") || value.contains("*/*"))
}

/// Whether the operation selected by `request` is a mutation.
///
/// Unparseable documents return `false` and are reported by execution.
fn is_mutation(request: &async_graphql::Request) -> bool {
    let Ok(document) = parse_query(&request.query) else {
        return false;
    };
    let wanted = request.operation_name.as_deref();
    document
        .operations
        .iter()
        .find(|(name, _)| wanted.is_none() || name.map(|n| n.as_str()) == wanted)
        .is_some_and(|(_, op)| op.node.ty == OperationType::Mutation)
}

fn with_type(status: StatusCode, content_type: &'static str, body: Bytes) -> HttpResponse {
    let mut resp = hyper::Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

fn plain(status: StatusCode, message: &str) -> HttpResponse {
    with_type(
        status,
        "text/plain; charset=utf-8",
        Bytes::copy_from_slice(message.as_bytes()),
    )
}

fn internal_error(err: &serde_json::Error) -> HttpResponse {
    warn!("failed to encode GraphQL result: {err}");
    plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
