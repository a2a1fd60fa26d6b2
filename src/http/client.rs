//! Clients driving a mounted [`GraphQLView`].

use std::sync::Arc;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use super::body::{
    GraphQLMethod, GraphQLRequest, Headers, HttpMethod, RequestBody, build_body, build_headers,
};
use super::server::{ServerHandle, serve_local};
use super::view::{GRAPHQL_PATH, GraphQLView, ViewOptions};
use super::Response;
use crate::BerryError;

/// Uniform surface shared by HTTP test clients.
///
/// Transport failures are returned as [`BerryError::Request`]; nothing is
/// retried.
#[allow(async_fn_in_trait, reason = "implementations are used in-crate and in tests")]
pub trait HttpClient {
    /// Send a GraphQL operation to the view.
    ///
    /// GET flattens the body into query parameters. POST sends JSON, or a
    /// multipart body when `request` carries files.
    async fn graphql_request(
        &self,
        method: GraphQLMethod,
        request: &GraphQLRequest,
    ) -> Result<Response, BerryError>;

    /// [`Self::graphql_request`] with POST.
    async fn query(&self, request: &GraphQLRequest) -> Result<Response, BerryError> {
        self.graphql_request(GraphQLMethod::Post, request).await
    }

    /// A bare request to `url`, relative to the mounted application.
    async fn request(
        &self,
        url: &str,
        method: HttpMethod,
        headers: Option<&Headers>,
    ) -> Result<Response, BerryError>;

    async fn get(&self, url: &str, headers: Option<&Headers>) -> Result<Response, BerryError> {
        self.request(url, HttpMethod::Get, headers).await
    }

    /// POST either raw `data` or a `json` payload; passing both is an error.
    async fn post(
        &self,
        url: &str,
        data: Option<Bytes>,
        json: Option<&Value>,
        headers: Option<&Headers>,
    ) -> Result<Response, BerryError>;
}

/// Mounts a [`GraphQLView`] on a loopback port and talks to it over HTTP.
///
/// The server lives as long as the client.
///
/// # Examples
///
/// ```no_run
/// use berry::http::{GraphQLRequest, HttpClient, TestClient, ViewOptions};
///
/// # async fn demo() -> Result<(), berry::BerryError> {
/// let client = TestClient::new(ViewOptions::default()).await?;
/// let resp = client.query(&GraphQLRequest::new("{ hello }")).await?;
/// assert_eq!(resp.status_code, 200);
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TestClient {
    client: reqwest::Client,
    base: Url,
    server: ServerHandle,
}

impl TestClient {
    /// Start a view configured with `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be bound or the HTTP client
    /// cannot be built.
    pub async fn new(options: ViewOptions) -> Result<Self, BerryError> {
        Self::with_view(GraphQLView::new(options)).await
    }

    /// Start an already constructed view.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be bound or the HTTP client
    /// cannot be built.
    pub async fn with_view(view: GraphQLView) -> Result<Self, BerryError> {
        let server = serve_local(Arc::new(view)).await?;
        let base = Url::parse(&format!("http://{}", server.addr()))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base,
            server,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Stop the mounted server.
    pub async fn shutdown(self) {
        self.server.shutdown().await;
    }

    fn builder(
        &self,
        url: &str,
        method: HttpMethod,
        headers: Option<&Headers>,
    ) -> Result<reqwest::RequestBuilder, BerryError> {
        let url = self.base.join(url)?;
        let mut builder = self.client.request(method.into(), url);
        for (name, value) in headers.into_iter().flatten() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<Response, BerryError> {
        let resp = builder.send().await?;
        let status_code = resp.status().as_u16();
        let data = resp.bytes().await?;
        Ok(Response::new(status_code, data))
    }
}

impl HttpClient for TestClient {
    async fn graphql_request(
        &self,
        method: GraphQLMethod,
        request: &GraphQLRequest,
    ) -> Result<Response, BerryError> {
        let has_files = request.files.as_ref().is_some_and(|files| !files.is_empty());
        let body = build_body(request, method)?;
        let headers = build_headers(method, request.headers.as_ref(), has_files);
        let builder = self.builder(GRAPHQL_PATH, method.into(), Some(&headers))?;
        let builder = match body {
            None => builder,
            Some(RequestBody::Params(params)) => builder.query(&params),
            Some(RequestBody::Json(value)) => builder.body(serde_json::to_vec(&value)?),
            Some(RequestBody::Multipart { operations, map }) => {
                let mut form = Form::new()
                    .text("operations", operations)
                    .text("map", map);
                for (name, content) in request.files.iter().flatten() {
                    let part = Part::bytes(content.to_vec()).file_name(name.clone());
                    form = form.part(name.clone(), part);
                }
                builder.multipart(form)
            }
        };
        Self::send(builder).await
    }

    async fn request(
        &self,
        url: &str,
        method: HttpMethod,
        headers: Option<&Headers>,
    ) -> Result<Response, BerryError> {
        Self::send(self.builder(url, method, headers)?).await
    }

    async fn post(
        &self,
        url: &str,
        data: Option<Bytes>,
        json: Option<&Value>,
        headers: Option<&Headers>,
    ) -> Result<Response, BerryError> {
        let body = match (data, json) {
            (Some(_), Some(_)) => {
                return Err(BerryError::invalid_request(
                    "pass either raw data or a JSON payload, not both",
                ));
            }
            (Some(data), None) => Some(data),
            (None, Some(json)) => Some(Bytes::from(serde_json::to_vec(json)?)),
            (None, None) => None,
        };
        let mut merged = Headers::new();
        if json.is_some() {
            merged.insert("content-type".into(), "application/json".into());
        }
        for (name, value) in headers.into_iter().flatten() {
            merged.insert(name.to_ascii_lowercase(), value.clone());
        }
        let mut builder = self.builder(url, HttpMethod::Post, Some(&merged))?;
        if let Some(body) = body {
            builder = builder.body(body);
        }
        Self::send(builder).await
    }
}
