//! HTTP test-client adapter for the GraphQL view.
//!
//! A [`TestClient`] mounts a [`GraphQLView`] on a loopback port and exposes
//! the [`HttpClient`] surface: GraphQL operations over GET or POST (JSON or
//! multipart with files) plus bare requests to any path. Every call returns
//! a [`Response`] carrying the status code and raw body.

mod body;
mod client;
mod response;
mod server;
mod view;

pub use body::{
    Files, GraphQLMethod, GraphQLRequest, Headers, HttpMethod, RequestBody, Variables, build_body,
    build_file_map, build_headers,
};
pub use client::{HttpClient, TestClient};
pub use response::Response;
pub use server::{ServerHandle, serve, serve_local};
pub use view::{GRAPHQL_PATH, GraphQLView, JsonEncoder, ResultOverride, ViewOptions};
