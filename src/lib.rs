//! Test scaffolding for a GraphQL server.
//!
//! [`exceptions`] installs a panic hook that renders schema-definition errors
//! as rich diagnostics, and [`http`] mounts a GraphQL view behind a loopback
//! server so tests can drive it through the [`http::HttpClient`] surface.

mod bool_predicates;
pub mod cli_args;
pub mod config;
pub mod context;
pub mod environment;
mod error;
pub mod exceptions;
pub mod http;
pub mod schema;
pub mod test_utils;

pub use cli_args::{Cli, Commands, ServeArgs};
pub use error::BerryError;
pub use exceptions::SchemaError;
