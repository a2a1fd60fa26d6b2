//! Command-line argument structures.
//!
//! Isolates clap derivations so lint expectations remain scoped, keeping
//! `main.rs` focused on runtime logic.

use std::net::{IpAddr, Ipv4Addr};

use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::http::ViewOptions;

/// Port used by `berry serve` when none is configured.
pub const DEFAULT_PORT: u16 = 8000;

/// Top-level parser for the `berry` binary.
#[derive(Parser, Debug)]
#[command(name = "berry", version, about = "Serve and inspect the berry GraphQL view")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the GraphQL view over HTTP
    Serve(ServeArgs),
    /// Print the schema in SDL form
    ExportSchema,
}

/// Parameters accepted by the `serve` sub-command.
///
/// Values merge defaults < `[cmds.serve]` in `.berry.toml` < `BERRYCMDS_SERVE_*`
/// environment variables < command-line flags.
#[derive(Parser, Deserialize, Serialize, Default, Debug, OrthoConfig, Clone)]
#[command(name = "serve")]
#[ortho_config(prefix = "BERRY")]
pub struct ServeArgs {
    /// Address to bind (defaults to 127.0.0.1)
    #[arg(long)]
    pub host: Option<IpAddr>,
    /// Port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
    /// Do not serve GraphiQL to browsers
    #[arg(long)]
    // `crate::bool_predicates::not` stops false CLI defaults overriding config.
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub no_graphiql: bool,
    /// Reject queries sent with GET
    #[arg(long)]
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub no_queries_via_get: bool,
}

impl ServeArgs {
    #[must_use]
    pub fn host(&self) -> IpAddr {
        self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// View behaviour selected by the switches.
    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions::default()
            .graphiql(!self.no_graphiql)
            .allow_queries_via_get(!self.no_queries_via_get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_bind_loopback() {
        let args = ServeArgs::default();
        assert_eq!(args.host(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(args.port(), DEFAULT_PORT);
        let options = args.view_options();
        assert!(options.graphiql);
        assert!(options.allow_queries_via_get);
    }

    #[rstest]
    #[case(&["berry", "serve", "--no-graphiql"], false, true)]
    #[case(&["berry", "serve", "--no-queries-via-get"], true, false)]
    #[case(&["berry", "serve", "--port", "9000", "--host", "0.0.0.0"], true, true)]
    fn parses_serve_flags(#[case] argv: &[&str], #[case] graphiql: bool, #[case] via_get: bool) {
        let cli = Cli::try_parse_from(argv).expect("parse args");
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let options = args.view_options();
        assert_eq!(options.graphiql, graphiql);
        assert_eq!(options.allow_queries_via_get, via_get);
    }

    #[test]
    fn unset_switches_are_not_serialised() {
        let value = serde_json::to_value(ServeArgs::default()).expect("serialise");
        assert!(value.get("no_graphiql").is_none());
        assert!(value.get("no_queries_via_get").is_none());
    }

    #[test]
    fn parses_export_schema() {
        let cli = Cli::try_parse_from(["berry", "export-schema"]).expect("parse args");
        assert!(matches!(cli.command, Commands::ExportSchema));
    }
}
