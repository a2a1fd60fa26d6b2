//! Entry point for the `berry` binary.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use berry::config::load_serve_args;
use berry::http::{GRAPHQL_PATH, GraphQLView, serve};
use berry::schema::build_schema;
use berry::{BerryError, Cli, Commands, ServeArgs, exceptions};
use clap::Parser;
use log::{error, info};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let _hook = exceptions::install();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BerryError> {
    match cli.command {
        Commands::Serve(args) => serve_view(load_serve_args(&args)?).await,
        Commands::ExportSchema => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", build_schema().sdl())?;
            Ok(())
        }
    }
}

async fn serve_view(args: ServeArgs) -> Result<(), BerryError> {
    let listener = TcpListener::bind((args.host(), args.port())).await?;
    let server = serve(Arc::new(GraphQLView::new(args.view_options())), listener)?;
    info!("serving GraphQL on http://{}{GRAPHQL_PATH}", server.addr());
    println!("Running at http://{}{GRAPHQL_PATH}", server.addr());
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await;
    Ok(())
}
