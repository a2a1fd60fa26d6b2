//! Loopback HTTP server mounting a [`GraphQLView`].

use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode, body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use log::{debug, warn};
use tokio::{
    net::TcpListener,
    sync::oneshot,
    task::{JoinHandle, JoinSet},
};

use super::GraphQLView;
use crate::BerryError;

/// Owns a running server; dropping it stops the accept loop.
///
/// Open connections belong to the server task and are closed when it stops.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    join: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ServerHandle {
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server to stop and wait until every connection is closed.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.join.await;
    }
}

/// Bind a listener on an ephemeral loopback port and serve `view` on it.
///
/// # Errors
///
/// Returns [`BerryError::Io`] if the port cannot be bound.
pub async fn serve_local(view: Arc<GraphQLView>) -> Result<ServerHandle, BerryError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve(view, listener)
}

/// Serve `view` on an already bound listener.
///
/// # Errors
///
/// Returns [`BerryError::Io`] if the listener address cannot be read.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! uses % internally"
)]
pub fn serve(view: Arc<GraphQLView>, listener: TcpListener) -> Result<ServerHandle, BerryError> {
    let addr = listener.local_addr()?;
    let (stop, mut rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        let builder = auto::Builder::new(TokioExecutor::new());
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((stream, peer)) => {
                        debug!("accepted connection from {peer}");
                        let io = TokioIo::new(stream);
                        let view = Arc::clone(&view);
                        let service = service_fn(move |req: Request<Incoming>| {
                            let view = Arc::clone(&view);
                            async move { Ok::<_, Infallible>(dispatch(&view, req).await) }
                        });
                        let builder = builder.clone();
                        connections.spawn(async move {
                            if let Err(e) = builder.serve_connection(io, service).await {
                                warn!("connection error: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        warn!("accept error: {e}");
                        match e.kind() {
                            ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::Interrupted
                            | ErrorKind::WouldBlock => {}
                            _ => break,
                        }
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = &mut rx => break,
            }
        }
        drop(listener);
        debug!("closing {} open connection(s)", connections.len());
        connections.shutdown().await;
    });

    Ok(ServerHandle { addr, join, stop })
}

async fn dispatch(view: &GraphQLView, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    match body.collect().await {
        Ok(collected) => view.handle(Request::from_parts(parts, collected.to_bytes())).await,
        Err(e) => {
            warn!("failed to read request body: {e}");
            let mut resp = Response::new(Full::new(Bytes::from_static(b"Bad Request")));
            *resp.status_mut() = StatusCode::BAD_REQUEST;
            resp
        }
    }
}
