//! HTTP listener.
//!
//! A plain hyper/1 HTTP/1.1 server: accept connections in a loop, spawn a
//! task per connection, and stop accepting when a ctrl-c arrives. In-flight
//! connections finish on their own tasks.

use crate::error::Result;
use crate::routes::Router;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Bind and serve until a ctrl-c arrives.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or accepting fails.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let router = Arc::new(router);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, remote) = result?;
                debug!(%remote, "accepted connection");

                let service = RequestService {
                    router: Arc::clone(&router),
                };

                tokio::task::spawn(async move {
                    let io = TokioIo::new(stream);
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %err, "connection error");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, stopping listener");
                break;
            }
        }
    }

    Ok(())
}

/// Service implementation for hyper.
struct RequestService {
    router: Arc<Router>,
}

impl Service<hyper::Request<Incoming>> for RequestService {
    type Response = hyper::Response<Full<Bytes>>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
        let router = Arc::clone(&self.router);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body_bytes = body.collect().await?.to_bytes();

            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let response = router
                .dispatch(&parts.method, &parts.uri, content_type.as_deref(), &body_bytes)
                .await;

            Ok(response)
        })
    }
}
