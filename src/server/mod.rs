//! The dashboard's HTTP server.
//!
//! Every request is handled as one interaction: an optional submission is appended, then the
//! store is re-read in full and the view recomputed. Interactions never overlap.

mod routes;

pub(crate) use routes::App;

use crate::error::Res;
use crate::store::Store;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, trace, warn};

/// Serves the dashboard for `store` on `addr` until Ctrl-C is pressed.
pub(crate) async fn run<S>(store: S, addr: SocketAddr) -> Res<()>
where
    S: Store + 'static,
{
    let app = App::new(store);
    app.initialize().await?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!(
        "Dashboard running at http://{}, press Ctrl-C to stop",
        listener.local_addr()?
    );
    serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Accepts connections on `listener` until `shutdown` completes.
pub(crate) async fn serve<F>(listener: TcpListener, app: App, shutdown: F) -> Res<()>
where
    F: Future<Output = ()>,
{
    let app = Arc::new(app);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept a connection: {e}");
                        continue;
                    }
                };
                trace!("Connection from {peer}");
                let app = app.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let app = app.clone();
                        async move { Ok::<_, Infallible>(app.handle(req).await) }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("Connection from {peer} ended with an error: {e}");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutting down the dashboard");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = App::new(MemoryStore::new());
        app.initialize().await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, app, async {
            let _ = rx.await;
        }));

        let health = request(
            addr,
            "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(health.starts_with("HTTP/1.1 200 OK"));
        assert!(health.ends_with("ok"));

        let body = "date=2023-01-05&sales=1000&expenses=400&region=North&product=Electronics";
        let posted = request(
            addr,
            &format!(
                "POST /api/records HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
                 Content-Type: application/x-www-form-urlencoded\r\n\
                 Content-Length: {}\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(posted.starts_with("HTTP/1.1 200 OK"));
        assert!(posted.contains("\"total_sales\":\"$1,000.00\""));

        let missing = request(
            addr,
            "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(missing.starts_with("HTTP/1.1 404 Not Found"));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
