//! In-process server instance bound to an ephemeral port

use std::net::SocketAddr;

use ink_config::Config;
use ink_server::Server;
use tokio_util::sync::CancellationToken;

/// A running server under test, stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    stop: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Build the service from `config` and serve it on 127.0.0.1:0
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(config).await?;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stop = CancellationToken::new();
        let stopped = stop.clone();
        tokio::spawn(async move {
            let serve = axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move { stopped.cancelled().await });
            if let Err(e) = serve.await {
                eprintln!("test server exited with error: {e}");
            }
        });

        Ok(Self {
            addr,
            stop,
            client: reqwest::Client::new(),
        })
    }

    /// Absolute URL for `path` on the running server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Shared HTTP client for requests against this server
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
