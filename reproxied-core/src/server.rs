use std::{convert::Infallible, net::SocketAddr};

use hyper::{Request, body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo as HyperSocket},
    server::conn::auto::Builder,
};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::middleware::{ClientAddr, ReProxied};

/// HTTP server that accepts connections and hands every request to a [`ReProxied`]
/// middleware.
///
/// Each connection is served on its own task, HTTP/1 and HTTP/2 alike.
pub struct Server {
    /// The TCP listener for accepting incoming connections
    connection: TcpListener,
    /// Terminal handler for every request
    middleware: ReProxied,
}

impl Server {
    /// Creates a new server bound to `addr`.
    ///
    /// Binding to port `0` picks a free port; see [`Server::local_addr`].
    ///
    /// # Arguments
    ///
    /// * `addr` - The network address to bind to
    /// * `middleware` - The middleware every request is handed to
    ///
    /// # Returns
    ///
    /// Returns the bound server, or an error if the address cannot be bound.
    pub async fn new(addr: SocketAddr, middleware: ReProxied) -> anyhow::Result<Self> {
        let connection = TcpListener::bind(&addr).await?;
        debug!("Bound listener on {}", connection.local_addr()?);
        Ok(Self {
            connection,
            middleware,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.connection.local_addr()
    }

    /// Accepts a new connection and spawns a task to serve it.
    ///
    /// The peer address is attached to every request on the connection as a
    /// [`ClientAddr`] extension.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` once the connection is accepted and its task spawned,
    /// or an error if accepting fails.
    pub async fn accept(&self) -> anyhow::Result<()> {
        let (conn, address) = self.connection.accept().await?;
        debug!("Accepted connection from {}", address);
        Self::serve(self.middleware.clone(), conn, address);
        Ok(())
    }

    /// Accepts connections forever.
    ///
    /// Errors on a single accept are logged and skipped, so this never returns.
    pub async fn run(self) {
        info!(
            "Serving {} -> {}",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default(),
            self.middleware.target()
        );

        loop {
            if let Err(e) = self.accept().await {
                error!("Failed to accept connection: {}", e);
            }
        }
    }

    fn serve(middleware: ReProxied, conn: TcpStream, address: SocketAddr) {
        let io = HyperSocket::new(conn);

        tokio::spawn(async move {
            let service = service_fn(move |mut req: Request<Incoming>| {
                let middleware = middleware.clone();
                req.extensions_mut().insert(ClientAddr(address));
                async move { Ok::<_, Infallible>(middleware.handle(req).await) }
            });

            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection from {}: {:?}", address, e);
            }
        });
    }
}
