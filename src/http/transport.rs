//! Stream transport to the target site
//!
//! A [`Transport`] owns at most one open connection. Connections come from a
//! [`Connector`], which is TLS ([`RustlsConnector`]) in production and plain
//! TCP ([`TcpConnector`]) against local servers. Every blocking operation is
//! bounded by a timeout so a stalled peer turns into a retryable error.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};

/// Size of a single receive
pub const RECV_BUFFER_SIZE: usize = 16384;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport-level failures; all of them are recovered by reconnecting
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("connection closed by peer")]
    Closed,

    #[error("not connected")]
    NotConnected,

    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Bidirectional byte stream returned by a connector
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

pub type BoxedStream = Box<dyn ByteStream>;

/// Opens fresh connections to one endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<BoxedStream, TransportError>;

    /// Human readable endpoint, for logs
    fn endpoint(&self) -> String;
}

/// Plain TCP connector
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<BoxedStream, TransportError> {
        let stream = connect_tcp(&self.host, self.port).await?;
        Ok(Box::new(stream))
    }

    fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }
}

/// TLS connector verifying the server against the webpki root store
#[derive(Clone)]
pub struct RustlsConnector {
    host: String,
    port: u16,
    server_name: ServerName,
    connector: tokio_rustls::TlsConnector,
}

impl RustlsConnector {
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        let mut root_store = RootCertStore::empty();
        root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));

        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name = ServerName::try_from(host)
            .map_err(|_| TransportError::InvalidServerName(host.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port,
            server_name,
            connector: tokio_rustls::TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait]
impl Connector for RustlsConnector {
    async fn connect(&self) -> Result<BoxedStream, TransportError> {
        let tcp = connect_tcp(&self.host, self.port).await?;
        let tls = self
            .connector
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(|source| TransportError::Connect {
                addr: format!("{}:{}", self.host, self.port),
                source,
            })?;
        Ok(Box::new(tls))
    }

    fn endpoint(&self) -> String {
        format!("tls://{}:{}", self.host, self.port)
    }
}

async fn connect_tcp(host: &str, port: u16) -> Result<TcpStream, TransportError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| TransportError::Connect {
            addr: format!("{}:{}", host, port),
            source,
        })?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// A single reconnectable connection
pub struct Transport {
    connector: Box<dyn Connector>,
    stream: Option<BoxedStream>,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl Transport {
    pub fn new(
        connector: Box<dyn Connector>,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            stream: None,
            connect_timeout,
            io_timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens a fresh connection, closing the previous one first
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.close().await;

        tracing::debug!("Connecting to {}", self.connector.endpoint());
        let stream = tokio::time::timeout(self.connect_timeout, self.connector.connect())
            .await
            .map_err(|_| TransportError::Timeout {
                operation: "connect",
            })??;

        self.stream = Some(stream);
        Ok(())
    }

    /// Closes the current connection, if any
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone; the descriptor is released on drop either way
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, stream.shutdown()).await;
        }
    }

    /// Writes a complete request
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let write = async {
            stream.write_all(bytes).await?;
            stream.flush().await
        };
        tokio::time::timeout(self.io_timeout, write)
            .await
            .map_err(|_| TransportError::Timeout { operation: "send" })??;
        Ok(())
    }

    /// Waits for the next chunk of response data
    ///
    /// A chunk is not necessarily a whole HTTP message. End of stream is
    /// reported as [`TransportError::Closed`].
    pub async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let read = tokio::time::timeout(self.io_timeout, stream.read(&mut buffer))
            .await
            .map_err(|_| TransportError::Timeout {
                operation: "receive",
            })??;

        if read == 0 {
            return Err(TransportError::Closed);
        }
        buffer.truncate(read);
        Ok(buffer)
    }
}
