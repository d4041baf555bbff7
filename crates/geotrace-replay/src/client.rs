//! Minimal HTTP/1 client used to reach the collector.
//!
//! Each request opens its own TCP connection and hyper handshake, so a
//! collector restart between sends is picked up transparently.

use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body_util::Full;
use hyper::body::Incoming;
use tracing::debug;

use geotrace_core::EventRecord;

use crate::error::{ReplayError, ReplayResult};
use crate::pacer::RecordSink;

/// `host:port` to connect to for an `http://` URI.
pub fn socket_address(uri: &Uri) -> ReplayResult<String> {
    if uri.scheme_str() != Some("http") {
        return Err(ReplayError::Endpoint(format!("{uri} (only http:// is supported)")));
    }
    let authority = uri
        .authority()
        .ok_or_else(|| ReplayError::Endpoint(format!("{uri} has no host")))?;
    Ok(format!(
        "{}:{}",
        authority.host(),
        authority.port_u16().unwrap_or(80)
    ))
}

/// Send one request over a fresh connection, bounded by `timeout`.
pub(crate) async fn send_request(
    address: &str,
    req: Request<Full<Bytes>>,
    timeout: Duration,
) -> ReplayResult<Response<Incoming>> {
    let exchange = async {
        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|source| ReplayError::Connect {
                address: address.to_string(),
                source,
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "collector connection closed with error");
            }
        });

        Ok::<_, ReplayError>(sender.send_request(req).await?)
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ReplayError::Timeout(address.to_string())),
    }
}

/// Build a request with the origin-form path and a `host` header.
pub(crate) fn request_builder(
    method: http::Method,
    address: &str,
    path: &str,
) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(path)
        .header(http::header::HOST, address)
        .header(http::header::USER_AGENT, "geotrace-replay/0.1")
}

/// Posts each record as a JSON body to the collector's ingestion endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    address: String,
    path: String,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(endpoint: &str, timeout: Duration) -> ReplayResult<Self> {
        let uri: Uri = endpoint
            .parse()
            .map_err(|e| ReplayError::Endpoint(format!("{endpoint}: {e}")))?;
        let address = socket_address(&uri)?;
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        Ok(Self {
            address,
            path,
            timeout,
        })
    }

    /// `host:port` of the collector.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RecordSink for HttpSink {
    async fn send(&mut self, record: &EventRecord) -> ReplayResult<()> {
        let body = Bytes::from(serde_json::to_vec(record)?);
        let req = request_builder(http::Method::POST, &self.address, &self.path)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(body))?;

        let resp = send_request(&self.address, req, self.timeout).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReplayError::Status(status));
        }
        debug!(%status, address = %self.address, "record delivered");
        Ok(())
    }
}
