// ABOUTME: HTTP health probe: GET the health endpoint over a plain TCP stream.
// ABOUTME: 2xx is healthy, other statuses unhealthy, transport errors unreachable.

use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use std::time::Instant;
use tokio::net::TcpStream;

use super::{HealthCheckResult, HealthOutcome, HealthProbe, ProbeTarget};

/// Probes a service by issuing `GET <path>` against `host:port`.
#[derive(Debug, Clone, Default)]
pub struct HttpProbe;

impl HttpProbe {
    pub fn new() -> Self {
        Self
    }

    async fn request(&self, target: &ProbeTarget) -> Result<hyper::StatusCode, ProbeError> {
        let stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection in the background
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("probe connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method("GET")
            .uri(&target.path)
            .header("Host", target.host.clone())
            .body(http_body_util::Empty::<bytes::Bytes>::new())?;

        let resp = sender.send_request(req).await?;
        let status = resp.status();

        // Drain the body; the status alone decides the outcome
        let _ = resp.into_body().collect().await;

        Ok(status)
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, target: &ProbeTarget) -> HealthCheckResult {
        let started = Instant::now();

        let outcome = match self.request(target).await {
            Ok(status) if status.is_success() => HealthOutcome::Healthy,
            Ok(_) => HealthOutcome::Unhealthy,
            Err(e) => {
                tracing::debug!(target = %target, "probe transport failure: {}", e);
                HealthOutcome::Unreachable
            }
        };

        HealthCheckResult::observed(outcome, started.elapsed())
    }
}

#[derive(Debug, thiserror::Error)]
enum ProbeError {
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),
}
