// ABOUTME: Docker-backed release transport using the bollard client.
// ABOUTME: Pushes from the build host's daemon, pulls via the target host's daemon.

use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{CreateImageOptions, PushImageOptions};
use futures::StreamExt;

use crate::types::{ArtifactRef, HostAddr, RegistryRef};

use super::{ReleaseTransport, TransportError};

const DAEMON_TIMEOUT_SECS: u64 = 120;

/// Registry credentials for push and pull.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    pub server: Option<String>,
}

/// Transport over Docker-compatible daemons.
///
/// Push talks to the build host's local daemon; pull connects to the
/// target host's daemon over TCP so the image lands where it will run.
pub struct DockerTransport {
    local: Docker,
    auth: Option<RegistryAuth>,
}

impl DockerTransport {
    /// Connect to the local daemon (socket or DOCKER_HOST).
    pub fn connect_local() -> Result<Self, TransportError> {
        let local = Docker::connect_with_local_defaults()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { local, auth: None })
    }

    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    fn credentials(&self) -> Option<bollard::auth::DockerCredentials> {
        self.auth.as_ref().map(|a| bollard::auth::DockerCredentials {
            username: Some(a.username.clone()),
            password: Some(a.password.clone()),
            serveraddress: a.server.clone(),
            ..Default::default()
        })
    }

    fn connect_host(host: &HostAddr) -> Result<Docker, TransportError> {
        let address = format!("http://{}:{}", host.host(), host.port());
        Docker::connect_with_http(&address, DAEMON_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            .map_err(|e| TransportError::Connection(format!("{}: {}", host, e)))
    }
}

#[async_trait]
impl ReleaseTransport for DockerTransport {
    async fn push(&self, artifact: &ArtifactRef) -> Result<RegistryRef, TransportError> {
        let repository = match artifact.registry() {
            Some(registry) => format!("{}/{}", registry, artifact.name()),
            None => artifact.name().to_string(),
        };

        let opts = PushImageOptions {
            tag: artifact.tag().map(str::to_string),
            ..Default::default()
        };

        // Push returns a stream of progress updates - consume it
        let mut stream = self
            .local
            .push_image(&repository, Some(opts), self.credentials());
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_transport_error(e, &repository))?;
        }

        tracing::info!(artifact = %artifact, "pushed to registry");
        Ok(RegistryRef::new(artifact.to_string()))
    }

    async fn pull(
        &self,
        registry_ref: &RegistryRef,
        host: &HostAddr,
    ) -> Result<(), TransportError> {
        let remote = Self::connect_host(host)?;

        let opts = CreateImageOptions {
            from_image: Some(registry_ref.as_str().to_string()),
            ..Default::default()
        };

        let mut stream = remote.create_image(Some(opts), None, self.credentials());
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_transport_error(e, registry_ref.as_str()))?;
        }

        tracing::info!(reference = %registry_ref, host = %host, "pulled onto target host");
        Ok(())
    }
}

fn map_transport_error(e: bollard::errors::Error, reference: &str) -> TransportError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => match *status_code {
            401 | 403 => TransportError::AuthRejected(format!("{}: {}", reference, message)),
            404 => TransportError::NotFound(reference.to_string()),
            500..=599 => TransportError::Connection(format!("{}: {}", reference, message)),
            _ => TransportError::Rejected(format!("{}: {}", reference, message)),
        },
        _ => TransportError::Connection(format!("{}: {}", reference, e)),
    }
}
