//! Container registry access and host list extraction.
//!
//! A registry lists running containers with their labels and published
//! ports. Each container contributes at most one `"ip:port"` entry: the
//! first entry of its port list, and only if that entry is published.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DiscoveryError;

/// Label holding the placement constraint, e.g. `["pool==blue"]`.
pub const CONSTRAINT_LABEL: &str = "com.docker.swarm.constraints";

/// Label naming the compose service a container belongs to.
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// Label that, when non-empty, overrides the compose service name.
pub const SERVICE_NAME_LABEL: &str = "wxhost-service-name";

/// One entry of a registry container listing.
///
/// Only the fields host extraction needs are kept; everything else in the
/// registry's answer is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "Labels", default)]
    pub labels: HashMap<String, String>,

    #[serde(rename = "Ports", default)]
    pub ports: Vec<PortBinding>,
}

/// A container port, published or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "IP", default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(rename = "PublicPort", default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
}

impl Container {
    /// The address callers should dial, from the first port entry.
    pub fn host(&self) -> Option<String> {
        let first = self.ports.first()?;
        match (&first.ip, first.public_port) {
            (Some(ip), Some(port)) => Some(format!("{ip}:{port}")),
            _ => None,
        }
    }

    /// The `(group, service)` this container is published under, if it
    /// carries both the constraint and compose service labels.
    pub fn group_and_service(&self) -> Option<(String, String)> {
        let constraint = self.labels.get(CONSTRAINT_LABEL)?;
        let compose = self.labels.get(COMPOSE_SERVICE_LABEL)?;
        let service = self
            .labels
            .get(SERVICE_NAME_LABEL)
            .filter(|name| !name.is_empty())
            .unwrap_or(compose);
        Some((pool_name(constraint).to_string(), service.clone()))
    }
}

/// Extracts the pool from a constraint such as `["pool==blue"]`.
///
/// The pool is the first run of word characters (`[A-Za-z0-9_]`) after a
/// `pool==` marker. Without such a run the whole constraint is the pool.
pub fn pool_name(constraint: &str) -> &str {
    const MARKER: &str = "pool==";
    let mut rest = constraint;
    while let Some(at) = rest.find(MARKER) {
        let tail = &rest[at + MARKER.len()..];
        let len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        if len > 0 {
            return &tail[..len];
        }
        rest = tail;
    }
    constraint
}

/// The ordered `"ip:port"` list for a container listing.
pub fn parse_host_list(containers: &[Container]) -> Vec<String> {
    containers.iter().filter_map(Container::host).collect()
}

/// Hosts grouped as `group → service → hosts`, in listing order.
///
/// A group appears as soon as one labelled container names it, even if
/// none of its containers publish a port.
pub fn group_by_service(
    containers: &[Container],
) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
    let mut groups: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    for container in containers {
        let Some((group, service)) = container.group_and_service() else {
            continue;
        };
        let services = groups.entry(group).or_default();
        if let Some(host) = container.host() {
            services.entry(service).or_default().push(host);
        }
    }
    groups
}

/// A source of container listings.
pub trait OriginRegistry: Send + Sync {
    /// Lists containers, restricted to those carrying every label in
    /// `labels` (`key=value` form). An empty slice lists everything.
    fn containers(
        &self,
        labels: &[String],
    ) -> impl Future<Output = Result<Vec<Container>, DiscoveryError>> + Send;
}

/// Settings for [`DockerRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the registry API, e.g. `http://10.0.0.2:2375`.
    pub docker_api: String,

    /// Deadline for one listing request, in milliseconds.
    pub timeout_ms: u64,

    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            docker_api: String::new(),
            timeout_ms: 5000,
            accept_invalid_certs: true,
        }
    }
}

impl SyncConfig {
    pub fn new(docker_api: impl Into<String>) -> Self {
        Self {
            docker_api: docker_api.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A Docker-compatible registry reached over HTTP.
#[derive(Debug, Clone)]
pub struct DockerRegistry {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl DockerRegistry {
    /// # Errors
    /// [`DiscoveryError::NotConfigured`] when `docker_api` is empty, or
    /// [`DiscoveryError::Registry`] if the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self, DiscoveryError> {
        let base = config.docker_api.trim_end_matches('/');
        if base.is_empty() {
            return Err(DiscoveryError::NotConfigured("docker api url"));
        }
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(0)
            .timeout(config.timeout())
            .build()
            .map_err(|e| DiscoveryError::Registry(e.to_string()))?;
        Ok(Self {
            endpoint: format!("{base}/containers/json"),
            timeout: config.timeout(),
            client,
        })
    }

    fn classify(&self, err: reqwest::Error) -> DiscoveryError {
        if err.is_timeout() {
            DiscoveryError::Timeout(self.timeout)
        } else {
            DiscoveryError::Registry(err.to_string())
        }
    }
}

/// The registry's `filters` query value for a label restriction.
pub fn label_filter(labels: &[String]) -> Result<String, DiscoveryError> {
    let mut filters = BTreeMap::new();
    filters.insert("label", labels);
    Ok(serde_json::to_string(&filters)?)
}

/// Labels selecting one service of one pool.
pub fn pool_service_labels(group: &str, service: &str) -> Vec<String> {
    vec![
        format!(r#"{CONSTRAINT_LABEL}=["pool=={group}"]"#),
        format!("{SERVICE_NAME_LABEL}={service}"),
    ]
}

impl OriginRegistry for DockerRegistry {
    async fn containers(
        &self,
        labels: &[String],
    ) -> Result<Vec<Container>, DiscoveryError> {
        let mut request = self.client.get(&self.endpoint);
        if !labels.is_empty() {
            request = request.query(&[("filters", label_filter(labels)?)]);
        }

        let body = request
            .send()
            .await
            .map_err(|e| self.classify(e))?
            .bytes()
            .await
            .map_err(|e| self.classify(e))?;

        let containers: Vec<Container> = serde_json::from_slice(&body)?;
        tracing::debug!(
            endpoint = %self.endpoint,
            filtered = !labels.is_empty(),
            count = containers.len(),
            "container listing received"
        );
        Ok(containers)
    }
}
