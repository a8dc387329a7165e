//! The sync loop body: poll the registry, publish what changed.

use std::collections::BTreeMap;

use crate::gate::PublishGate;
use crate::registry::{OriginRegistry, group_by_service, parse_host_list, pool_service_labels};
use crate::store::{HOST_LIST_TTL, HostStore, store_key};
use crate::DiscoveryError;

/// Outcome of one [`HostSync::sync_all`] pass for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    /// Services seen in the listing.
    pub services: usize,
    /// Services whose host list was published.
    pub changed: usize,
}

/// Publishes registry host lists into a [`HostStore`].
///
/// ```rust,no_run
/// use yar_discovery::{DockerRegistry, HostSync, MemoryHostStore, SyncConfig};
///
/// # async fn run() -> Result<(), yar_discovery::DiscoveryError> {
/// let registry = DockerRegistry::new(&SyncConfig::new("http://10.0.0.2:2375"))?;
/// let mut sync = HostSync::new(registry, MemoryHostStore::new());
/// sync.sync_all().await?;
/// let hosts = sync.hosts("blue", "user").await?;
/// # Ok(())
/// # }
/// ```
pub struct HostSync<R, S> {
    registry: R,
    store: S,
    gate: PublishGate,
}

impl<R: OriginRegistry, S: HostStore> HostSync<R, S> {
    pub fn new(registry: R, store: S) -> Self {
        Self {
            registry,
            store,
            gate: PublishGate::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists every container once and publishes each `(group, service)`
    /// host list that changed since the last pass.
    ///
    /// A list is only recorded as published after the store accepted it,
    /// so a failed write is retried on the next pass.
    pub async fn sync_all(
        &mut self,
    ) -> Result<BTreeMap<String, GroupSummary>, DiscoveryError> {
        let containers = self.registry.containers(&[]).await?;
        let groups = group_by_service(&containers);

        let mut summary = BTreeMap::new();
        for (group, services) in &groups {
            let mut changed = 0;
            for (service, hosts) in services {
                let Some(digest) = self.gate.check(group, service, hosts)? else {
                    continue;
                };
                self.publish(group, service, hosts).await?;
                self.gate.record(group, service, digest);
                changed += 1;
            }
            tracing::info!(group, services = services.len(), changed, "host lists synced");
            summary.insert(
                group.clone(),
                GroupSummary {
                    services: services.len(),
                    changed,
                },
            );
        }
        Ok(summary)
    }

    /// Lists the containers of one service in one pool, publishes their
    /// hosts unconditionally, and returns them.
    pub async fn sync_service(
        &self,
        group: &str,
        service: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let labels = pool_service_labels(group, service);
        let containers = self.registry.containers(&labels).await?;
        let hosts = parse_host_list(&containers);
        self.publish(group, service, &hosts).await?;
        Ok(hosts)
    }

    /// The last published host list for a service, if any is live.
    pub async fn hosts(
        &self,
        group: &str,
        service: &str,
    ) -> Result<Option<Vec<String>>, DiscoveryError> {
        let Some(raw) = self.store.get(&store_key(group, service)).await? else {
            tracing::debug!(group, service, "no published host list");
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn publish(
        &self,
        group: &str,
        service: &str,
        hosts: &[String],
    ) -> Result<(), DiscoveryError> {
        let value = serde_json::to_string(hosts)?;
        self.store
            .set(&store_key(group, service), value, HOST_LIST_TTL)
            .await?;
        tracing::debug!(group, service, hosts = hosts.len(), "host list published");
        Ok(())
    }
}
