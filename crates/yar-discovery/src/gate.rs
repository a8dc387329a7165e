//! Change detection for published host lists.

use std::collections::HashMap;

use crate::DiscoveryError;

/// Remembers the last published list per `group_service` and lets a list
/// through only when it differs.
///
/// The digest is the hex form of the list's JSON encoding, so a reordered
/// list counts as a change.
#[derive(Debug, Default)]
pub struct PublishGate {
    digests: HashMap<String, String>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(group: &str, service: &str) -> String {
        format!("{group}_{service}")
    }

    /// Digest of a host list.
    pub fn digest(hosts: &[String]) -> Result<String, DiscoveryError> {
        Ok(hex::encode(serde_json::to_vec(hosts)?))
    }

    /// Returns the new digest if `hosts` differs from the last recorded
    /// list for this service, `None` if it is unchanged.
    pub fn check(
        &self,
        group: &str,
        service: &str,
        hosts: &[String],
    ) -> Result<Option<String>, DiscoveryError> {
        let digest = Self::digest(hosts)?;
        let unchanged = self
            .digests
            .get(&Self::key(group, service))
            .is_some_and(|last| *last == digest);
        Ok((!unchanged).then_some(digest))
    }

    /// Records `digest` as published for this service.
    pub fn record(&mut self, group: &str, service: &str, digest: String) {
        self.digests.insert(Self::key(group, service), digest);
    }

    /// Number of services with a recorded digest.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
