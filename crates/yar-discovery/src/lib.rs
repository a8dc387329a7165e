//! Host list publication for Yar service discovery.
//!
//! Callers of a Yar service usually know it by `(group, service)`, not by
//! address. This crate keeps a shared store of `"ip:port"` lists per
//! service, filled from a container registry:
//!
//! - [`OriginRegistry`] / [`DockerRegistry`]: where container listings
//!   come from.
//! - [`parse_host_list`] / [`group_by_service`]: listings to host lists.
//! - [`PublishGate`]: skips lists that have not changed.
//! - [`HostStore`] / [`RedisHostStore`] / [`MemoryHostStore`]: where lists
//!   are published, under [`store_key`] with a seven-day expiry.
//! - [`HostSync`]: ties them together.

mod error;
mod gate;
mod redis_store;
mod registry;
mod store;
mod sync;

pub use error::DiscoveryError;
pub use gate::PublishGate;
pub use redis_store::{RedisConfig, RedisHostStore};
pub use registry::{
    COMPOSE_SERVICE_LABEL, CONSTRAINT_LABEL, Container, DockerRegistry,
    OriginRegistry, PortBinding, SERVICE_NAME_LABEL, SyncConfig,
    group_by_service, label_filter, parse_host_list, pool_name,
    pool_service_labels,
};
pub use store::{HOST_LIST_TTL, HostStore, KEY_PREFIX, MemoryHostStore, store_key};
pub use sync::{GroupSummary, HostSync};
