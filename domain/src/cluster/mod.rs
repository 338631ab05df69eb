//! Cluster identity and routing.
//!
//! - [`entities::ClusterConfig`]: one addressable cluster (name, agent endpoint, aliases)
//! - [`registry::ClusterRegistry`]: the immutable set of configured clusters plus
//!   the normalized term index built once per load
//! - [`router::ClusterRouter`]: maps free text to the cluster(s) it mentions

pub mod entities;
pub mod registry;
pub mod router;
