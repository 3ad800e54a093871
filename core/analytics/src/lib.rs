pub mod aggregator;
pub mod cache;
pub mod config;
pub mod keys;
pub mod peer;
pub mod sphere;

pub use aggregator::{aggregate, sum_aggregates};
pub use cache::AggregateCache;
pub use config::{AnalyticsConfig, ConfigError};
pub use keys::{
    peer_key_catalog, resolve_peer_key, resolve_sphere_key, sphere_key_catalog,
    KEY_SCHEME_VERSION,
};
pub use peer::{compare_to_peers, peer_samples, PeerComparator, PeerSample};
pub use sphere::{compare_spheres, dominant_sphere, rank_spheres, SphereComparator};
