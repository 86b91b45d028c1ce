//! Edge proxy domain - network-first fetching with an offline response cache

mod fetcher;
mod message;
mod store;

pub use fetcher::Fetcher;
pub use message::{strip_hop_by_hop, EdgeRequest, EdgeResponse, RequestKey};
pub use store::{CacheVersion, ResponseStore};

#[cfg(test)]
pub use fetcher::MockFetcher;
