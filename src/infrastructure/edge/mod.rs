//! Edge proxy implementations

mod http_fetcher;
mod network_first;
mod store;

pub use http_fetcher::HttpFetcher;
pub use network_first::{
    Activation, EdgeOutcome, FetchStage, NetworkFirst, ResponseSource, DEFAULT_API_PREFIX,
};
pub use store::InMemoryResponseStore;
