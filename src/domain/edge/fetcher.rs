//! Network seam of the edge proxy

use async_trait::async_trait;

use super::message::{EdgeRequest, EdgeResponse};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Sends a request to the origin.
///
/// Any HTTP status is a response; only transport failures (refused
/// connection, reset, DNS) are errors, reported as `DomainError::Upstream`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: EdgeRequest) -> Result<EdgeResponse, DomainError>;
}
