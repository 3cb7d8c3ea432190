mod http;
#[cfg(test)]
pub(crate) mod scripted;

use crate::core::error::TransportError;
use crate::core::models::{DescribeInstancesResponse, FilterParams};
use async_trait::async_trait;

pub use http::HttpInventory;

/// The remote inventory capability a client queries.
///
/// Implementations resolve each call exactly once, with either the raw
/// response or the error that prevented it. Retries, timeouts and signing
/// belong to the implementation.
#[async_trait]
pub trait InstanceInventory: Send + Sync {
    fn name(&self) -> &'static str;
    async fn describe_instances(
        &self,
        params: &FilterParams,
    ) -> Result<DescribeInstancesResponse, TransportError>;
}
