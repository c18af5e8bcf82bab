//! VPC resolution for load balancer subnets

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use crate::cache::ApiCache;
use crate::client::{ClientError, SubnetClient};
use crate::config::CacheConfig;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("Empty subnet list provided to VPC lookup")]
    EmptySubnets,
    #[error("DescribeSubnets returned no subnets")]
    NoSubnetsReturned,
    #[error("Network API error: {0}")]
    Client(#[from] ClientError),
}

/// Resolves the VPC a set of subnets belongs to, caching the result
pub struct VpcResolver {
    client: Arc<dyn SubnetClient>,
    cache: ApiCache<String>,
    ttl: Duration,
}

impl VpcResolver {
    pub fn new(client: Arc<dyn SubnetClient>, ttl: Duration) -> Self {
        Self {
            client,
            cache: ApiCache::new("vpc"),
            ttl,
        }
    }

    pub fn from_config(client: Arc<dyn SubnetClient>, config: &CacheConfig) -> Self {
        Self {
            client,
            cache: ApiCache::with_capacity("vpc", config.max_entries),
            ttl: config.vpc_ttl(),
        }
    }

    /// VPC id of the given subnets.
    ///
    /// Subnets of one load balancer always share a VPC, so the result is
    /// cached under the first subnet id.
    #[instrument(skip(self))]
    pub async fn vpc_id(&self, subnet_ids: &[String]) -> Result<String, NetworkError> {
        let first = subnet_ids.first().ok_or(NetworkError::EmptySubnets)?;
        let key = format!("{first}-vpc");

        self.cache
            .get_or_try_fetch(&key, self.ttl, || async {
                let subnets = self.client.describe_subnets(subnet_ids).await?;
                let subnet = subnets.into_iter().next().ok_or(NetworkError::NoSubnetsReturned)?;
                Ok::<_, NetworkError>(subnet.vpc_id)
            })
            .await
    }

    pub fn cache(&self) -> &ApiCache<String> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::client::{MockSubnetClient, Subnet};

    fn subnets(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_subnets_rejected_without_call() {
        let client = MockSubnetClient::new();
        let resolver = VpcResolver::new(Arc::new(client), Duration::from_secs(3600));

        let err = resolver.vpc_id(&[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::EmptySubnets));
    }

    #[tokio::test]
    async fn test_lookup_is_cached() {
        let mut client = MockSubnetClient::new();
        client
            .expect_describe_subnets()
            .withf(|ids| ids.len() == 2 && ids[0] == "subnet-1" && ids[1] == "subnet-2")
            .times(1)
            .returning(|_| {
                Ok(vec![Subnet {
                    subnet_id: "subnet-1".to_string(),
                    vpc_id: "vpc-abc".to_string(),
                }])
            });
        let resolver = VpcResolver::new(Arc::new(client), Duration::from_secs(3600));
        let ids = subnets(&["subnet-1", "subnet-2"]);

        assert_eq!(resolver.vpc_id(&ids).await.unwrap(), "vpc-abc");
        assert_eq!(resolver.vpc_id(&ids).await.unwrap(), "vpc-abc");
        assert_eq!(resolver.cache().stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(
            resolver.cache().get("subnet-1-vpc").await.as_deref(),
            Some("vpc-abc")
        );
    }

    #[tokio::test]
    async fn test_no_subnets_returned() {
        let mut client = MockSubnetClient::new();
        client
            .expect_describe_subnets()
            .times(1)
            .returning(|_| Ok(vec![]));
        let resolver = VpcResolver::new(Arc::new(client), Duration::from_secs(3600));

        let err = resolver.vpc_id(&subnets(&["subnet-1"])).await.unwrap_err();
        assert!(matches!(err, NetworkError::NoSubnetsReturned));
        assert!(resolver.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_client_error_propagated() {
        let mut client = MockSubnetClient::new();
        client
            .expect_describe_subnets()
            .times(1)
            .returning(|_| Err(ClientError::Transport("connection reset".to_string())));
        let resolver =
            VpcResolver::from_config(Arc::new(client), &CacheConfig::default());

        let err = resolver.vpc_id(&subnets(&["subnet-1"])).await.unwrap_err();
        assert!(matches!(err, NetworkError::Client(ClientError::Transport(_))));
        assert_eq!(resolver.cache().stats().misses, 0);
    }
}
