//! REST-backed plan and deal APIs

use crate::error::Result;
use crate::traits::{DealApi, PlanApi};
use async_trait::async_trait;
use cartpath_client::{
    ApiClient, ApiConfig, BrandGroup, LifetimeStats, PlanStatus, RouteDetails, RouteHistoryItem,
};
use tracing::debug;

/// Adapts the HTTP `ApiClient` to the SDK's collaborator traits
///
/// # Example
///
/// ```rust,ignore
/// use cartpath_sdk::{HttpBackend, RouteCache, MemoryStore};
/// use std::sync::Arc;
///
/// let backend = Arc::new(HttpBackend::connect(ApiConfig {
///     base_url: "https://api.cartpath.example".into(),
///     ..Default::default()
/// })?);
///
/// let cache = RouteCache::new(backend.clone(), Arc::new(MemoryStore::new()));
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    /// Wrap an existing client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Build a client from configuration
    pub fn connect(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(ApiClient::new(config)?))
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl PlanApi for HttpBackend {
    async fn fetch_plans(&self, user_id: &str) -> Result<Vec<RouteHistoryItem>> {
        Ok(self.client.fetch_plans(user_id).await?)
    }

    async fn fetch_stats(&self, user_id: &str) -> Result<LifetimeStats> {
        Ok(self.client.fetch_stats(user_id).await?)
    }

    async fn create_plan(&self, user_id: &str, route: &RouteDetails) -> Result<String> {
        Ok(self.client.create_plan(user_id, route).await?)
    }

    async fn update_plan(&self, plan_id: &str, route: &RouteDetails, status: PlanStatus) -> Result<()> {
        Ok(self.client.update_plan(plan_id, route, status).await?)
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        if !self.client.delete_plan(plan_id).await? {
            debug!(plan_id, "Plan already absent on server");
        }
        Ok(())
    }
}

#[async_trait]
impl DealApi for HttpBackend {
    async fn compare_items(&self, items: &[String]) -> Result<Vec<BrandGroup>> {
        Ok(self.client.compare_items(items).await?)
    }

    async fn scan_deals(&self, scan_id: &str) -> Result<Vec<BrandGroup>> {
        Ok(self.client.scan_deals(scan_id).await?)
    }
}
