//! Collaborator interfaces the core depends on
//!
//! The stores never talk HTTP directly. They go through these traits so that
//! tests can script backend behavior and so the transport can be swapped.

use crate::error::Result;
use async_trait::async_trait;
use cartpath_client::{BrandGroup, LifetimeStats, PlanStatus, RouteDetails, RouteHistoryItem};

/// Plan persistence on the backend
#[async_trait]
pub trait PlanApi: Send + Sync {
    /// All plans for a user, in the backend's order (most recent first)
    async fn fetch_plans(&self, user_id: &str) -> Result<Vec<RouteHistoryItem>>;

    /// Lifetime totals for a user
    async fn fetch_stats(&self, user_id: &str) -> Result<LifetimeStats>;

    /// Store a new plan and return the server-assigned id
    async fn create_plan(&self, user_id: &str, route: &RouteDetails) -> Result<String>;

    /// Replace the route and status of an existing plan
    async fn update_plan(&self, plan_id: &str, route: &RouteDetails, status: PlanStatus) -> Result<()>;

    /// Remove a plan
    async fn delete_plan(&self, plan_id: &str) -> Result<()>;
}

/// Deal lookups on the backend
#[async_trait]
pub trait DealApi: Send + Sync {
    /// Brand/store options for each requested item name
    async fn compare_items(&self, items: &[String]) -> Result<Vec<BrandGroup>>;

    /// Brand/store options for a scanned item or receipt
    async fn scan_deals(&self, scan_id: &str) -> Result<Vec<BrandGroup>>;
}
