//! HTTP client for the Cartpath REST API

use crate::error::{ClientError, Result};
use crate::types::*;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the versioned Cartpath API
///
/// # Example
///
/// ```rust,no_run
/// use cartpath_client::{ApiClient, ApiConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(ApiConfig {
///     base_url: "http://localhost:8080".into(),
///     api_key: Some("secret".into()),
///     ..Default::default()
/// })?;
///
/// let stats = client.fetch_stats("u-123").await?;
/// println!("{} trips, ${:.2} saved", stats.total_trips, stats.total_savings);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ClientError::InvalidConfig(format!("API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.config.base_url.trim_end_matches('/'), path)
    }

    // ==================== Plans ====================

    /// List a user's plans, most recent first
    pub async fn fetch_plans(&self, user_id: &str) -> Result<Vec<RouteHistoryItem>> {
        let url = self.url(&format!("/users/{}/plans", urlencoding::encode(user_id)));
        debug!(%url, "Fetching plans");

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Get lifetime trip totals for a user
    pub async fn fetch_stats(&self, user_id: &str) -> Result<LifetimeStats> {
        let url = self.url(&format!("/users/{}/stats", urlencoding::encode(user_id)));
        debug!(%url, "Fetching lifetime stats");

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Persist a new plan and return its server-assigned id
    pub async fn create_plan(&self, user_id: &str, route: &RouteDetails) -> Result<String> {
        let url = self.url(&format!("/users/{}/plans", urlencoding::encode(user_id)));
        let body = CreatePlanRequest {
            route: route.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let created: CreatePlanResponse = self.handle_response(response).await?;
        if created.id.is_empty() {
            return Err(ClientError::InvalidResponse("empty plan id".to_string()));
        }
        Ok(created.id)
    }

    /// Replace a plan's route and status
    pub async fn update_plan(
        &self,
        plan_id: &str,
        route: &RouteDetails,
        status: PlanStatus,
    ) -> Result<()> {
        let url = self.url(&format!("/plans/{}", urlencoding::encode(plan_id)));
        let body = UpdatePlanRequest {
            route: route.clone(),
            status,
        };

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.expect_success(response).await
    }

    /// Delete a plan. Returns false if the server no longer had it.
    pub async fn delete_plan(&self, plan_id: &str) -> Result<bool> {
        let url = self.url(&format!("/plans/{}", urlencoding::encode(plan_id)));

        let response = self.client.delete(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server { status, message: body });
        }
        Ok(true)
    }

    // ==================== Deals ====================

    /// Fetch brand/store options for each requested item name
    pub async fn compare_items(&self, items: &[String]) -> Result<Vec<BrandGroup>> {
        let url = self.url("/deals/compare");
        let body = CompareRequest {
            items: items.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch brand/store options for a previously uploaded scan
    pub async fn scan_deals(&self, scan_id: &str) -> Result<Vec<BrandGroup>> {
        let url = self.url(&format!("/scans/{}/deals", urlencoding::encode(scan_id)));

        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    // ==================== Health ====================

    /// Check if the backend is reachable
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/health");
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    // ==================== Helper Methods ====================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().path().to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn expect_success(&self, response: reqwest::Response) -> Result<()> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().path().to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }

        Ok(())
    }
}
