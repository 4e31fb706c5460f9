//! Wire types for the Cartpath API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend (without the `/api/v1` prefix)
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ==================== Watchlist ====================

pub const DEFAULT_WATCH_STATUS: &str = "Watching prices...";
pub const DEFAULT_WATCH_SUBTITLE: &str = "Checking deals...";
pub const DEFAULT_ICON_TYPE: &str = "tag";

/// An item name the user wants deal notifications for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: String,
    pub name: String,
    pub status: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default = "default_icon_type")]
    pub icon_type: String,
}

fn default_icon_type() -> String {
    DEFAULT_ICON_TYPE.to_string()
}

impl WatchlistItem {
    /// A freshly watched item with the default labels
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: DEFAULT_WATCH_STATUS.to_string(),
            subtitle: DEFAULT_WATCH_SUBTITLE.to_string(),
            badge: None,
            icon_type: default_icon_type(),
        }
    }

    /// Case-insensitive name comparison, the watchlist identity key
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

// ==================== Routes ====================

/// Store names that denote a catch-all stop rather than a physical store
pub const CATCH_ALL_STORES: [&str; 2] = ["Other items", "Other Stores"];

/// One item to pick up at a stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aisle: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub checked: bool,
}

/// One store visit within a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStore {
    /// 1-based position in the route
    pub sequence: u32,
    pub store: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub items: Vec<RouteItem>,
}

impl RouteStore {
    pub fn is_catch_all(&self) -> bool {
        CATCH_ALL_STORES.contains(&self.store.as_str())
    }
}

/// A computed multi-stop shopping route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetails {
    #[serde(default)]
    pub total_savings: f64,
    #[serde(default)]
    pub est_time: String,
    #[serde(default)]
    pub stops: Vec<RouteStore>,
}

impl RouteDetails {
    /// Sum of item savings across all stops
    pub fn items_savings(&self) -> f64 {
        self.stops
            .iter()
            .flat_map(|stop| stop.items.iter())
            .map(|item| item.savings)
            .sum()
    }

    pub fn recompute_savings(&mut self) {
        self.total_savings = self.items_savings();
    }

    /// Keep only the items whose id is in `ids`, drop emptied stops and
    /// recompute the total savings.
    pub fn retain_items(&mut self, ids: &HashSet<String>) {
        for stop in &mut self.stops {
            stop.items.retain(|item| ids.contains(&item.id));
        }
        self.stops.retain(|stop| !stop.items.is_empty());
        self.recompute_savings();
    }

    pub fn item_count(&self) -> usize {
        self.stops.iter().map(|stop| stop.items.len()).sum()
    }

    pub fn checked_item_ids(&self) -> HashSet<String> {
        self.stops
            .iter()
            .flat_map(|stop| stop.items.iter())
            .filter(|item| item.checked)
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut RouteItem> {
        self.stops
            .iter_mut()
            .flat_map(|stop| stop.items.iter_mut())
            .find(|item| item.id == item_id)
    }
}

/// Plan lifecycle status. Only `active` and `completed` drive behavior;
/// anything else the server sends is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanStatus {
    Active,
    Completed,
    Other(String),
}

impl PlanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for PlanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::Other(s),
        }
    }
}

impl From<PlanStatus> for String {
    fn from(status: PlanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A saved shopping plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHistoryItem {
    pub id: String,
    pub route: RouteDetails,
    pub date: DateTime<Utc>,
    pub status: PlanStatus,
}

/// Server-aggregated totals across a user's plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    #[serde(default)]
    pub total_trips: u32,
    #[serde(default)]
    pub total_savings: f64,
}

/// Request body for plan creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    pub route: RouteDetails,
}

/// Response from plan creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanResponse {
    pub id: String,
}

/// Request body for plan updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePlanRequest {
    pub route: RouteDetails,
    pub status: PlanStatus,
}

// ==================== Deals ====================

/// Status value the backend uses for groups with at least one deal
pub const DEAL_FOUND: &str = "DEAL_FOUND";

/// One brand/store option for a requested item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandItem {
    pub id: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub est_time: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

impl BrandItem {
    /// Whole-percent discount against the original price, if both are known
    pub fn discount_percent(&self) -> Option<u32> {
        match (self.price, self.original_price) {
            (Some(price), Some(original)) if original > 0.0 && price < original => {
                Some(((original - price) / original * 100.0).round() as u32)
            }
            _ => None,
        }
    }
}

/// All options found for one requested item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandGroup {
    pub item_name: String,
    #[serde(default)]
    pub item_details: String,
    pub status: String,
    #[serde(default)]
    pub options: Vec<BrandItem>,
}

impl BrandGroup {
    pub fn has_deal(&self) -> bool {
        self.status == DEAL_FOUND
    }
}

/// Request body for deal comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub items: Vec<String>,
}

/// Response from the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
