//! Cartpath SDK - client core for deal discovery and shopping plans
//!
//! The backend owns deal matching, pricing and route optimization. This crate
//! owns what the client keeps for itself:
//!
//! - **Watchlist**: item names the user wants deal alerts for
//! - **Route cache**: the user's plan history, reconciled with the backend
//! - **Deal selection**: picking one brand/store option per requested item
//!
//! Each store is an explicitly constructed value with a single owner; share
//! it with `Arc`. Backends and local storage are injected through traits so
//! the stores can run against fakes in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartpath_sdk::{ApiConfig, HttpBackend, MemoryStore, RouteCache, WatchlistStore};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(HttpBackend::connect(ApiConfig::default())?);
//! let store = Arc::new(MemoryStore::new());
//!
//! let routes = RouteCache::new(backend.clone(), store.clone());
//! routes.load_cached();
//! routes.sign_in("u-123");
//! routes.refresh_history().await?;
//!
//! let watchlist = WatchlistStore::load(store);
//! watchlist.save_item("Oat Milk");
//! watchlist.refresh_deals(backend.as_ref()).await?;
//! ```

// Collaborator interfaces
pub mod traits;

// Backend implementations
#[cfg(feature = "client")]
pub mod client;

// Local key-value storage
pub mod store;

// Core stores
pub mod watchlist;
pub mod routes;
pub mod deals;

// Error types
pub mod error;

// Re-export core traits
pub use traits::{DealApi, PlanApi};

// Re-export client types
#[cfg(feature = "client")]
pub use client::HttpBackend;

// Re-export store types
pub use store::{KeyValueStore, MemoryStore};
#[cfg(feature = "native")]
pub use store::SqliteStore;

// Re-export core stores
pub use deals::{auto_select, select_for_group, DealSelection, SelectionStrategy};
pub use routes::RouteCache;
pub use watchlist::WatchlistStore;

// Re-export error types
pub use error::{Result, SdkError};

// Re-export wire types from the API client
pub use cartpath_client::{
    ApiConfig, BrandGroup, BrandItem, LifetimeStats, PlanStatus, RouteDetails, RouteHistoryItem,
    RouteItem, RouteStore, WatchlistItem,
};
