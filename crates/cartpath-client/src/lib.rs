//! Rust client for the Cartpath deals and shopping-plan API
//!
//! # Example
//!
//! ```rust,no_run
//! use cartpath_client::{ApiClient, ApiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiConfig {
//!     base_url: "http://localhost:8080".into(),
//!     ..Default::default()
//! })?;
//!
//! // Plans for a user, most recent first
//! let plans = client.fetch_plans("u-123").await?;
//!
//! // Compare deals for a few items
//! let groups = client.compare_items(&["milk".to_string(), "eggs".to_string()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use types::*;
