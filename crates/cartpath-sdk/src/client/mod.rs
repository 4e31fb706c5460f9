//! Backend implementations of the collaborator traits
//!
//! - `HttpBackend`: the versioned REST API via `cartpath-client`

mod http_backend;

pub use http_backend::HttpBackend;
