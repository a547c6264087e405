//! # DbFlare Client
//!
//! An async Rust client for the DbFlare remote data-access HTTP service.
//! DbFlare exposes CRUD-like operations (`zinsert`, `zupdate`, `zdelete`,
//! `zget`) over REST endpoints that answer with JSON envelopes; this crate
//! builds the requests, dispatches them, and projects the envelopes into
//! whatever shape the caller asked for.
//!
//! ## Features
//!
//! - **Envelope decoding**: bare values, `{"data": ...}` / `{"result": ...}`
//!   wrappers, and `{"errors": [...]}` payloads are all handled by one
//!   unwrap algorithm, parameterized by the payload key
//! - **Shape coercion**: typed objects, generic maps, lists, JSON
//!   primitives, raw JSON text, or caller-supplied assemblers
//! - **Pagination**: caller-owned `Paging` receives the server-reported
//!   total for list queries
//! - **Verb remapping**: updates and deletes can run over POST/GET for
//!   backends that block PUT/DELETE
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dbflare_client::{ClientConfig, DbFlareClient, Paging, Result, ValueMap};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://dbflare.example.com")
//!         .api_key_required(true)
//!         .api_key("secret")
//!         .build();
//!     let client = DbFlareClient::new(config)?;
//!
//!     let mut query = ValueMap::new();
//!     query.insert("status".into(), "open".into());
//!
//!     let mut paging = Paging::new(1, 0, 25);
//!     let orders = client
//!         .zget_list_map_paged("orders", &query, &mut paging)
//!         .await?;
//!     println!("{} of {} orders", orders.len(), paging.total);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Result pagination
pub mod paging;

/// Registered wire conversions (timestamps, base64 binaries)
pub mod codec;

/// Response envelope decoding
pub mod envelope;

/// Shape coercion of decoded envelopes
pub mod coerce;

/// Request construction
pub mod request;

/// Async HTTP transport
pub mod transport;

/// The DbFlare client
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ClientConfig, ClientConfigBuilder, DbFlareClient};
pub use coerce::{Coercer, ObjectAssembler};
pub use error::{Error, Result, ResultExt};
pub use paging::{Page, Paging};
pub use request::{Operation, RequestSpec, VerbOverrides};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportConfig};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
