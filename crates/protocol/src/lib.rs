//! # Direxplorer Protocol Library
//!
//! Wire types shared by the Direxplorer daemon and its clients.
//!
//! The daemon exposes a home directory over HTTP. Every listing, search and
//! status body it returns is defined here so the server and any Rust client
//! agree on field names and fixed texts.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{BrowseResponse, DirectoryItem};
//!
//! let response = BrowseResponse::new(vec![DirectoryItem::file("b.txt", "a/b.txt", 10)]);
//! let json = serde_json::to_string(&response).unwrap();
//! assert!(json.contains(r#""type":"File""#));
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Request/response bodies and fixed texts

pub mod messages;

pub use messages::{
    text, BrowseResponse, DirectoryItem, ErrorResponse, HealthResponse, HomeResponse, HomeUpdated,
    ItemType, MessageResponse, SearchResponse, API_SCOPE,
};
