//! AsterDB SDK: client library for the AsterDB graph database
//!
//! Everything the SDK does is one HTTP request against a remote AsterDB
//! server: data access through [`Connection`] (SPARQL queries,
//! transactions, export), administration through [`Admin`] (databases,
//! users, roles, virtual graphs, data sources), and a typed view over
//! SPARQL SELECT results through [`SelectResult`].
//!
//! The transport is synchronous; [`aio::AsyncHttpClient`] offers the same
//! request surface for async callers, with identical error mapping.
//!
//! # Quick Start
//!
//! ```no_run
//! use asterdb_sdk::{ClientOptions, Connection, QueryOptions, SelectResult};
//!
//! fn main() -> asterdb_sdk::AsterResult<()> {
//!     let options = ClientOptions::new("http://localhost:5830")
//!         .with_credentials("admin", "admin");
//!
//!     let conn = Connection::new("movies", &options)?;
//!     let raw = conn.select("select * { ?s ?p ?o } limit 5", &QueryOptions::default())?;
//!     let results = SelectResult::new(raw)?;
//!
//!     println!("{} rows", results.len());
//!     for binding in &results {
//!         println!("{}", binding["s"]);
//!     }
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod aio;
pub mod client;
pub mod connection;
pub mod content;
pub mod content_types;
pub mod error;
pub mod models;
pub mod results;

// ============================================================
// Core SDK types
// ============================================================

pub use client::{ClientOptions, HttpClient};
pub use connection::{Connection, Docs, GraphQl, Icv, IcvReportOptions, QueryOptions};
pub use error::{AsterError, AsterResult, Fault};

// ============================================================
// Administration
// ============================================================

pub use admin::{Admin, DataSource, Database, Role, StoredQuery, User, VirtualGraph};

// ============================================================
// Content descriptors
// ============================================================

pub use content::{Content, ImportData, Mappings};
pub use content_types::ImportFormat;

// ============================================================
// Query results
// ============================================================

pub use models::{CommitResult, NamespaceBinding, Permission, StoredQueryDetails};
pub use results::{BindingSet, RdfTerm, SelectResult};

// ============================================================
// Async transport
// ============================================================

pub use aio::AsyncHttpClient;
