//! Retrieval API
//!
//! HTTP front for the retrieval domain: snippet upsert, semantic search,
//! delete and collection reset over Qdrant, with embeddings from an
//! OpenAI-compatible endpoint.
//!
//! ## Startup
//!
//! ```text
//! bind listener ──► serve /health, /v1/*, /metrics, /swagger-ui
//!        │
//!        └──► bootstrap (dimension probe, Qdrant health, ensure collections)
//!                 │
//!                 └──► publish service ──► /v1/* stop answering 503
//! ```
//!
//! ## Modules
//!
//! - `config`: environment configuration
//! - `server`: router assembly and lifecycle

pub mod config;
pub mod server;

pub use config::Config;
pub use server::{build_router, run};
