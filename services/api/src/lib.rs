//! HTTP surface of the Tubely video service
//!
//! Bearer-authenticated routes for creating video records, uploading their
//! content through the ingestion pipeline and reading them back with signed
//! URLs.

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
