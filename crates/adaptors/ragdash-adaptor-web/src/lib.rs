//! Web adaptor for the RAG file dashboard
//!
//! Serves the login, dashboard and upload pages and proxies the `/api/files`
//! endpoints to the RAG API behind an admin session.

#![warn(clippy::all)]

pub mod extract;
pub mod gate;
pub mod handlers;
pub mod pages;
pub mod server;
pub mod state;

pub use handlers::ApiError;
pub use server::{build_router, shutdown_signal, DashboardServer};
pub use state::WebState;
