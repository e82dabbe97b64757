//! ragdash core
//!
//! Shared building blocks of the RAG file dashboard:
//!
//! - Typed records for the RAG API payloads (files, validation, uploads)
//! - [`RagApiClient`], the upstream HTTP client used by the proxy
//! - Signed, server-side admin sessions
//! - View models and formatting for file cards
//! - The client-side upload/replace state machine and dashboard controller
//!
//! # Example
//!
//! ```no_run
//! use ragdash_core::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = DashboardConfig::from_env()?;
//!     let rag = RagApiClient::from_config(&config)?;
//!     let files = rag.list_file_records(&ListFilesParams::default()).await?;
//!     for card in DashboardView::build(&files.files, &SearchFilter::default(), None).cards {
//!         println!("{} ({})", card.name, card.size);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod rag_client;
pub mod render;
pub mod session;
pub mod templates;
pub mod types;
pub mod utils;

pub use client::{
    DashboardController, FileApi, FlowState, Progress, ProgressProfile, Toast, ToastKind,
    UploadFlow,
};
pub use config::{
    get_env_bool, get_env_int, get_env_opt, get_env_or, get_required_env, load_env,
    load_env_from_path, DashboardConfig,
};
pub use error::{DashError, Result};
pub use rag_client::{RagApiClient, UpstreamReply};
pub use render::{
    file_icon, format_date, format_file_size, DashboardView, FileCard, FileStatsView,
    FilterIndicator, FilterKind,
};
pub use session::{AdminIdentity, SessionStore, SESSION_COOKIE};
pub use templates::TemplateEngine;
pub use types::*;
pub use utils::init_logging;
