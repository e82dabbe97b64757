//! Terminal client for the RAG file dashboard
//!
//! Logs in to a running dashboard like a browser would and drives the same
//! upload, replace, delete and listing flows from the command line.

#![warn(clippy::all)]

pub mod client;
pub mod console;
pub mod display;

pub use client::{disposition_filename, DashboardClient};
pub use console::{AssumeYes, Console, InteractivePrompt, Prompt};
pub use display::{describe_state, render_file_table, render_progress, render_stats, render_toast};
