//! Core type definitions

pub mod file;
pub mod filter;
pub mod upload;

pub use file::*;
pub use filter::*;
pub use upload::*;
