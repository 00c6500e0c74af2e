//! A sandboxed local file-management engine: listing, sorting, search,
//! selection, and clipboard-style copy/move under a single storage root.

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod filetype;
pub mod format;
pub mod fs;
pub mod handler;

pub use error::{AppError, Result};
pub use fs::storage::Storage;
