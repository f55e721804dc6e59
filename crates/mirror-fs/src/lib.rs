//! Filesystem layer for Package Mirror
//!
//! Provides separator-normalized path handling, flat directory listing,
//! atomic single-file transfer primitives and format-agnostic config loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
pub use path::{NormalizedPath, validate_file_name};
