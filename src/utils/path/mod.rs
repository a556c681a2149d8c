//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`, `is_contained`)

pub mod fs;

pub use fs::{is_contained, normalize_path, resolve_path};
