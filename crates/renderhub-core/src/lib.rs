//! # renderhub-core
//!
//! Core crate for the RenderHub plugin runtime. Contains configuration
//! schemas, the logging bootstrap, and the unified error system.
//!
//! This crate has **no** internal dependencies on other RenderHub crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
