//! Shared types, error model, and configuration for PageLens.
//!
//! This crate is the foundation depended on by all other PageLens crates.
//! It provides:
//! - [`PageLensError`] — the unified error type
//! - Domain types ([`PageContent`], [`AnalyzedContent`], [`EnrichedContent`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OpenRouterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{PageLensError, Result};
pub use types::{AnalyzedContent, EnrichedContent, PageContent, VocabEntry};
