//! File-based configuration sources for the wiki initializer
//!
//! This crate implements the `ConfigSource` trait over configuration files
//! and the process environment.
//!
//! # Features
//! - YAML, TOML and Java-style `.properties` files
//! - Files re-read on every lookup, so edits apply on next read
//! - Environment variable overrides
//! - Layering of several sources, first non-empty value wins
//!
//! # Example
//! ```no_run
//! # use std::sync::Arc;
//! # use wikiinit_config_file::{EnvConfigSource, FileConfigSource, LayeredConfigSource};
//! # use wikiinit_core::ConfigSource;
//! # fn example() -> wikiinit_core::Result<()> {
//! let source = LayeredConfigSource::new()
//!     .with_layer(Arc::new(EnvConfigSource::new("WIKIINIT_")))
//!     .with_layer(Arc::new(FileConfigSource::new("~/.xwiki/xwiki.properties")?));
//! let value = source.get_property("wikiInitializer.initializeMainWiki")?;
//! # Ok(())
//! # }
//! ```

mod env_source;
mod file_source;
mod layered;
mod properties;

pub use env_source::EnvConfigSource;
pub use file_source::{FileConfigSource, FileFormat};
pub use layered::LayeredConfigSource;
