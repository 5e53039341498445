//! Wiki Initializer Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout the
//! wiki initializer:
//! - Wiki descriptors and initialization targets
//! - Configuration source abstraction
//! - Synthetic request and execution context types
//! - Host platform collaborator traits
//! - Lifecycle signals
//! - Core error types

pub mod config_source;
pub mod context;
pub mod error;
pub mod events;
pub mod platform;
pub mod request;
pub mod tenant;

pub use config_source::{ConfigSource, ConfigValue, MemoryConfigSource};
pub use context::{ContainerState, ContextMode, ExecutionContext};
pub use error::{Error, InitializationError, Result};
pub use events::LifecycleSignal;
pub use request::{Cookie, MultiValueMap, RequestAction, SyntheticRequest};
pub use tenant::{InitTarget, MAIN_WIKI_ID, WikiDescriptor};
