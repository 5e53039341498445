//! Wiki Initialization Engine
//!
//! This crate initializes hosted wikis ahead of their first real request:
//! - Configuration resolution with deprecated key fallback
//! - Synthetic initial request construction
//! - The initialization manager (main wiki and sub-wikis)
//! - The lifecycle listener sequencing initializations
//! - The delayed main wiki initialization job
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wikiinit_core::{LifecycleSignal, MemoryConfigSource};
//! use wikiinit_engine::{
//!     DefaultWikiInitializationManager, PlatformServices, RequestSynthesizer,
//!     WikiInitializationListener, WikiInitializerConfiguration,
//! };
//!
//! # async fn example(
//! #     services: PlatformServices,
//! #     registry: Arc<dyn wikiinit_core::platform::TenantRegistry>,
//! # ) {
//! let source = MemoryConfigSource::new().with("wikiInitializer.initializeMainWiki", "true");
//! let configuration = Arc::new(WikiInitializerConfiguration::new(Arc::new(source)));
//!
//! let manager = Arc::new(DefaultWikiInitializationManager::new(
//!     configuration.clone(),
//!     RequestSynthesizer::new("/xwiki"),
//!     services,
//! ));
//! let listener = WikiInitializationListener::new(configuration, registry, manager);
//!
//! listener.on_event(&LifecycleSignal::ApplicationStarted).await;
//! # }
//! ```

pub mod configuration;
pub mod job;
pub mod listener;
pub mod locks;
pub mod manager;
pub mod synthesizer;

pub use configuration::{ConfigNamespaces, TenantConfig, WikiInitializerConfiguration};
pub use job::{JOB_TYPE, MainWikiInitializationJob, ReadinessWait};
pub use listener::{BatchReport, SignalOutcome, WikiInitializationListener};
pub use locks::WikiLocks;
pub use manager::{DefaultWikiInitializationManager, PlatformServices, WikiInitializationManager};
pub use synthesizer::RequestSynthesizer;
