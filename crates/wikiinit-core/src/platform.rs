//! Host platform collaborator traits
//!
//! The initializer drives the host platform but does not implement it. These
//! traits describe the boundary: the wiki registry, the container that primes
//! request/response/session state, the platform bootstrap and instance, the
//! observation bus, and the provider of the current execution context.
//!
//! All traits are object-safe and used as `Arc<dyn Trait>`.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::{
    Result, context::ExecutionContext, request::RequestAction, tenant::WikiDescriptor,
};

/// Reference to a wiki document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentRef {
    pub wiki: String,
    pub space: String,
    pub page: String,
}

impl DocumentRef {
    pub fn new(wiki: impl Into<String>, space: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            space: space.into(),
            page: page.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.wiki, self.space, self.page)
    }
}

/// Events the initializer publishes on the platform's observation bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// An action is about to execute against a document
    ActionExecuting { action: RequestAction },
}

/// Registry of hosted wikis
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// List every wiki known to the platform, in the registry's own order
    ///
    /// # Errors
    /// - `Error::Registry` if the registry can't be enumerated
    async fn get_all(&self) -> Result<Vec<WikiDescriptor>>;
}

/// Entry point creating the platform instance for the main wiki
#[async_trait]
pub trait PlatformBootstrap: Send + Sync {
    /// Make sure the platform instance exists, creating it if needed
    ///
    /// # Arguments
    /// * `start_wizard` - Whether the distribution wizard should be started
    /// * `context` - Context bound to the main wiki's synthetic request
    ///
    /// # Errors
    /// - `Error::Platform` if the instance can't be created
    async fn ensure_instance(
        &self,
        start_wizard: bool,
        context: &mut ExecutionContext,
    ) -> Result<Arc<dyn PlatformInstance>>;
}

/// A running platform instance
#[async_trait]
pub trait PlatformInstance: Send + Sync {
    /// Initialize the wiki with the given id
    async fn initialize_wiki(&self, wiki_id: &str, context: &ExecutionContext) -> Result<()>;

    /// Default landing document of the context's wiki
    async fn default_document(&self, context: &ExecutionContext) -> Result<DocumentRef>;
}

/// Servlet container glue priming request, response and session state
#[async_trait]
pub trait ContainerInitializer: Send + Sync {
    async fn initialize_request(&self, context: &mut ExecutionContext) -> Result<()>;

    async fn initialize_response(&self, context: &mut ExecutionContext) -> Result<()>;

    async fn initialize_session(&self, context: &mut ExecutionContext) -> Result<()>;
}

/// Platform observation bus
#[async_trait]
pub trait ObservationBus: Send + Sync {
    /// Notify listeners of an event raised against a document
    ///
    /// # Errors
    /// - `Error::Notification` if a listener fails
    async fn notify(
        &self,
        event: &PlatformEvent,
        source: &DocumentRef,
        context: &ExecutionContext,
    ) -> Result<()>;
}

/// Provider of the platform's current execution context
pub trait ContextProvider: Send + Sync {
    /// Current context, if the platform has one
    fn current(&self) -> Option<ExecutionContext>;
}

/// Optional readiness signal of the platform's request machinery
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}
