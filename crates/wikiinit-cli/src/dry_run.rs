//! Dry-run platform
//!
//! Stands in for the host platform when simulating: every collaborator call
//! is logged and recorded, nothing is actually initialized.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

use wikiinit_core::platform::{
    ContainerInitializer, ContextProvider, DocumentRef, ObservationBus, PlatformBootstrap,
    PlatformEvent, PlatformInstance, TenantRegistry,
};
use wikiinit_core::{ExecutionContext, MAIN_WIKI_ID, Result, WikiDescriptor};

/// Shared log of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn record(&self, call: String) {
        info!("[dry-run] {}", call);
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

/// Platform instance that only records calls
pub struct DryRunInstance {
    log: CallLog,
}

#[async_trait]
impl PlatformInstance for DryRunInstance {
    async fn initialize_wiki(&self, wiki_id: &str, _context: &ExecutionContext) -> Result<()> {
        self.log.record(format!("initialize_wiki({})", wiki_id));
        Ok(())
    }

    async fn default_document(&self, context: &ExecutionContext) -> Result<DocumentRef> {
        let wiki = context.wiki_id().unwrap_or(MAIN_WIKI_ID);
        Ok(DocumentRef::new(wiki, "Main", "WebHome"))
    }
}

/// Dry-run implementation of every host collaborator
///
/// The current context only carries a platform handle once the main wiki
/// created the instance, as on a real platform.
pub struct DryRunPlatform {
    wikis: Vec<WikiDescriptor>,
    log: CallLog,
    instance: OnceLock<Arc<DryRunInstance>>,
}

impl DryRunPlatform {
    pub fn new(wiki_ids: &[String]) -> Self {
        Self {
            wikis: wiki_ids.iter().map(WikiDescriptor::from_id).collect(),
            log: CallLog::default(),
            instance: OnceLock::new(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.calls()
    }
}

#[async_trait]
impl TenantRegistry for DryRunPlatform {
    async fn get_all(&self) -> Result<Vec<WikiDescriptor>> {
        self.log.record(format!("registry.get_all() -> {} wikis", self.wikis.len()));
        Ok(self.wikis.clone())
    }
}

#[async_trait]
impl PlatformBootstrap for DryRunPlatform {
    async fn ensure_instance(
        &self,
        start_wizard: bool,
        context: &mut ExecutionContext,
    ) -> Result<Arc<dyn PlatformInstance>> {
        let url = context
            .request()
            .and_then(|request| request.url())
            .map(|url| url.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        self.log.record(format!(
            "ensure_instance(wizard={}, action={}, url={})",
            start_wizard,
            context.action(),
            url
        ));

        let instance: Arc<dyn PlatformInstance> = self
            .instance
            .get_or_init(|| {
                Arc::new(DryRunInstance {
                    log: self.log.clone(),
                })
            })
            .clone();
        Ok(instance)
    }
}

#[async_trait]
impl ContainerInitializer for DryRunPlatform {
    async fn initialize_request(&self, context: &mut ExecutionContext) -> Result<()> {
        self.log.record("container.initialize_request()".to_string());
        context.container_mut().request = true;
        Ok(())
    }

    async fn initialize_response(&self, context: &mut ExecutionContext) -> Result<()> {
        self.log.record("container.initialize_response()".to_string());
        context.container_mut().response = true;
        Ok(())
    }

    async fn initialize_session(&self, context: &mut ExecutionContext) -> Result<()> {
        self.log.record("container.initialize_session()".to_string());
        context.container_mut().session = true;
        Ok(())
    }
}

#[async_trait]
impl ObservationBus for DryRunPlatform {
    async fn notify(
        &self,
        event: &PlatformEvent,
        source: &DocumentRef,
        _context: &ExecutionContext,
    ) -> Result<()> {
        let PlatformEvent::ActionExecuting { action } = event;
        self.log.record(format!("notify(ActionExecuting({}), {})", action, source));
        Ok(())
    }
}

impl ContextProvider for DryRunPlatform {
    fn current(&self) -> Option<ExecutionContext> {
        let instance: Arc<dyn PlatformInstance> = self.instance.get()?.clone();
        Some(ExecutionContext::detached(Some(instance)))
    }
}
