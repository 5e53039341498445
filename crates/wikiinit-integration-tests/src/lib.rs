//! Integration test support for the wiki initializer
//!
//! In-memory implementations of the host platform collaborators. A single
//! `FakePlatform` records every call made to it so scenarios can assert on
//! what the initializer asked the platform to do.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use wikiinit_core::platform::{
    ContainerInitializer, ContextProvider, DocumentRef, ObservationBus, PlatformBootstrap,
    PlatformEvent, PlatformInstance, TenantRegistry,
};
use wikiinit_core::{Error, ExecutionContext, Result, SyntheticRequest, WikiDescriptor};
use wikiinit_engine::{
    DefaultWikiInitializationManager, PlatformServices, RequestSynthesizer,
    WikiInitializerConfiguration,
};

/// A call made to the fake platform
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    ListWikis,
    InitializeRequest,
    InitializeResponse,
    InitializeSession,
    EnsureInstance {
        start_wizard: bool,
        request: Option<SyntheticRequest>,
    },
    InitializeWiki(String),
    DefaultDocument,
    Notify {
        event: PlatformEvent,
        source: DocumentRef,
    },
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<PlatformCall>>,
    running: Mutex<HashMap<String, usize>>,
    max_overlap: Mutex<HashMap<String, usize>>,
}

impl Recorder {
    fn record(&self, call: PlatformCall) {
        debug!("fake platform call: {:?}", call);
        self.calls.lock().unwrap().push(call);
    }

    fn enter(&self, wiki_id: &str) {
        let mut running = self.running.lock().unwrap();
        let count = running.entry(wiki_id.to_string()).or_default();
        *count += 1;

        let mut max = self.max_overlap.lock().unwrap();
        let seen = max.entry(wiki_id.to_string()).or_default();
        *seen = (*seen).max(*count);
    }

    fn exit(&self, wiki_id: &str) {
        if let Some(count) = self.running.lock().unwrap().get_mut(wiki_id) {
            *count -= 1;
        }
    }
}

/// Platform instance handed out by `FakePlatform`
pub struct FakeInstance {
    recorder: Arc<Recorder>,
    failing_wikis: Vec<String>,
    init_delay: Option<Duration>,
}

#[async_trait]
impl PlatformInstance for FakeInstance {
    async fn initialize_wiki(&self, wiki_id: &str, _context: &ExecutionContext) -> Result<()> {
        self.recorder.record(PlatformCall::InitializeWiki(wiki_id.to_string()));
        self.recorder.enter(wiki_id);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        self.recorder.exit(wiki_id);

        if self.failing_wikis.iter().any(|id| id == wiki_id) {
            return Err(Error::Platform(format!("wiki [{}] is corrupted", wiki_id)));
        }
        Ok(())
    }

    async fn default_document(&self, context: &ExecutionContext) -> Result<DocumentRef> {
        self.recorder.record(PlatformCall::DefaultDocument);
        let wiki = context.wiki_id().unwrap_or(wikiinit_core::MAIN_WIKI_ID);
        Ok(DocumentRef::new(wiki, "Main", "WebHome"))
    }
}

/// In-memory host platform
pub struct FakePlatform {
    recorder: Arc<Recorder>,
    wikis: Vec<WikiDescriptor>,
    registry_down: bool,
    notification_fails: bool,
    context_available: bool,
    instance: Arc<FakeInstance>,
}

impl FakePlatform {
    /// Platform hosting the given wikis, all of which initialize fine
    pub fn new(wiki_ids: &[&str]) -> Self {
        Self::builder(wiki_ids).build()
    }

    pub fn builder(wiki_ids: &[&str]) -> FakePlatformBuilder {
        FakePlatformBuilder {
            wikis: wiki_ids.iter().map(|id| WikiDescriptor::from_id(*id)).collect(),
            failing_wikis: Vec::new(),
            registry_down: false,
            notification_fails: false,
            context_available: true,
            init_delay: None,
        }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.recorder.calls.lock().unwrap().clone()
    }

    /// Ids passed to `initialize_wiki`, in call order
    pub fn initialized_wikis(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::InitializeWiki(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Highest number of simultaneous initializations seen for a wiki
    pub fn max_overlap(&self, wiki_id: &str) -> usize {
        self.recorder
            .max_overlap
            .lock()
            .unwrap()
            .get(wiki_id)
            .copied()
            .unwrap_or(0)
    }

    /// Collaborator bundle backed by this platform
    pub fn services(self: &Arc<Self>) -> PlatformServices {
        PlatformServices {
            bootstrap: self.clone(),
            container: self.clone(),
            observation: self.clone(),
            contexts: self.clone(),
        }
    }

    /// Default manager wired to this platform
    pub fn manager(
        self: &Arc<Self>,
        configuration: Arc<WikiInitializerConfiguration>,
    ) -> DefaultWikiInitializationManager {
        DefaultWikiInitializationManager::new(
            configuration,
            RequestSynthesizer::new("/xwiki"),
            self.services(),
        )
    }
}

pub struct FakePlatformBuilder {
    wikis: Vec<WikiDescriptor>,
    failing_wikis: Vec<String>,
    registry_down: bool,
    notification_fails: bool,
    context_available: bool,
    init_delay: Option<Duration>,
}

impl FakePlatformBuilder {
    /// Make `initialize_wiki` fail for this id
    pub fn failing(mut self, wiki_id: &str) -> Self {
        self.failing_wikis.push(wiki_id.to_string());
        self
    }

    pub fn registry_down(mut self) -> Self {
        self.registry_down = true;
        self
    }

    pub fn notification_fails(mut self) -> Self {
        self.notification_fails = true;
        self
    }

    /// No current execution context
    pub fn without_context(mut self) -> Self {
        self.context_available = false;
        self
    }

    /// Time each `initialize_wiki` call takes
    pub fn init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    pub fn build(self) -> FakePlatform {
        let recorder = Arc::new(Recorder::default());
        FakePlatform {
            instance: Arc::new(FakeInstance {
                recorder: recorder.clone(),
                failing_wikis: self.failing_wikis,
                init_delay: self.init_delay,
            }),
            recorder,
            wikis: self.wikis,
            registry_down: self.registry_down,
            notification_fails: self.notification_fails,
            context_available: self.context_available,
        }
    }
}

#[async_trait]
impl TenantRegistry for FakePlatform {
    async fn get_all(&self) -> Result<Vec<WikiDescriptor>> {
        self.recorder.record(PlatformCall::ListWikis);
        if self.registry_down {
            return Err(Error::Registry("wiki descriptor store unreachable".to_string()));
        }
        Ok(self.wikis.clone())
    }
}

#[async_trait]
impl PlatformBootstrap for FakePlatform {
    async fn ensure_instance(
        &self,
        start_wizard: bool,
        context: &mut ExecutionContext,
    ) -> Result<Arc<dyn PlatformInstance>> {
        self.recorder.record(PlatformCall::EnsureInstance {
            start_wizard,
            request: context.request().cloned(),
        });
        let instance: Arc<dyn PlatformInstance> = self.instance.clone();
        Ok(instance)
    }
}

#[async_trait]
impl ContainerInitializer for FakePlatform {
    async fn initialize_request(&self, context: &mut ExecutionContext) -> Result<()> {
        self.recorder.record(PlatformCall::InitializeRequest);
        context.container_mut().request = true;
        Ok(())
    }

    async fn initialize_response(&self, context: &mut ExecutionContext) -> Result<()> {
        self.recorder.record(PlatformCall::InitializeResponse);
        context.container_mut().response = true;
        Ok(())
    }

    async fn initialize_session(&self, context: &mut ExecutionContext) -> Result<()> {
        self.recorder.record(PlatformCall::InitializeSession);
        context.container_mut().session = true;
        Ok(())
    }
}

#[async_trait]
impl ObservationBus for FakePlatform {
    async fn notify(
        &self,
        event: &PlatformEvent,
        source: &DocumentRef,
        _context: &ExecutionContext,
    ) -> Result<()> {
        self.recorder.record(PlatformCall::Notify {
            event: event.clone(),
            source: source.clone(),
        });
        if self.notification_fails {
            return Err(Error::Notification("wizard listener crashed".to_string()));
        }
        Ok(())
    }
}

impl ContextProvider for FakePlatform {
    fn current(&self) -> Option<ExecutionContext> {
        if !self.context_available {
            return None;
        }
        let instance: Arc<dyn PlatformInstance> = self.instance.clone();
        Some(ExecutionContext::detached(Some(instance)))
    }
}
