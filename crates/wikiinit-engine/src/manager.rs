//! Wiki initialization manager
//!
//! Initializes one wiki at a time. The main wiki gets a synthetic request,
//! primed container state and a platform instance; a sub-wiki is initialized
//! through the platform handle of the current execution context.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use wikiinit_core::platform::{
    ContainerInitializer, ContextProvider, ObservationBus, PlatformBootstrap, PlatformEvent,
    PlatformInstance,
};
use wikiinit_core::{
    Error, ExecutionContext, InitTarget, InitializationError, RequestAction, Result,
    WikiDescriptor,
};
use wikiinit_observability::Metrics;
use wikiinit_observability::metrics::{KIND_MAIN, KIND_SUB};

use crate::configuration::WikiInitializerConfiguration;
use crate::locks::WikiLocks;
use crate::synthesizer::RequestSynthesizer;

/// Initializes wikis on demand
#[async_trait]
pub trait WikiInitializationManager: Send + Sync {
    /// Initialize a wiki, `None` meaning the main wiki
    ///
    /// # Errors
    /// - `InitializationError` carrying the wiki id and the failure cause
    async fn initialize(
        &self,
        descriptor: Option<&WikiDescriptor>,
    ) -> std::result::Result<(), InitializationError>;
}

/// Host platform collaborators used by the manager
#[derive(Clone)]
pub struct PlatformServices {
    pub bootstrap: Arc<dyn PlatformBootstrap>,
    pub container: Arc<dyn ContainerInitializer>,
    pub observation: Arc<dyn ObservationBus>,
    pub contexts: Arc<dyn ContextProvider>,
}

/// Default manager driving the host platform collaborators
pub struct DefaultWikiInitializationManager {
    configuration: Arc<WikiInitializerConfiguration>,
    synthesizer: RequestSynthesizer,
    services: PlatformServices,
    locks: WikiLocks,
    metrics: Option<Metrics>,
}

impl DefaultWikiInitializationManager {
    pub fn new(
        configuration: Arc<WikiInitializerConfiguration>,
        synthesizer: RequestSynthesizer,
        services: PlatformServices,
    ) -> Self {
        Self {
            configuration,
            synthesizer,
            services,
            locks: WikiLocks::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether an initialization of `wiki_id` is running
    pub fn is_initializing(&self, wiki_id: &str) -> bool {
        self.locks.is_locked(wiki_id)
    }

    async fn initialize_main_wiki(&self, target: &InitTarget) -> Result<()> {
        let config = self.configuration.resolve(target);
        let request = self.synthesizer.synthesize(target, &config);

        let mut context = ExecutionContext::for_request(request);
        context.set_wiki_id(target.wiki_id());

        let container = &self.services.container;
        container.initialize_request(&mut context).await?;
        container.initialize_response(&mut context).await?;
        container.initialize_session(&mut context).await?;

        let platform = self
            .services
            .bootstrap
            .ensure_instance(config.start_distribution_wizard, &mut context)
            .await?;
        context.bind_platform(platform.clone());

        if config.start_distribution_wizard {
            if let Err(e) = self.start_distribution_wizard(platform.as_ref(), &context).await {
                error!("Failed to start the distribution wizard: {}", e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_wizard_notification_failure();
                }
            }
        }

        Ok(())
    }

    async fn start_distribution_wizard(
        &self,
        platform: &dyn PlatformInstance,
        context: &ExecutionContext,
    ) -> Result<()> {
        let document = platform.default_document(context).await?;
        debug!("Notifying distribution action on [{}]", document);

        let event = PlatformEvent::ActionExecuting {
            action: RequestAction::Distribution,
        };
        self.services
            .observation
            .notify(&event, &document, context)
            .await
    }

    async fn initialize_sub_wiki(&self, descriptor: &WikiDescriptor) -> Result<()> {
        let context = self.services.contexts.current();
        let Some((context, platform)) = context.and_then(|context| {
            let platform = context.platform().cloned()?;
            Some((context, platform))
        }) else {
            return Err(Error::ContextUnavailable(descriptor.id().to_string()));
        };

        platform.initialize_wiki(descriptor.id(), &context).await
    }
}

#[async_trait]
impl WikiInitializationManager for DefaultWikiInitializationManager {
    async fn initialize(
        &self,
        descriptor: Option<&WikiDescriptor>,
    ) -> std::result::Result<(), InitializationError> {
        let target = InitTarget::resolve(descriptor);
        let wiki_id = target.wiki_id().to_string();

        let _guard = self.locks.acquire(&wiki_id).await;
        info!("Initializing wiki [{}] ...", wiki_id);

        let started = Instant::now();
        let result = match &target {
            InitTarget::Main => self.initialize_main_wiki(&target).await,
            InitTarget::Sub(descriptor) => self.initialize_sub_wiki(descriptor).await,
        };
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            let kind = if target.is_main() { KIND_MAIN } else { KIND_SUB };
            metrics.record_initialization(kind, result.is_ok(), elapsed.as_secs_f64());
        }

        match result {
            Ok(()) => {
                info!("Wiki [{}] initialized in {:?}", wiki_id, elapsed);
                Ok(())
            }
            Err(e) => Err(InitializationError::new(wiki_id, e)),
        }
    }
}
