//! Lifecycle listener sequencing wiki initializations
//!
//! On application start the main wiki is initialized, inline or through the
//! delayed job. On application ready the selected sub-wikis are initialized
//! one by one (or with bounded parallelism); a failing wiki is logged and the
//! batch carries on.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use wikiinit_core::platform::TenantRegistry;
use wikiinit_core::{Error, InitializationError, LifecycleSignal, WikiDescriptor};

use crate::configuration::WikiInitializerConfiguration;
use crate::job::{MainWikiInitializationJob, ReadinessWait};
use crate::manager::WikiInitializationManager;

/// Name the listener registers under
pub const LISTENER_NAME: &str = "WikiInitializationListener";

/// Result of a sub-wiki batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Wikis the batch tried to initialize, in order
    pub attempted: Vec<String>,
    pub succeeded: Vec<String>,
    pub failures: Vec<InitializationError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.wiki_id()).collect()
    }
}

/// What handling a signal did
#[derive(Debug)]
pub enum SignalOutcome {
    /// Nothing to do for this signal
    Skipped,
    MainInitialized,
    /// Main wiki initialization failed; already logged
    MainFailed(InitializationError),
    /// Main wiki initialization runs in the delayed job
    MainScheduled(JoinHandle<Result<(), InitializationError>>),
    Batch(BatchReport),
    /// Wikis could not be listed; already logged
    RegistryUnavailable(Error),
}

/// Reacts to application lifecycle signals
pub struct WikiInitializationListener {
    configuration: Arc<WikiInitializerConfiguration>,
    registry: Arc<dyn TenantRegistry>,
    manager: Arc<dyn WikiInitializationManager>,
    readiness: Option<ReadinessWait>,
}

impl WikiInitializationListener {
    pub fn new(
        configuration: Arc<WikiInitializerConfiguration>,
        registry: Arc<dyn TenantRegistry>,
        manager: Arc<dyn WikiInitializationManager>,
    ) -> Self {
        Self {
            configuration,
            registry,
            manager,
            readiness: None,
        }
    }

    /// Readiness wait handed to the delayed main wiki job
    pub fn with_readiness(mut self, readiness: ReadinessWait) -> Self {
        self.readiness = Some(readiness);
        self
    }

    pub fn name(&self) -> &'static str {
        LISTENER_NAME
    }

    /// Handle a lifecycle signal
    pub async fn on_event(&self, signal: &LifecycleSignal) -> SignalOutcome {
        debug!("{} received [{}]", LISTENER_NAME, signal.event_name());
        match signal {
            LifecycleSignal::ApplicationStarted => self.on_application_started().await,
            LifecycleSignal::ApplicationReady { wiki } => {
                self.on_application_ready(wiki.as_ref()).await
            }
        }
    }

    /// Handle an event by its host name; unknown events are ignored
    pub async fn on_host_event(
        &self,
        event_name: &str,
        wiki: Option<WikiDescriptor>,
    ) -> Option<SignalOutcome> {
        match LifecycleSignal::from_event_name(event_name, wiki) {
            Some(signal) => Some(self.on_event(&signal).await),
            None => {
                debug!("{} ignoring event [{}]", LISTENER_NAME, event_name);
                None
            }
        }
    }

    async fn on_application_started(&self) -> SignalOutcome {
        if !self.configuration.initialize_main_wiki() {
            debug!("Main wiki initialization on startup is disabled");
            return SignalOutcome::Skipped;
        }

        let delay = self.configuration.main_wiki_initialization_delay();
        if !delay.is_zero() {
            info!("Scheduling main wiki initialization in {:?}", delay);
            let job = MainWikiInitializationJob::new(
                self.configuration.clone(),
                self.manager.clone(),
            )
            .with_readiness(self.readiness.clone());
            return SignalOutcome::MainScheduled(job.spawn());
        }

        match self.manager.initialize(None).await {
            Ok(()) => SignalOutcome::MainInitialized,
            Err(e) => {
                error!("Failed to initialize main wiki: {} ({})", e, e.source);
                SignalOutcome::MainFailed(e)
            }
        }
    }

    async fn on_application_ready(&self, source: Option<&WikiDescriptor>) -> SignalOutcome {
        if let Some(source) = source {
            debug!("Application ready for wiki [{}]", source);
        }

        let wikis = if self.configuration.initialize_all_sub_wikis() {
            match self.registry.get_all().await {
                Ok(wikis) => wikis,
                Err(e) => {
                    error!("Failed to initialize sub-wikis: {}", e);
                    return SignalOutcome::RegistryUnavailable(e);
                }
            }
        } else {
            self.configuration.initializable_wikis()
        };

        let targets: Vec<WikiDescriptor> = wikis.into_iter().filter(|w| !w.is_main()).collect();
        if targets.is_empty() {
            debug!("No sub-wiki to initialize");
        }

        SignalOutcome::Batch(self.initialize_batch(targets).await)
    }

    async fn initialize_batch(&self, targets: Vec<WikiDescriptor>) -> BatchReport {
        let concurrency = self.configuration.sub_wiki_concurrency();
        let timeout = self.configuration.sub_wiki_initialization_timeout();

        let results: Vec<(String, Result<(), InitializationError>)> = stream::iter(targets)
            .map(move |wiki| self.initialize_one(wiki, timeout))
            .buffered(concurrency)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (wiki_id, result) in results {
            match result {
                Ok(()) => report.succeeded.push(wiki_id.clone()),
                Err(e) => {
                    error!("Failed to initialize wiki [{}]: {}", wiki_id, e.source);
                    report.failures.push(e);
                }
            }
            report.attempted.push(wiki_id);
        }

        info!(
            "Sub-wiki initialization finished: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failures.len()
        );
        report
    }

    async fn initialize_one(
        &self,
        wiki: WikiDescriptor,
        timeout: Option<Duration>,
    ) -> (String, Result<(), InitializationError>) {
        let wiki_id = wiki.id().to_string();
        let result = match timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.manager.initialize(Some(&wiki))).await {
                    Ok(result) => result,
                    Err(_) => Err(InitializationError::new(
                        wiki_id.clone(),
                        Error::Timeout {
                            wiki_id: wiki_id.clone(),
                            elapsed: limit,
                        },
                    )),
                }
            }
            None => self.manager.initialize(Some(&wiki)).await,
        };
        (wiki_id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::Mutex;
    use wikiinit_core::{MAIN_WIKI_ID, MemoryConfigSource, Result};

    mock! {
        pub Registry {}

        #[async_trait]
        impl TenantRegistry for Registry {
            async fn get_all(&self) -> Result<Vec<WikiDescriptor>>;
        }
    }

    /// Records initialized ids; fails the ids listed in `failing`
    #[derive(Default)]
    struct RecordingManager {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
        slow: Vec<String>,
    }

    #[async_trait]
    impl WikiInitializationManager for RecordingManager {
        async fn initialize(
            &self,
            descriptor: Option<&WikiDescriptor>,
        ) -> std::result::Result<(), InitializationError> {
            let id = descriptor
                .map(|d| d.id().to_string())
                .unwrap_or_else(|| MAIN_WIKI_ID.to_string());
            self.calls.lock().unwrap().push(id.clone());
            if self.slow.contains(&id) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&id) {
                return Err(InitializationError::new(
                    id.clone(),
                    Error::Platform(format!("cannot initialize {}", id)),
                ));
            }
            Ok(())
        }
    }

    fn registry(ids: &'static [&'static str]) -> MockRegistry {
        let mut registry = MockRegistry::new();
        registry
            .expect_get_all()
            .returning(move || Ok(ids.iter().map(|id| WikiDescriptor::from_id(*id)).collect()));
        registry
    }

    fn listener(
        source: MemoryConfigSource,
        registry: MockRegistry,
        manager: Arc<RecordingManager>,
    ) -> WikiInitializationListener {
        let configuration = Arc::new(WikiInitializerConfiguration::new(Arc::new(source)));
        WikiInitializationListener::new(configuration, Arc::new(registry), manager)
    }

    fn ready() -> LifecycleSignal {
        LifecycleSignal::ApplicationReady { wiki: None }
    }

    #[tokio::test]
    async fn test_started_disabled_by_default() {
        let manager = Arc::new(RecordingManager::default());
        let listener = listener(
            MemoryConfigSource::new(),
            MockRegistry::new(),
            manager.clone(),
        );

        let outcome = listener.on_event(&LifecycleSignal::ApplicationStarted).await;
        assert!(matches!(outcome, SignalOutcome::Skipped));
        assert!(manager.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_started_initializes_main_inline() {
        let manager = Arc::new(RecordingManager::default());
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeMainWiki", "true"),
            MockRegistry::new(),
            manager.clone(),
        );

        let outcome = listener.on_event(&LifecycleSignal::ApplicationStarted).await;
        assert!(matches!(outcome, SignalOutcome::MainInitialized));
        assert_eq!(*manager.calls.lock().unwrap(), vec!["xwiki"]);
    }

    #[tokio::test]
    async fn test_started_failure_is_not_propagated() {
        let manager = Arc::new(RecordingManager {
            failing: vec!["xwiki".to_string()],
            ..RecordingManager::default()
        });
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeMainWiki", "true"),
            MockRegistry::new(),
            manager,
        );

        let outcome = listener.on_event(&LifecycleSignal::ApplicationStarted).await;
        match outcome {
            SignalOutcome::MainFailed(e) => assert_eq!(e.wiki_id(), "xwiki"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_with_delay_schedules_job() {
        let manager = Arc::new(RecordingManager::default());
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeMainWiki", "true")
                .with("wikiInitializer.mainWikiInitializationDelay", "2000"),
            MockRegistry::new(),
            manager.clone(),
        );

        let outcome = listener.on_event(&LifecycleSignal::ApplicationStarted).await;
        let SignalOutcome::MainScheduled(handle) = outcome else {
            panic!("expected a scheduled job");
        };
        assert!(manager.calls.lock().unwrap().is_empty());

        handle.await.unwrap().unwrap();
        assert_eq!(*manager.calls.lock().unwrap(), vec!["xwiki"]);
    }

    #[tokio::test]
    async fn test_ready_uses_allow_list() {
        let manager = Arc::new(RecordingManager::default());
        let mut registry = MockRegistry::new();
        registry.expect_get_all().times(0);

        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializableSubWikis", "alpha,beta"),
            registry,
            manager.clone(),
        );

        let SignalOutcome::Batch(report) = listener.on_event(&ready()).await else {
            panic!("expected a batch");
        };
        assert_eq!(report.attempted, vec!["alpha", "beta"]);
        assert!(report.is_success());
        assert_eq!(*manager.calls.lock().unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_ready_all_excludes_main_wiki() {
        let manager = Arc::new(RecordingManager::default());
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeSubWikis", "true"),
            registry(&["alpha", "xwiki", "beta"]),
            manager.clone(),
        );

        let SignalOutcome::Batch(report) = listener.on_event(&ready()).await else {
            panic!("expected a batch");
        };
        assert_eq!(report.succeeded, vec!["alpha", "beta"]);
        assert_eq!(*manager.calls.lock().unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let manager = Arc::new(RecordingManager {
            failing: vec!["b".to_string()],
            ..RecordingManager::default()
        });
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeSubWikis", "true"),
            registry(&["a", "b", "c"]),
            manager.clone(),
        );

        let SignalOutcome::Batch(report) = listener.on_event(&ready()).await else {
            panic!("expected a batch");
        };
        assert_eq!(report.attempted, vec!["a", "b", "c"]);
        assert_eq!(report.succeeded, vec!["a", "c"]);
        assert_eq!(report.failed_ids(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_registry_failure_aborts_event() {
        let manager = Arc::new(RecordingManager::default());
        let mut registry = MockRegistry::new();
        registry
            .expect_get_all()
            .returning(|| Err(Error::Registry("database down".to_string())));

        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeSubWikis", "true"),
            registry,
            manager.clone(),
        );

        let outcome = listener.on_event(&ready()).await;
        assert!(matches!(
            outcome,
            SignalOutcome::RegistryUnavailable(Error::Registry(_))
        ));
        assert!(manager.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reported_per_wiki() {
        let manager = Arc::new(RecordingManager {
            slow: vec!["slow".to_string()],
            ..RecordingManager::default()
        });
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializableSubWikis", "slow,fast")
                .with("wikiInitializer.subWikiInitializationTimeout", "1000"),
            MockRegistry::new(),
            manager,
        );

        let SignalOutcome::Batch(report) = listener.on_event(&ready()).await else {
            panic!("expected a batch");
        };
        assert_eq!(report.succeeded, vec!["fast"]);
        assert_eq!(report.failed_ids(), vec!["slow"]);
        assert!(matches!(report.failures[0].source, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unknown_host_event_ignored() {
        let manager = Arc::new(RecordingManager::default());
        let listener = listener(
            MemoryConfigSource::new()
                .with("wikiInitializer.initializeMainWiki", "true"),
            MockRegistry::new(),
            manager.clone(),
        );

        let outcome = listener.on_host_event("DocumentSavedEvent", None).await;
        assert!(outcome.is_none());
        assert!(manager.calls.lock().unwrap().is_empty());

        let outcome = listener.on_host_event("ApplicationStartedEvent", None).await;
        assert!(matches!(outcome, Some(SignalOutcome::MainInitialized)));
        assert_eq!(listener.name(), "WikiInitializationListener");
    }
}
