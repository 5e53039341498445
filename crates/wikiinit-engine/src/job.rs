//! Delayed main wiki initialization

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use wikiinit_core::InitializationError;
use wikiinit_core::platform::ReadinessProbe;

use crate::configuration::WikiInitializerConfiguration;
use crate::manager::WikiInitializationManager;

/// Type identifier of the job
pub const JOB_TYPE: &str = "wikiInitializer/mainWiki";

/// Default interval between readiness checks
pub const DEFAULT_READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default upper bound on waiting for readiness after the delay
pub const DEFAULT_READINESS_MAX_WAIT: Duration = Duration::from_secs(60);

/// Polls a readiness probe until it reports ready or the wait runs out
#[derive(Clone)]
pub struct ReadinessWait {
    probe: Arc<dyn ReadinessProbe>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ReadinessWait {
    pub fn new(probe: Arc<dyn ReadinessProbe>) -> Self {
        Self {
            probe,
            poll_interval: DEFAULT_READINESS_POLL_INTERVAL,
            max_wait: DEFAULT_READINESS_MAX_WAIT,
        }
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Returns whether the probe reported ready before the wait ran out
    pub async fn wait(&self) -> bool {
        let started = Instant::now();
        loop {
            if self.probe.is_ready().await {
                return true;
            }
            if started.elapsed() >= self.max_wait {
                warn!(
                    "Platform not ready after waiting {:?}, initializing the main wiki anyway",
                    self.max_wait
                );
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Single-shot job initializing the main wiki after the configured delay
///
/// The delay gives the platform's request machinery time to come up when the
/// host has no readiness signal. With a readiness probe attached the job also
/// waits for the probe, bounded by its maximum wait.
pub struct MainWikiInitializationJob {
    configuration: Arc<WikiInitializerConfiguration>,
    manager: Arc<dyn WikiInitializationManager>,
    readiness: Option<ReadinessWait>,
}

impl MainWikiInitializationJob {
    pub fn new(
        configuration: Arc<WikiInitializerConfiguration>,
        manager: Arc<dyn WikiInitializationManager>,
    ) -> Self {
        Self {
            configuration,
            manager,
            readiness: None,
        }
    }

    pub fn with_readiness(mut self, readiness: Option<ReadinessWait>) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn job_type(&self) -> &'static str {
        JOB_TYPE
    }

    /// Wait, then initialize the main wiki
    pub async fn run(&self) -> Result<(), InitializationError> {
        let delay = self.configuration.main_wiki_initialization_delay();
        debug!(
            "[{}] waiting {:?} before initializing the main wiki",
            JOB_TYPE, delay
        );
        tokio::time::sleep(delay).await;

        if let Some(readiness) = &self.readiness {
            readiness.wait().await;
        }

        self.manager.initialize(None).await
    }

    /// Run the job in the background
    pub fn spawn(self) -> JoinHandle<Result<(), InitializationError>> {
        info!("Starting job [{}]", JOB_TYPE);
        tokio::spawn(async move {
            let result = self.run().await;
            if let Err(e) = &result {
                error!("Failed to initialize main wiki: {} ({})", e, e.source);
            }
            result
        })
    }
}
