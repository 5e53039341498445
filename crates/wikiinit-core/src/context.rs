//! Execution context passed explicitly through an initialization
//!
//! The context carries the synthetic request an initialization runs under,
//! the container state primed from it, and the platform handle once one is
//! bound. A context is built for one attempt and never shared between wikis.

use std::fmt;
use std::sync::Arc;

use crate::platform::PlatformInstance;
use crate::request::{RequestAction, SyntheticRequest};

/// How the platform should treat the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    /// Bound to a (synthetic) servlet request
    Servlet,
    /// Background work without a request
    #[default]
    Daemon,
}

/// Which parts of the container have been primed from the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerState {
    pub request: bool,
    pub response: bool,
    pub session: bool,
}

impl ContainerState {
    pub fn is_fully_initialized(&self) -> bool {
        self.request && self.response && self.session
    }
}

/// Execution context for one initialization attempt
#[derive(Clone, Default)]
pub struct ExecutionContext {
    action: RequestAction,
    mode: ContextMode,
    request: Option<SyntheticRequest>,
    wiki_id: Option<String>,
    container: ContainerState,
    platform: Option<Arc<dyn PlatformInstance>>,
}

impl ExecutionContext {
    /// Context bound to a synthetic request, in servlet mode
    pub fn for_request(request: SyntheticRequest) -> Self {
        Self {
            action: request.action(),
            mode: ContextMode::Servlet,
            request: Some(request),
            ..Self::default()
        }
    }

    /// Context without a request, optionally bound to a platform handle
    pub fn detached(platform: Option<Arc<dyn PlatformInstance>>) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn action(&self) -> RequestAction {
        self.action
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    pub fn request(&self) -> Option<&SyntheticRequest> {
        self.request.as_ref()
    }

    pub fn wiki_id(&self) -> Option<&str> {
        self.wiki_id.as_deref()
    }

    pub fn set_wiki_id(&mut self, wiki_id: impl Into<String>) {
        self.wiki_id = Some(wiki_id.into());
    }

    pub fn container(&self) -> ContainerState {
        self.container
    }

    /// Mutable container state, updated by the container collaborator
    pub fn container_mut(&mut self) -> &mut ContainerState {
        &mut self.container
    }

    pub fn platform(&self) -> Option<&Arc<dyn PlatformInstance>> {
        self.platform.as_ref()
    }

    pub fn bind_platform(&mut self, platform: Arc<dyn PlatformInstance>) {
        self.platform = Some(platform);
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("action", &self.action)
            .field("mode", &self.mode)
            .field("request", &self.request)
            .field("wiki_id", &self.wiki_id)
            .field("container", &self.container)
            .field("platform_bound", &self.platform.is_some())
            .finish()
    }
}
