//! Lifecycle signals consumed by the initializer
//!
//! The set is closed: the host's event names are mapped onto these variants
//! at the boundary and anything else is ignored.

use crate::tenant::WikiDescriptor;

/// Host event name of the "application started" signal
pub const APPLICATION_STARTED: &str = "ApplicationStartedEvent";

/// Host event name of the "application ready" signal
pub const APPLICATION_READY: &str = "ApplicationReadyEvent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The platform process started (fires once)
    ApplicationStarted,
    /// A wiki (or the whole application) is ready to serve requests
    ApplicationReady { wiki: Option<WikiDescriptor> },
}

impl LifecycleSignal {
    /// Map a host event name onto a signal, `None` for unrelated events
    pub fn from_event_name(name: &str, wiki: Option<WikiDescriptor>) -> Option<Self> {
        match name {
            APPLICATION_STARTED => Some(Self::ApplicationStarted),
            APPLICATION_READY => Some(Self::ApplicationReady { wiki }),
            _ => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ApplicationStarted => APPLICATION_STARTED,
            Self::ApplicationReady { .. } => APPLICATION_READY,
        }
    }
}
