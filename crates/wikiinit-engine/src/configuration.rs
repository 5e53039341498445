//! Wiki initializer configuration
//!
//! Resolves the initializer's settings from a `ConfigSource`. Every setting
//! lives under the current `wikiInitializer.` prefix and may also be found
//! under the deprecated `xwikiInitializer.` prefix with the same suffix:
//!
//! ```properties
//! wikiInitializer.initializeMainWiki=true
//! wikiInitializer.initializableSubWikis=alpha,beta
//! wikiInitializer.initialRequest.main.url=http://localhost:8080/xwiki/bin/view/Main/
//! wikiInitializer.initialRequest.main.parameters=foo
//! wikiInitializer.initialRequest.main.parameters.foo.value=bar
//! ```
//!
//! Nothing is cached: every accessor reads the source again.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

use wikiinit_core::{
    ConfigSource, ConfigValue, Cookie, InitTarget, MultiValueMap, WikiDescriptor,
};
use wikiinit_observability::Metrics;

/// Current configuration prefix
pub const CURRENT_PREFIX: &str = "wikiInitializer";

/// Deprecated configuration prefix
pub const LEGACY_PREFIX: &str = "xwikiInitializer";

const INITIALIZE_MAIN_WIKI: &str = "initializeMainWiki";
const INITIALIZE_SUB_WIKIS: &str = "initializeSubWikis";
const START_DISTRIBUTION_WIZARD_ON_INIT: &str = "startDistributionWizardOnInit";
const INITIALIZABLE_SUB_WIKIS: &str = "initializableSubWikis";
const MAIN_WIKI_INITIALIZATION_DELAY: &str = "mainWikiInitializationDelay";
const SUB_WIKI_CONCURRENCY: &str = "subWikiConcurrency";
const SUB_WIKI_INITIALIZATION_TIMEOUT: &str = "subWikiInitializationTimeout";

const INITIAL_REQUEST: &str = "initialRequest";
const URL: &str = "url";
const CONTEXT_PATH: &str = "contextPath";
const PARAMETERS: &str = "parameters";
const HEADERS: &str = "headers";
const COOKIES: &str = "cookies";
const REMOTE_ADDR: &str = "remoteAddress";
const VALUE_SUFFIX: &str = "value";

/// Key prefixes consulted by the resolver, current first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNamespaces {
    pub current: String,
    pub legacy: String,
}

impl Default for ConfigNamespaces {
    fn default() -> Self {
        Self {
            current: CURRENT_PREFIX.to_string(),
            legacy: LEGACY_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Current,
    Legacy,
}

/// Settings resolved for one initialization target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenantConfig {
    pub url: Option<Url>,
    pub context_path: Option<String>,
    pub parameters: MultiValueMap,
    pub headers: MultiValueMap,
    pub cookies: Vec<Cookie>,
    pub remote_addr: Option<String>,
    pub initialize_main_wiki: bool,
    pub initialize_all_sub_wikis: bool,
    pub start_distribution_wizard: bool,
    pub main_wiki_initialization_delay: Duration,
}

/// Configuration resolver of the wiki initializer
#[derive(Clone)]
pub struct WikiInitializerConfiguration {
    source: Arc<dyn ConfigSource>,
    namespaces: ConfigNamespaces,
    metrics: Option<Metrics>,
}

impl WikiInitializerConfiguration {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            namespaces: ConfigNamespaces::default(),
            metrics: None,
        }
    }

    pub fn with_namespaces(mut self, namespaces: ConfigNamespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Count legacy key lookups in the given metrics
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn namespaces(&self) -> &ConfigNamespaces {
        &self.namespaces
    }

    /// Whether the main wiki is initialized on application start
    pub fn initialize_main_wiki(&self) -> bool {
        self.get_bool(INITIALIZE_MAIN_WIKI)
    }

    /// Whether every sub-wiki is initialized on application ready
    pub fn initialize_all_sub_wikis(&self) -> bool {
        self.get_bool(INITIALIZE_SUB_WIKIS)
    }

    /// Whether initialization routes to the distribution wizard
    pub fn start_distribution_wizard(&self) -> bool {
        self.get_bool(START_DISTRIBUTION_WIZARD_ON_INIT)
    }

    /// Delay before the main wiki is initialized; zero means inline
    pub fn main_wiki_initialization_delay(&self) -> Duration {
        self.get_millis(MAIN_WIKI_INITIALIZATION_DELAY)
            .unwrap_or(Duration::ZERO)
    }

    /// Number of sub-wikis initialized in parallel, at least 1
    pub fn sub_wiki_concurrency(&self) -> usize {
        let Some(raw) = self.get_string(SUB_WIKI_CONCURRENCY) else {
            return 1;
        };

        match raw.parse::<usize>() {
            Ok(value) => value.max(1),
            Err(_) => {
                warn!(
                    "Invalid value [{}] for [{}], using sequential initialization",
                    raw, SUB_WIKI_CONCURRENCY
                );
                1
            }
        }
    }

    /// Timeout applied to each sub-wiki initialization, if any
    pub fn sub_wiki_initialization_timeout(&self) -> Option<Duration> {
        self.get_millis(SUB_WIKI_INITIALIZATION_TIMEOUT)
            .filter(|timeout| !timeout.is_zero())
    }

    pub fn initial_request_url(&self, target: &InitTarget) -> Option<Url> {
        let raw = self.get_string(&request_suffix(target, URL))?;
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    "Ignoring malformed initial request URL [{}] for wiki [{}]: {}",
                    raw, target, e
                );
                None
            }
        }
    }

    pub fn initial_request_context_path(&self, target: &InitTarget) -> Option<String> {
        self.get_string(&request_suffix(target, CONTEXT_PATH))
    }

    pub fn initial_request_parameters(&self, target: &InitTarget) -> MultiValueMap {
        self.get_multi_valued(&request_suffix(target, PARAMETERS))
    }

    pub fn initial_request_headers(&self, target: &InitTarget) -> MultiValueMap {
        self.get_multi_valued(&request_suffix(target, HEADERS))
    }

    pub fn initial_request_cookies(&self, target: &InitTarget) -> Vec<Cookie> {
        let suffix = request_suffix(target, COOKIES);
        let Some((names, namespace)) = self.get_property(&suffix) else {
            return Vec::new();
        };

        let base = self.key(namespace, &suffix);
        names
            .as_list()
            .into_iter()
            .map(|name| {
                let value = self
                    .lookup(&value_key(&base, &name))
                    .map(|v| v.as_scalar())
                    .unwrap_or_default();
                Cookie::new(name, value)
            })
            .collect()
    }

    pub fn initial_request_remote_addr(&self, target: &InitTarget) -> Option<String> {
        self.get_string(&request_suffix(target, REMOTE_ADDR))
    }

    /// Wikis to initialize when not initializing every sub-wiki
    ///
    /// Each configured id becomes a descriptor using the id as its name.
    pub fn initializable_wikis(&self) -> Vec<WikiDescriptor> {
        let mut wikis: Vec<WikiDescriptor> = Vec::new();
        let ids = self
            .get_property(INITIALIZABLE_SUB_WIKIS)
            .map(|(value, _)| value.as_list())
            .unwrap_or_default();

        for id in ids {
            if !wikis.iter().any(|wiki| wiki.id() == id) {
                wikis.push(WikiDescriptor::from_id(id));
            }
        }
        wikis
    }

    /// Resolve every setting for a target
    pub fn resolve(&self, target: &InitTarget) -> TenantConfig {
        TenantConfig {
            url: self.initial_request_url(target),
            context_path: self.initial_request_context_path(target),
            parameters: self.initial_request_parameters(target),
            headers: self.initial_request_headers(target),
            cookies: self.initial_request_cookies(target),
            remote_addr: self.initial_request_remote_addr(target),
            initialize_main_wiki: self.initialize_main_wiki(),
            initialize_all_sub_wikis: self.initialize_all_sub_wikis(),
            start_distribution_wizard: self.start_distribution_wizard(),
            main_wiki_initialization_delay: self.main_wiki_initialization_delay(),
        }
    }

    /// Resolve for an optional descriptor, `None` being the main wiki
    pub fn resolve_for(&self, descriptor: Option<&WikiDescriptor>) -> TenantConfig {
        self.resolve(&InitTarget::resolve(descriptor))
    }

    fn key(&self, namespace: Namespace, suffix: &str) -> String {
        let prefix = match namespace {
            Namespace::Current => &self.namespaces.current,
            Namespace::Legacy => &self.namespaces.legacy,
        };
        format!("{}.{}", prefix, suffix)
    }

    /// Raw lookup; unreadable sources and blank values count as absent
    fn lookup(&self, key: &str) -> Option<ConfigValue> {
        match self.source.get_property(key) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "Failed to read configuration key [{}] from {} source: {}",
                    key,
                    self.source.name(),
                    e
                );
                None
            }
        }
    }

    /// Current key first, then the legacy key with a deprecation warning
    fn get_property(&self, suffix: &str) -> Option<(ConfigValue, Namespace)> {
        let key = self.key(Namespace::Current, suffix);
        if let Some(value) = self.lookup(&key) {
            return Some((value, Namespace::Current));
        }

        let legacy_key = self.key(Namespace::Legacy, suffix);
        let value = self.lookup(&legacy_key)?;
        warn!(
            "Configuration key [{}] is deprecated and may be removed in a future release, please use [{}] instead.",
            legacy_key, key
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_legacy_lookup(&legacy_key);
        }
        Some((value, Namespace::Legacy))
    }

    fn get_string(&self, suffix: &str) -> Option<String> {
        self.get_property(suffix).map(|(value, _)| value.as_scalar())
    }

    fn get_bool(&self, suffix: &str) -> bool {
        let Some(raw) = self.get_string(suffix) else {
            return false;
        };

        match raw.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => true,
            "false" | "no" | "off" | "0" => false,
            _ => {
                warn!("Invalid boolean [{}] for [{}], using false", raw, suffix);
                false
            }
        }
    }

    fn get_millis(&self, suffix: &str) -> Option<Duration> {
        let raw = self.get_string(suffix)?;
        match raw.parse::<u64>() {
            Ok(millis) => Some(Duration::from_millis(millis)),
            Err(_) => {
                warn!("Invalid duration [{}] for [{}], ignoring it", raw, suffix);
                None
            }
        }
    }

    /// Names list plus one `<key>.<name>.value` list per name, all read from
    /// the namespace that provided the names
    fn get_multi_valued(&self, suffix: &str) -> MultiValueMap {
        let mut values = MultiValueMap::new();
        let Some((names, namespace)) = self.get_property(suffix) else {
            return values;
        };

        let base = self.key(namespace, suffix);
        for name in names.as_list() {
            let found = self
                .lookup(&value_key(&base, &name))
                .map(|v| v.as_list())
                .unwrap_or_default();
            values.entry(name).or_default().extend(found);
        }
        values
    }
}

fn request_suffix(target: &InitTarget, field: &str) -> String {
    format!("{}.{}.{}", INITIAL_REQUEST, target.config_segment(), field)
}

fn value_key(base: &str, name: &str) -> String {
    format!("{}.{}.{}", base, name, VALUE_SUFFIX)
}
