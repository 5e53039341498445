//! Synthetic request construction

use tracing::trace;

use wikiinit_core::{InitTarget, RequestAction, SyntheticRequest};

use crate::configuration::TenantConfig;

/// Builds the initial request of a wiki from its resolved settings
#[derive(Debug, Clone, Default)]
pub struct RequestSynthesizer {
    platform_context_path: String,
}

impl RequestSynthesizer {
    /// # Arguments
    /// * `platform_context_path` - Context path the platform is served under,
    ///   used when a wiki doesn't configure its own
    pub fn new(platform_context_path: impl Into<String>) -> Self {
        Self {
            platform_context_path: platform_context_path.into(),
        }
    }

    pub fn platform_context_path(&self) -> &str {
        &self.platform_context_path
    }

    /// Build the request for `target`
    ///
    /// The same inputs always give the same request.
    pub fn synthesize(&self, target: &InitTarget, config: &TenantConfig) -> SyntheticRequest {
        let context_path = match config.context_path.as_deref() {
            Some(path) if !path.trim().is_empty() => path.to_string(),
            _ => self.platform_context_path.clone(),
        };

        let action = if config.start_distribution_wizard {
            RequestAction::Distribution
        } else {
            RequestAction::View
        };

        trace!(
            "Synthesized {} request for wiki [{}] under [{}]",
            action, target, context_path
        );

        SyntheticRequest::builder()
            .action(action)
            .url(config.url.clone())
            .context_path(context_path)
            .parameters(config.parameters.clone())
            .headers(config.headers.clone())
            .cookies(config.cookies.clone())
            .remote_addr(config.remote_addr.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wikiinit_core::{Cookie, MultiValueMap, WikiDescriptor};

    fn synthesizer() -> RequestSynthesizer {
        RequestSynthesizer::new("/xwiki")
    }

    #[test]
    fn test_context_path_defaults_to_platform() {
        let config = TenantConfig::default();
        let request = synthesizer().synthesize(&InitTarget::Main, &config);
        assert_eq!(request.context_path(), "/xwiki");
        assert_eq!(request.action(), RequestAction::View);
        assert!(request.url().is_none());
    }

    #[test]
    fn test_blank_context_path_defaults_to_platform() {
        let config = TenantConfig {
            context_path: Some("  ".to_string()),
            ..TenantConfig::default()
        };
        let request = synthesizer().synthesize(&InitTarget::Main, &config);
        assert_eq!(request.context_path(), "/xwiki");
    }

    #[test]
    fn test_configured_values_are_copied() {
        let mut parameters = MultiValueMap::new();
        parameters.insert("foo".to_string(), vec!["1".to_string()]);
        let mut headers = MultiValueMap::new();
        headers.insert(
            "X-Forwarded-Host".to_string(),
            vec!["wiki.example.org".to_string()],
        );

        let config = TenantConfig {
            url: Url::parse("https://alpha.example.org/xwiki/bin/view/Main/").ok(),
            context_path: Some("/alpha".to_string()),
            parameters,
            headers,
            cookies: vec![Cookie::new("lang", "en")],
            remote_addr: Some("127.0.0.1".to_string()),
            ..TenantConfig::default()
        };
        let target = InitTarget::Sub(WikiDescriptor::from_id("alpha"));
        let request = synthesizer().synthesize(&target, &config);

        assert_eq!(request.context_path(), "/alpha");
        assert_eq!(
            request.url().map(|u| u.as_str()),
            Some("https://alpha.example.org/xwiki/bin/view/Main/")
        );
        assert_eq!(request.parameter("foo"), Some(&["1".to_string()][..]));
        assert_eq!(
            request.header("x-forwarded-host"),
            Some(&["wiki.example.org".to_string()][..])
        );
        assert_eq!(request.cookies(), &[Cookie::new("lang", "en")]);
        assert_eq!(request.remote_addr(), Some("127.0.0.1"));
    }

    #[test]
    fn test_wizard_flag_selects_distribution_action() {
        let config = TenantConfig {
            start_distribution_wizard: true,
            ..TenantConfig::default()
        };
        let request = synthesizer().synthesize(&InitTarget::Main, &config);
        assert_eq!(request.action(), RequestAction::Distribution);
    }

    #[test]
    fn test_synthesis_is_repeatable() {
        let config = TenantConfig {
            context_path: Some("/ctx".to_string()),
            remote_addr: Some("10.1.1.1".to_string()),
            ..TenantConfig::default()
        };
        let first = synthesizer().synthesize(&InitTarget::Main, &config);
        let second = synthesizer().synthesize(&InitTarget::Main, &config);
        assert_eq!(first, second);
    }
}
