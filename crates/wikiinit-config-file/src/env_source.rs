//! Environment variable configuration overrides

use wikiinit_core::{ConfigSource, ConfigValue, Result};

/// Configuration source reading environment variables
///
/// A key maps to `<prefix><KEY>` where dots become underscores and the key is
/// upper-cased: with prefix `WIKIINIT_`, `wikiInitializer.initializeMainWiki`
/// is read from `WIKIINIT_WIKIINITIALIZER_INITIALIZEMAINWIKI`. Lists are
/// written comma-separated.
#[derive(Debug, Clone)]
pub struct EnvConfigSource {
    prefix: String,
}

impl EnvConfigSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a configuration key
    pub fn variable_name(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.prefix,
            key.replace(['.', '-'], "_").to_uppercase()
        )
    }
}

impl ConfigSource for EnvConfigSource {
    fn get_property(&self, key: &str) -> Result<Option<ConfigValue>> {
        Ok(std::env::var(self.variable_name(key))
            .ok()
            .map(ConfigValue::Scalar))
    }

    fn name(&self) -> &str {
        "env"
    }
}
