//! Ordered stack of configuration sources

use std::sync::Arc;
use tracing::warn;

use wikiinit_core::{ConfigSource, ConfigValue, Result};

/// Configuration source consulting several layers in order
///
/// The first layer holding a non-empty value for a key wins. A layer that
/// fails to read is logged and skipped so one broken file doesn't hide the
/// remaining layers.
#[derive(Clone, Default)]
pub struct LayeredConfigSource {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl LayeredConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower precedence than the existing ones
    pub fn with_layer(mut self, layer: Arc<dyn ConfigSource>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigSource for LayeredConfigSource {
    fn get_property(&self, key: &str) -> Result<Option<ConfigValue>> {
        for layer in &self.layers {
            match layer.get_property(key) {
                Ok(Some(value)) if !value.is_empty() => return Ok(Some(value)),
                Ok(_) => {}
                Err(e) => warn!(
                    "Skipping {} configuration layer for key [{}]: {}",
                    layer.name(),
                    key,
                    e
                ),
            }
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "layered"
    }
}
