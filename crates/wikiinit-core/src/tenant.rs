//! Wiki descriptors and initialization targets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved identifier of the main wiki.
pub const MAIN_WIKI_ID: &str = "xwiki";

/// Configuration segment used for the main wiki's initial request keys.
pub const MAIN_WIKI_SEGMENT: &str = "main";

/// Descriptor of a hosted wiki, as known to the wiki registry.
///
/// The registry is the owner of descriptors; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WikiDescriptor {
    id: String,
    pretty_name: String,
}

impl WikiDescriptor {
    /// Create a descriptor with an explicit display name
    pub fn new(id: impl Into<String>, pretty_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pretty_name: pretty_name.into(),
        }
    }

    /// Create a descriptor using the id as display name
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            pretty_name: id.clone(),
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pretty_name(&self) -> &str {
        &self.pretty_name
    }

    /// Whether this descriptor designates the main wiki
    pub fn is_main(&self) -> bool {
        self.id == MAIN_WIKI_ID
    }
}

impl fmt::Display for WikiDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Wiki an initialization is aimed at.
///
/// Resolved once from an optional descriptor: an absent descriptor or one
/// carrying the reserved main id is the main wiki, anything else a sub-wiki.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InitTarget {
    Main,
    Sub(WikiDescriptor),
}

impl InitTarget {
    pub fn resolve(descriptor: Option<&WikiDescriptor>) -> Self {
        match descriptor {
            Some(descriptor) if !descriptor.is_main() => Self::Sub(descriptor.clone()),
            _ => Self::Main,
        }
    }

    pub fn wiki_id(&self) -> &str {
        match self {
            Self::Main => MAIN_WIKI_ID,
            Self::Sub(descriptor) => descriptor.id(),
        }
    }

    /// Segment under which this target's initial request is configured
    pub fn config_segment(&self) -> &str {
        match self {
            Self::Main => MAIN_WIKI_SEGMENT,
            Self::Sub(descriptor) => descriptor.id(),
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }
}

impl fmt::Display for InitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wiki_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_descriptor_is_main() {
        assert_eq!(InitTarget::resolve(None), InitTarget::Main);
    }

    #[test]
    fn test_reserved_id_is_main() {
        let descriptor = WikiDescriptor::new(MAIN_WIKI_ID, "Main Wiki");
        let target = InitTarget::resolve(Some(&descriptor));
        assert!(target.is_main());
        assert_eq!(target.wiki_id(), MAIN_WIKI_ID);
        assert_eq!(target.config_segment(), MAIN_WIKI_SEGMENT);
    }

    #[test]
    fn test_sub_wiki_target() {
        let descriptor = WikiDescriptor::from_id("alpha");
        let target = InitTarget::resolve(Some(&descriptor));
        assert_eq!(target, InitTarget::Sub(descriptor));
        assert_eq!(target.wiki_id(), "alpha");
        assert_eq!(target.config_segment(), "alpha");
        assert_eq!(target.to_string(), "alpha");
    }

    #[test]
    fn test_from_id_uses_id_as_name() {
        let descriptor = WikiDescriptor::from_id("gamma");
        assert_eq!(descriptor.pretty_name(), "gamma");
        assert!(!descriptor.is_main());
    }
}
