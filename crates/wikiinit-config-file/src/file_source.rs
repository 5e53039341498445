//! File-based ConfigSource implementation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use wikiinit_core::{ConfigSource, ConfigValue, Error, Result};

use crate::properties;

/// Supported file formats, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
    Properties,
}

impl FileFormat {
    /// Determine the format from a path; YAML is the default
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::Toml,
            Some("properties") | Some("cfg") => Self::Properties,
            _ => Self::Yaml,
        }
    }
}

/// Configuration source backed by a file on disk
///
/// The file is read again on every lookup: values are never cached, so an
/// edit is visible on the next read. Nested YAML/TOML maps are flattened to
/// dotted keys, sequences become lists.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    /// Path to the configuration file
    config_path: PathBuf,
    format: FileFormat,
}

impl FileConfigSource {
    /// Create a new file-based configuration source
    ///
    /// # Arguments
    /// * `config_path` - Path to the configuration file (`~` is expanded)
    ///
    /// # Errors
    /// - `Error::Config` if the home directory can't be determined or the
    ///   file doesn't exist
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();

        // Expand tilde if present
        let expanded = match config_path.strip_prefix("~") {
            Ok(rest) => Some(
                dirs::home_dir()
                    .ok_or_else(|| {
                        Error::Config("Could not determine home directory".to_string())
                    })?
                    .join(rest),
            ),
            Err(_) => None,
        };
        let config_path = expanded.unwrap_or(config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }

        let format = FileFormat::from_path(&config_path);
        info!(
            "Initialized FileConfigSource for {:?} ({:?})",
            config_path, format
        );

        Ok(Self {
            config_path,
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Read, parse and flatten the file
    fn read_config_file(&self) -> Result<HashMap<String, ConfigValue>> {
        let contents = std::fs::read_to_string(&self.config_path).map_err(|e| {
            error!("Failed to read config file {:?}: {}", self.config_path, e);
            Error::Io(e)
        })?;

        let tree: serde_json::Value = match self.format {
            FileFormat::Properties => return Ok(properties::parse(&contents)),
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
                    error!("Failed to parse TOML config: {}", e);
                    Error::Config(format!("Invalid TOML: {}", e))
                })?;
                serde_json::to_value(toml_value)?
            }
            FileFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| {
                error!("Failed to parse YAML config: {}", e);
                Error::Config(format!("Invalid YAML: {}", e))
            })?,
        };

        let mut flat = HashMap::new();
        flatten(None, &tree, &mut flat);
        debug!("Read {} keys from {:?}", flat.len(), self.config_path);
        Ok(flat)
    }
}

impl ConfigSource for FileConfigSource {
    fn get_property(&self, key: &str) -> Result<Option<ConfigValue>> {
        Ok(self.read_config_file()?.remove(key))
    }

    fn name(&self) -> &str {
        "file"
    }
}

fn flatten(
    prefix: Option<&str>,
    value: &serde_json::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    let join = |key: &str| match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    };

    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                flatten(Some(&join(key)), child, out);
            }
        }
        serde_json::Value::Array(items) => {
            if let Some(prefix) = prefix {
                let list = items.iter().filter_map(scalar_to_string).collect();
                out.insert(prefix.to_string(), ConfigValue::List(list));
            }
        }
        other => {
            if let (Some(prefix), Some(scalar)) = (prefix, scalar_to_string(other)) {
                out.insert(prefix.to_string(), ConfigValue::Scalar(scalar));
            }
        }
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let file = Builder::new().suffix(suffix).tempfile().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn test_file_not_found() {
        let result = FileConfigSource::new("/nonexistent/xwiki.properties");
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.toml")), FileFormat::Toml);
        assert_eq!(
            FileFormat::from_path(Path::new("xwiki.properties")),
            FileFormat::Properties
        );
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("config")), FileFormat::Yaml);
    }

    #[test]
    fn test_read_nested_yaml() {
        let file = temp_file(
            ".yaml",
            r#"
wikiInitializer:
  initializeMainWiki: true
  initializableSubWikis: [alpha, beta]
  initialRequest:
    main:
      url: "http://localhost:8080/xwiki/bin/view/Main/"
"#,
        );

        let source = FileConfigSource::new(file.path()).unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.initializeMainWiki")
                .unwrap(),
            Some(ConfigValue::from("true"))
        );
        assert_eq!(
            source
                .get_property("wikiInitializer.initializableSubWikis")
                .unwrap(),
            Some(ConfigValue::from(vec!["alpha", "beta"]))
        );
        assert_eq!(
            source
                .get_property("wikiInitializer.initialRequest.main.url")
                .unwrap(),
            Some(ConfigValue::from("http://localhost:8080/xwiki/bin/view/Main/"))
        );
        assert_eq!(source.get_property("missing").unwrap(), None);
    }

    #[test]
    fn test_read_flat_dotted_yaml_keys() {
        let file = temp_file(".yml", "wikiInitializer.initializeSubWikis: false\n");
        let source = FileConfigSource::new(file.path()).unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.initializeSubWikis")
                .unwrap(),
            Some(ConfigValue::from("false"))
        );
    }

    #[test]
    fn test_read_toml() {
        let file = temp_file(
            ".toml",
            "[wikiInitializer]\nmainWikiInitializationDelay = 5000\n",
        );
        let source = FileConfigSource::new(file.path()).unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.mainWikiInitializationDelay")
                .unwrap(),
            Some(ConfigValue::from("5000"))
        );
    }

    #[test]
    fn test_read_properties() {
        let file = temp_file(
            ".properties",
            "wikiInitializer.initialRequest.main.parameters=foo\n\
             wikiInitializer.initialRequest.main.parameters.foo.value=1\n\
             wikiInitializer.initialRequest.main.parameters.foo.value=2\n",
        );
        let source = FileConfigSource::new(file.path()).unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.initialRequest.main.parameters.foo.value")
                .unwrap(),
            Some(ConfigValue::from(vec!["1", "2"]))
        );
    }

    #[test]
    fn test_changes_visible_on_next_read() {
        let file = temp_file(".properties", "wikiInitializer.initializeMainWiki=false\n");
        let source = FileConfigSource::new(file.path()).unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.initializeMainWiki")
                .unwrap(),
            Some(ConfigValue::from("false"))
        );

        std::fs::write(file.path(), "wikiInitializer.initializeMainWiki=true\n").unwrap();
        assert_eq!(
            source
                .get_property("wikiInitializer.initializeMainWiki")
                .unwrap(),
            Some(ConfigValue::from("true"))
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_tilde_expands_to_home() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join("wikiinit.properties"),
            "wikiInitializer.initializeMainWiki=true\n",
        )
        .unwrap();

        let previous = std::env::var_os("HOME");
        // SAFETY: serialized test, no other thread reads the environment
        unsafe { std::env::set_var("HOME", home.path()) };
        let source = FileConfigSource::new("~/wikiinit.properties");
        unsafe {
            match previous {
                Some(value) => std::env::set_var("HOME", value),
                None => std::env::remove_var("HOME"),
            }
        }

        let source = source.unwrap();
        assert_eq!(source.path(), home.path().join("wikiinit.properties"));
        assert_eq!(
            source
                .get_property("wikiInitializer.initializeMainWiki")
                .unwrap(),
            Some(ConfigValue::from("true"))
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let file = temp_file(".yaml", "key: [unclosed\n");
        let source = FileConfigSource::new(file.path()).unwrap();
        assert!(matches!(
            source.get_property("key").unwrap_err(),
            Error::Config(_)
        ));
    }
}
