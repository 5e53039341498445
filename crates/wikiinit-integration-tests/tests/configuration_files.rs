//! Initializer settings read from configuration files
//!
//! Exercises the resolver over real files, including deprecated keys and
//! layered sources.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use wikiinit_config_file::{FileConfigSource, LayeredConfigSource};
use wikiinit_core::{Cookie, InitTarget, WikiDescriptor};
use wikiinit_engine::{RequestSynthesizer, WikiInitializerConfiguration};

struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_properties_file_with_legacy_keys() {
    let file = temp_file(
        ".properties",
        "\
# Deprecated keys still honored
xwikiInitializer.initializeMainWiki=true
xwikiInitializer.initialRequest.main.cookies=JSESSIONID
xwikiInitializer.initialRequest.main.cookies.JSESSIONID.value=abc123
wikiInitializer.initialRequest.main.remoteAddress=192.168.1.10
",
    );
    let source = Arc::new(FileConfigSource::new(file.path()).unwrap());
    let configuration = WikiInitializerConfiguration::new(source);

    let counter = Arc::new(AtomicUsize::new(0));
    let layer = WarnCounter(counter.clone());
    let subscriber = tracing_subscriber::registry().with(layer);
    let resolved = tracing::subscriber::with_default(subscriber, || {
        configuration.resolve(&InitTarget::Main)
    });

    assert!(resolved.initialize_main_wiki);
    assert_eq!(resolved.cookies, vec![Cookie::new("JSESSIONID", "abc123")]);
    assert_eq!(resolved.remote_addr.as_deref(), Some("192.168.1.10"));
    // One warning per deprecated key read: the flag and the cookie names
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_yaml_file_per_wiki_request() {
    let file = temp_file(
        ".yaml",
        r#"
wikiInitializer:
  initializableSubWikis: [alpha, beta]
  initialRequest:
    alpha:
      url: https://alpha.example.org/xwiki/bin/view/Main/
      contextPath: /alpha
      parameters: [lang]
      parameters.lang.value: fr
"#,
    );
    let source = Arc::new(FileConfigSource::new(file.path()).unwrap());
    let configuration = WikiInitializerConfiguration::new(source);

    assert_eq!(
        configuration.initializable_wikis(),
        vec![
            WikiDescriptor::from_id("alpha"),
            WikiDescriptor::from_id("beta")
        ]
    );

    let target = InitTarget::Sub(WikiDescriptor::from_id("alpha"));
    let synthesizer = RequestSynthesizer::new("/xwiki");
    let request = synthesizer.synthesize(&target, &configuration.resolve(&target));
    assert_eq!(request.context_path(), "/alpha");
    assert_eq!(request.parameter("lang"), Some(&["fr".to_string()][..]));

    let beta = InitTarget::Sub(WikiDescriptor::from_id("beta"));
    let request = synthesizer.synthesize(&beta, &configuration.resolve(&beta));
    assert_eq!(request.context_path(), "/xwiki");
    assert!(request.url().is_none());
}

#[test]
fn test_layered_files_first_wins() {
    let site = temp_file(".toml", "[wikiInitializer]\ninitializeSubWikis = true\n");
    let defaults = temp_file(
        ".properties",
        "wikiInitializer.initializeSubWikis=false\n\
         wikiInitializer.initializeMainWiki=true\n",
    );

    let source = LayeredConfigSource::new()
        .with_layer(Arc::new(FileConfigSource::new(site.path()).unwrap()))
        .with_layer(Arc::new(FileConfigSource::new(defaults.path()).unwrap()));
    let configuration = WikiInitializerConfiguration::new(Arc::new(source));

    assert!(configuration.initialize_all_sub_wikis());
    assert!(configuration.initialize_main_wiki());
}

#[test]
fn test_file_edits_visible_on_next_read() {
    let file = temp_file(".properties", "wikiInitializer.initializeMainWiki=false\n");
    let source = FileConfigSource::new(file.path()).unwrap();
    let configuration = WikiInitializerConfiguration::new(Arc::new(source));
    assert!(!configuration.initialize_main_wiki());

    std::fs::write(file.path(), "wikiInitializer.initializeMainWiki=true\n").unwrap();
    assert!(configuration.initialize_main_wiki());
}
