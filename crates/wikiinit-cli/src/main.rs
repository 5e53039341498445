//! Wiki Initializer CLI
//!
//! Inspect and exercise the wiki initializer configuration.
//!
//! Usage:
//! ```bash
//! # Show the settings resolved for the main wiki
//! wikiinit --config xwiki.properties resolve
//!
//! # Show the synthetic request of a sub-wiki
//! wikiinit --config xwiki.properties request --wiki alpha
//!
//! # Run both lifecycle signals against a dry-run platform
//! wikiinit --config xwiki.properties simulate --wikis alpha,beta,gamma
//! ```

mod bootstrap;
mod dry_run;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use bootstrap::BootstrapConfig;
use dry_run::DryRunPlatform;
use wikiinit_core::{InitTarget, LifecycleSignal, WikiDescriptor};
use wikiinit_engine::{
    BatchReport, DefaultWikiInitializationManager, PlatformServices, RequestSynthesizer,
    SignalOutcome, WikiInitializationListener, WikiInitializerConfiguration,
};
use wikiinit_observability::{Metrics, init_logging};

#[derive(Parser)]
#[command(name = "wikiinit")]
#[command(about = "Warm up wikis ahead of first use", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to bootstrap file (YAML or TOML)
    #[arg(long, value_name = "FILE", env = "WIKIINIT_BOOTSTRAP", global = true)]
    bootstrap: Option<String>,

    /// Settings file (YAML, TOML or .properties); may be repeated
    #[arg(short, long = "config", value_name = "FILE", global = true)]
    config: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the settings resolved for a wiki as JSON
    Resolve {
        /// Wiki id; the main wiki when omitted
        #[arg(long)]
        wiki: Option<String>,
    },
    /// Print the synthetic initial request of a wiki as JSON
    Request {
        /// Wiki id; the main wiki when omitted
        #[arg(long)]
        wiki: Option<String>,
    },
    /// Send both lifecycle signals against a dry-run platform
    Simulate {
        /// Wikis known to the dry-run registry
        #[arg(long, value_delimiter = ',')]
        wikis: Vec<String>,

        /// Print Prometheus metrics after the run
        #[arg(long, default_value = "false")]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let bootstrap = match &cli.bootstrap {
        Some(path) => BootstrapConfig::from_file(path)?,
        None => BootstrapConfig::default(),
    };

    init_logging(&bootstrap.logging).context("Failed to install logging")?;
    debug!("Bootstrap: {:?}", bootstrap);

    let source = bootstrap.build_source(&cli.config)?;
    info!("Settings read from {} source(s)", source.len());

    let metrics = Metrics::new()?;
    let configuration = WikiInitializerConfiguration::new(Arc::new(source))
        .with_metrics(metrics.clone());
    let configuration = Arc::new(configuration);

    match cli.command {
        Commands::Resolve { wiki } => {
            let target = target(wiki);
            let resolved = configuration.resolve(&target);
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Request { wiki } => {
            let target = target(wiki);
            let resolved = configuration.resolve(&target);
            let synthesizer = RequestSynthesizer::new(bootstrap.platform_context_path.clone());
            let request = synthesizer.synthesize(&target, &resolved);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::Simulate {
            wikis,
            metrics: print_metrics,
        } => {
            let platform = Arc::new(DryRunPlatform::new(&wikis));
            let services = PlatformServices {
                bootstrap: platform.clone(),
                container: platform.clone(),
                observation: platform.clone(),
                contexts: platform.clone(),
            };
            let manager = Arc::new(
                DefaultWikiInitializationManager::new(
                    configuration.clone(),
                    RequestSynthesizer::new(bootstrap.platform_context_path.clone()),
                    services,
                )
                .with_metrics(metrics.clone()),
            );
            let listener =
                WikiInitializationListener::new(configuration, platform.clone(), manager);

            let started = listener
                .on_event(&LifecycleSignal::ApplicationStarted)
                .await;
            let started = describe_main(started).await;
            let ready = describe_batch(
                listener
                    .on_event(&LifecycleSignal::ApplicationReady { wiki: None })
                    .await,
            );

            let summary = json!({
                "started": started,
                "ready": ready,
                "calls": platform.calls(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if print_metrics {
                println!("{}", metrics.gather_text()?);
            }
        }
    }

    Ok(())
}

fn target(wiki: Option<String>) -> InitTarget {
    let descriptor = wiki.map(WikiDescriptor::from_id);
    InitTarget::resolve(descriptor.as_ref())
}

/// Wait for a scheduled main wiki job so the simulation reports its result
async fn describe_main(outcome: SignalOutcome) -> serde_json::Value {
    match outcome {
        SignalOutcome::Skipped => json!("skipped"),
        SignalOutcome::MainInitialized => json!("initialized"),
        SignalOutcome::MainFailed(e) => json!({ "failed": e.source.to_string() }),
        SignalOutcome::MainScheduled(handle) => match handle.await {
            Ok(Ok(())) => json!("initialized (delayed)"),
            Ok(Err(e)) => json!({ "failed": e.source.to_string() }),
            Err(e) => json!({ "failed": format!("job aborted: {}", e) }),
        },
        other => json!(format!("{:?}", other)),
    }
}

fn describe_batch(outcome: SignalOutcome) -> serde_json::Value {
    match outcome {
        SignalOutcome::Batch(report) => batch_json(&report),
        SignalOutcome::RegistryUnavailable(e) => json!({ "registry_unavailable": e.to_string() }),
        other => json!(format!("{:?}", other)),
    }
}

fn batch_json(report: &BatchReport) -> serde_json::Value {
    let failed: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| json!({ "wiki": f.wiki_id(), "error": f.source.to_string() }))
        .collect();

    json!({
        "attempted": report.attempted,
        "succeeded": report.succeeded,
        "failed": failed,
    })
}
