//! Command line front end for the file-based component provider.
//!
//! `components list` prints the components of the configured directory once;
//! `components watch` prints them again after every burst of changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use composite_component_provider::{
    Component, ComponentChange, ComponentChangeNotifier, ComponentProvider,
    ComponentProviderSettings, FileBasedComponentProvider, TagCatalog,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "components")]
#[command(about = "List and watch file-based components")]
struct Cli {
    /// Settings file (TOML); built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Application root that `~/` provider directories resolve against
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current components
    List {
        /// Print JSON instead of one line per component
        #[arg(long)]
        json: bool,
    },

    /// Print the components, then again after each burst of changes
    Watch {
        /// Quiet period before re-listing after a change
        #[arg(long, default_value_t = 250)]
        debounce_ms: u64,

        /// Print JSON instead of one line per component
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => ComponentProviderSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => ComponentProviderSettings::default(),
    };

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to determine the current directory")?,
    };
    info!("Application root: {}", root.display());

    let (notifier, changes) = ComponentChangeNotifier::channel();
    let provider = FileBasedComponentProvider::new(
        &settings,
        &root,
        Arc::new(TagCatalog::new(settings.tags.clone())),
        Arc::new(notifier),
    )
    .context("failed to start the component provider")?;
    let provider = Arc::new(provider);

    match cli.command {
        Command::List { json } => {
            print_components(&provider.get_components(), json)?;
        }
        Command::Watch { debounce_ms, json } => {
            watch(provider, changes, Duration::from_millis(debounce_ms), json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn watch(
    provider: Arc<FileBasedComponentProvider>,
    mut changes: UnboundedReceiver<ComponentChange>,
    debounce: Duration,
    json: bool,
) -> Result<()> {
    print_components(&list(&provider, &mut changes).await?, json)?;
    info!(
        "Watching {} (Ctrl+C to stop)",
        provider.config().directory.display()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Some(change) => {
                    debug!("Change signalled by {}", change.provider_id);
                    deadline = Some(Instant::now() + debounce);
                }
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                print_components(&list(&provider, &mut changes).await?, json)?;
            }
            _ = &mut ctrl_c => {
                info!("Stopping");
                break;
            }
        }
    }

    provider.shutdown();
    Ok(())
}

/// List components without re-triggering the watch loop.
///
/// Listing signals a change of its own. Everything queued before the scan is
/// covered by it, as is the first signal after it.
async fn list(
    provider: &Arc<FileBasedComponentProvider>,
    changes: &mut UnboundedReceiver<ComponentChange>,
) -> Result<Vec<Component>> {
    let stale = drain(changes);
    if stale > 0 {
        debug!("Dropped {stale} change signal(s) covered by this listing");
    }

    let scanning = Arc::clone(provider);
    let components = tokio::task::spawn_blocking(move || scanning.get_components())
        .await
        .context("component scan panicked")?;

    match changes.try_recv() {
        Ok(change) => debug!("Dropped the listing's own signal from {}", change.provider_id),
        Err(e) => debug!("No change signal after listing: {e}"),
    }
    Ok(components)
}

/// Discard every queued change signal and return how many there were.
fn drain(changes: &mut UnboundedReceiver<ComponentChange>) -> usize {
    let mut drained = 0;
    while changes.try_recv().is_ok() {
        drained += 1;
    }
    drained
}

fn print_components(components: &[Component], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(components)?);
        return Ok(());
    }

    for component in components {
        println!("{}", component_line(component));
    }
    println!("{} component(s)", components.len());
    Ok(())
}

fn component_line(component: &Component) -> String {
    let mut line = format!("{}  {}", component.id, component.title);
    if !component.grouping_tags.is_empty() {
        line.push_str(&format!("  [{}]", component.grouping_tags.join(", ")));
    }
    if !component.container_classes.is_empty() {
        line.push_str(&format!("  ({})", component.container_classes.join(" ")));
    }
    line
}
