//! OmniSync - keep a task manager in step with issue trackers.
//!
//! Reads the items each source wants, compares them with what the target
//! holds, and creates or completes tasks until the two agree.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use omnisync::config::{self, Config};
use omnisync::core::{reconcile_items, ChangeSummary};
use omnisync::model::{collect_tags, project_for_url, DesiredItem, ObservedItem};
use omnisync::sync::{
    diverging_names, ApplyPolicy, DesiredStateProvider, FileTarget, RetryingApplier,
    SnapshotSource, SyncError, SyncPass, SyncReport,
};

/// Sync issue tracker items into a task manager
#[derive(Parser)]
#[command(name = "omnisync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration directory (defaults to ~/.config/omnisync)
    #[arg(long, global = true, env = "OMNISYNC_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes that would reconcile two item lists
    Plan {
        /// JSON array of desired items
        #[arg(long)]
        desired: PathBuf,

        /// JSON array of observed items
        #[arg(long)]
        observed: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a sync pass over saved source responses
    Sync {
        /// Directory holding one `<source name>.json` response per source
        #[arg(long)]
        responses: PathBuf,

        /// JSON file holding the target's tasks
        #[arg(long)]
        state: PathBuf,

        /// Show what would change without applying anything
        #[arg(long)]
        dry_run: bool,

        /// Keep applying changes after one fails
        #[arg(long)]
        keep_going: bool,
    },

    /// List configured projects
    Projects,

    /// List configured sources
    Sources,

    /// Show the project a URL belongs to
    Match {
        /// Item URL
        url: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Show configuration
    Config {
        /// Show config directory path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.clone().or_else(Config::default_dir);
    let settings = config_dir.as_deref().map_or_else(|| Ok(Config::default()), Config::load);

    // Setup logging
    let level = settings.as_ref().map_or("warn", |s| s.logging.level.as_str());
    init_logging(cli.verbose, level);

    let settings = settings.context("Failed to load settings")?;

    match cli.command {
        Commands::Plan { desired, observed, format } => {
            cmd_plan(&desired, &observed, format)?;
        }
        Commands::Sync { responses, state, dry_run, keep_going } => {
            let dir = require_dir(config_dir.as_deref())?;
            cmd_sync(dir, &settings, &responses, &state, dry_run, keep_going)?;
        }
        Commands::Projects => {
            cmd_projects(require_dir(config_dir.as_deref())?)?;
        }
        Commands::Sources => {
            cmd_sources(require_dir(config_dir.as_deref())?)?;
        }
        Commands::Match { url } => {
            cmd_match(require_dir(config_dir.as_deref())?, &url)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
        Commands::Config { path } => {
            cmd_config(config_dir.as_deref(), &settings, path)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_logging(verbose: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn require_dir(dir: Option<&Path>) -> Result<&Path> {
    dir.context("Could not determine the configuration directory; pass --config-dir")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print the plan for two item lists.
fn cmd_plan(desired: &Path, observed: &Path, format: OutputFormat) -> Result<()> {
    let desired: Vec<DesiredItem> = read_json(desired)?;
    let observed: Vec<ObservedItem> = read_json(observed)?;
    let changes = reconcile_items(desired, observed);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&changes)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for change in &changes {
                println!("{change}");
            }
            println!("\n{}", ChangeSummary::of(&changes));

            let diverging = diverging_names(&changes);
            if !diverging.is_empty() {
                println!(
                    "Warning: added and removed under different keys: {}",
                    diverging.join(", ")
                );
            }
        }
    }

    Ok(())
}

/// Run a full sync pass.
fn cmd_sync(
    dir: &Path,
    settings: &Config,
    responses: &Path,
    state: &Path,
    dry_run: bool,
    keep_going: bool,
) -> Result<()> {
    let projects = config::load_projects(dir)?;
    let sources = config::load_sources(dir)?;

    let providers: Vec<Box<dyn DesiredStateProvider>> =
        SnapshotSource::for_sources(sources, responses)
            .into_iter()
            .map(|source| Box::new(source) as Box<dyn DesiredStateProvider>)
            .collect();

    let target = Arc::new(FileTarget::new(state));
    let applier = RetryingApplier::new(Arc::clone(&target), settings.sync.retry_config());

    let policy = if keep_going { ApplyPolicy::Continue } else { settings.sync.policy };
    let pass = SyncPass::new(&projects).policy(policy).dry_run(dry_run);

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    let report = match rt.block_on(pass.run(&providers, target.as_ref(), &applier)) {
        Ok(report) => report,
        Err(SyncError::Aborted { change, error, report }) => {
            print_report(&report, dry_run);
            anyhow::bail!("Sync aborted after `{change}` failed: {error}");
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report, dry_run);

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} change(s) failed to apply");
    }

    Ok(())
}

fn print_report(report: &SyncReport, dry_run: bool) {
    for project in &report.projects {
        if project.changes.is_empty() {
            continue;
        }

        println!("{} -> {}", project.source, project.project);
        for change in &project.changes {
            println!("  {change}");
        }
        if !project.diverging.is_empty() {
            println!(
                "  Warning: added and removed under different keys: {}",
                project.diverging.join(", ")
            );
        }
        if let Some(applied) = &project.applied {
            for failure in &applied.failures {
                println!("  Failed: {} ({})", failure.change, failure.error);
            }
            if applied.skipped > 0 {
                println!("  Skipped: {}", applied.skipped);
            }
        }
    }

    if dry_run {
        println!("[DRY RUN] {}", report.summary());
    } else {
        println!("{}", report.summary());
    }
    if report.unmatched > 0 {
        println!("Unmatched items: {}", report.unmatched);
    }
}

/// List configured projects.
fn cmd_projects(dir: &Path) -> Result<()> {
    let projects = config::load_projects(dir)?;
    for project in &projects {
        println!("{project}");
    }
    println!("\nTotal: {} projects", projects.len());
    Ok(())
}

/// List configured sources.
fn cmd_sources(dir: &Path) -> Result<()> {
    let sources = config::load_sources(dir)?;
    for source in &sources {
        if source.tags.is_empty() {
            println!("{}: {}", source.name, source.url);
        } else {
            println!("{}: {} [{}]", source.name, source.url, source.tags.join(", "));
        }
    }

    let tags = collect_tags(&sources);
    if !tags.is_empty() {
        println!("\nTags: {}", tags.join(", "));
    }
    Ok(())
}

/// Print the project a URL maps to.
fn cmd_match(dir: &Path, url: &str) -> Result<()> {
    let projects = config::load_projects(dir)?;
    let project = project_for_url(url, &projects)?;
    println!("{project}");
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "omnisync", &mut io::stdout());
}

/// Show configuration.
fn cmd_config(dir: Option<&Path>, settings: &Config, show_path: bool) -> Result<()> {
    if show_path {
        println!("{}", require_dir(dir)?.display());
        return Ok(());
    }

    let toml = toml::to_string_pretty(settings)?;
    println!("{toml}");

    Ok(())
}
