use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};
use repo2score::aggregate::{self, SortKey};
use repo2score::cache::{FileStore, HandoffCache, HandoffRecord};
use repo2score::client::{AnalysisClient, AnalysisError};
use repo2score::config::{self, Config};
use repo2score::models::BulkAnalysisResponse;
use repo2score::nav::{Page, Route};
use repo2score::progress::SyntheticProgress;
use repo2score::report::{self, Format, Tab};
use serde::Serialize;
use repo2score::view::{AnalysisView, ViewStatus};
use repo2score::{repo, samples};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Analyze a Git repository with a remote code-analysis service"
)]
struct Args {
    /// Project directory used for configuration and repository discovery
    #[arg(short, long, default_value = ".", global = true)]
    path: String,
    /// Analysis service base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Print raw JSON instead of a report
    #[arg(long, global = true)]
    json: bool,
    /// Write the report to a file (.md or .json) instead of stdout
    #[arg(short, long, global = true)]
    output: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a project configuration file
    Init,
    /// Edit configuration interactively
    Config {
        /// Edit the global configuration
        #[arg(short, long)]
        global: bool,
    },
    /// List the source files the service discovers
    Files {
        #[command(flatten)]
        target: Target,
        /// Languages to list in full; others show only their count
        #[arg(short, long)]
        expand: Vec<String>,
    },
    /// Analyze the main file (or one specific file) of a repository
    Analyze {
        #[command(flatten)]
        target: Target,
        /// Relative path of the file to analyze
        #[arg(short, long)]
        file: Option<String>,
        /// Languages to list in full; others show only their count
        #[arg(short, long)]
        expand: Vec<String>,
    },
    /// Analyze every file of a repository
    Bulk {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, value_enum, default_value_t = SortKey::Score)]
        sort: SortKey,
        #[arg(short, long, value_enum, default_value_t = Tab::All)]
        tab: Tab,
        /// Remember this file for the detail view
        #[arg(long)]
        select: Option<String>,
        /// Pick a file for the detail view from a list
        #[arg(short, long)]
        interactive: bool,
    },
    /// Show the file remembered by `bulk --select`
    Details {
        /// Detail-view link, e.g. /file-details?repo=...&branch=...&file=...
        link: Option<String>,
        #[arg(short, long)]
        repo: Option<String>,
        #[arg(short, long)]
        branch: Option<String>,
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Render a saved JSON bulk report as Markdown
    GenerateMd {
        #[arg(short, long)]
        report: String,
        #[arg(short, long, value_enum, default_value_t = SortKey::Score)]
        sort: SortKey,
    },
    /// List sample repositories
    Samples,
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Repository URL (defaults to the origin remote of --path)
    #[arg(short, long)]
    repo: Option<String>,
    /// Branch; empty lets the service choose
    #[arg(short, long)]
    branch: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let project_path = PathBuf::from(&args.path);
    if !project_path.exists() {
        error!("path does not exist: {}", project_path.display());
        return Err(anyhow!("path does not exist: {}", project_path.display()));
    }

    let mut config = config::Config::load(&project_path)?;
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    match &args.command {
        Commands::Init => config::init_project(&project_path),
        Commands::Config { global } => config::configure_interactive(&project_path, *global).await,
        Commands::Samples => {
            print!("{}", samples::render());
            Ok(())
        }
        Commands::GenerateMd { report, sort } => {
            report::generate_md_from_json(report, args.output.as_deref(), *sort)
        }
        Commands::Files { target, expand } => {
            let (repo_url, branch) = resolve_target(target, &project_path, &config)?;
            let client = AnalysisClient::new(&config.api_url, config.timeout())?;
            match client.list_files(&repo_url, &branch).await {
                Ok(files) => emit(&args, &files, |f| report::render_listing(f, None, expand)),
                Err(e) => Err(fail(&e, &Route::Input)),
            }
        }
        Commands::Analyze {
            target,
            file,
            expand,
        } => {
            let (repo_url, branch) = resolve_target(target, &project_path, &config)?;
            run_analyze(&args, &config, &repo_url, &branch, file.as_deref(), expand).await
        }
        Commands::Bulk {
            target,
            sort,
            tab,
            select,
            interactive,
        } => {
            let (repo_url, branch) = resolve_target(target, &project_path, &config)?;
            let bulk = run_bulk(&args, &config, &repo_url, &branch, *sort, *tab).await?;
            let picked = if *interactive {
                pick_file(&bulk, *sort)?
            } else {
                select.clone()
            };
            if let Some(path) = picked {
                remember_file(&config, &bulk, &repo_url, &branch, &path)?;
            }
            Ok(())
        }
        Commands::Details {
            link,
            repo,
            branch,
            file,
        } => {
            let route = match link {
                Some(link) => Route::from_link(link),
                None => {
                    let mut query = url::form_urlencoded::Serializer::new(String::new());
                    for (key, value) in [("repo", repo), ("branch", branch), ("file", file)] {
                        if let Some(value) = value {
                            query.append_pair(key, value);
                        }
                    }
                    Route::resolve(Page::FileDetails, &query.finish())
                }
            };
            show_details(&args, &config, route)
        }
    }
}

/// Repository and branch from the flags, else from the local checkout.
fn resolve_target(
    target: &Target,
    project_path: &Path,
    config: &Config,
) -> Result<(String, String)> {
    if let Some(repo_url) = &target.repo {
        let branch = target
            .branch
            .clone()
            .unwrap_or_else(|| config.default_branch.clone());
        return Ok((repo_url.clone(), branch));
    }
    let local = repo::discover(project_path)?;
    info!("using repository {} from {}", local.url, project_path.display());
    let branch = target
        .branch
        .clone()
        .or(local.branch)
        .unwrap_or_else(|| config.default_branch.clone());
    Ok((local.url, branch))
}

async fn run_analyze(
    args: &Args,
    config: &Config,
    repo_url: &str,
    branch: &str,
    file: Option<&str>,
    expand: &[String],
) -> Result<()> {
    let client = AnalysisClient::new(&config.api_url, config.timeout())?;
    let mut view = AnalysisView::new();
    let ticket = view
        .begin()
        .ok_or_else(|| anyhow!("an analysis is already running"))?;

    let outcome = match file {
        // re-analysis of one file keeps the listing out of the round-trip
        Some(path) => client
            .analyze(repo_url, branch, Some(path))
            .await
            .map(|analysis| repo2score::client::RepositoryResults {
                files: Vec::new(),
                analysis,
            }),
        None => client.load_repository(repo_url, branch).await,
    };
    if let Err(e) = &outcome {
        debug!("analysis failed: {}", e);
    }
    view.settle(ticket, outcome);

    let retry = Route::Results {
        repo: repo_url.to_string(),
        branch: branch.to_string(),
    };
    match view.into_status() {
        ViewStatus::Loaded(results) => {
            info!("analyzed {}", results.analysis.analyzed_file_path);
            emit(args, &results, |r| report::render_results(r, expand))
        }
        ViewStatus::Failed(message) => Err(failed_view(&message, &retry)),
        ViewStatus::Idle | ViewStatus::Loading => Err(anyhow!("analysis did not settle")),
    }
}

async fn run_bulk(
    args: &Args,
    config: &Config,
    repo_url: &str,
    branch: &str,
    sort: SortKey,
    tab: Tab,
) -> Result<BulkAnalysisResponse> {
    let client = AnalysisClient::new(&config.api_url, config.timeout())?;
    let mut view = AnalysisView::new();
    let ticket = view
        .begin()
        .ok_or_else(|| anyhow!("an analysis is already running"))?;

    let progress = SyntheticProgress::start(1.0);
    let outcome = client.analyze_bulk(repo_url, branch).await;
    drop(progress);
    view.settle(ticket, outcome);

    let retry = Route::Analysis {
        repo: repo_url.to_string(),
        branch: branch.to_string(),
    };
    match view.into_status() {
        ViewStatus::Loaded(bulk) => {
            emit(args, &bulk, |b| report::render_bulk(b, sort, tab))?;
            Ok(bulk)
        }
        ViewStatus::Failed(message) => Err(failed_view(&message, &retry)),
        ViewStatus::Idle | ViewStatus::Loading => Err(anyhow!("bulk analysis did not settle")),
    }
}

fn pick_file(bulk: &BulkAnalysisResponse, sort: SortKey) -> Result<Option<String>> {
    let sorted = aggregate::sort_files(&bulk.analyzed_files, sort);
    let items: Vec<String> = sorted
        .iter()
        .map(|f| format!("{:>3.0}  {}", f.ai_score, f.file_info.relative_path))
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Open file details")
        .items(&items)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|index| sorted[index].file_info.relative_path.clone()))
}

fn handoff_cache(config: &Config) -> Result<HandoffCache<FileStore>> {
    let store = match &config.cache_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location()?,
    };
    Ok(HandoffCache::new(store))
}

fn remember_file(
    config: &Config,
    bulk: &BulkAnalysisResponse,
    repo_url: &str,
    branch: &str,
    path: &str,
) -> Result<()> {
    let file_result = bulk
        .analyzed_files
        .iter()
        .find(|f| f.file_info.relative_path == path)
        .ok_or_else(|| anyhow!("{} is not among the analyzed files", path))?
        .clone();
    let cache = handoff_cache(config)?;
    cache.put(&HandoffRecord {
        file_result,
        repo_url: repo_url.to_string(),
        branch: branch.to_string(),
    })?;
    let route = Route::FileDetails {
        repo: repo_url.to_string(),
        branch: branch.to_string(),
        file: path.to_string(),
    };
    info!("file details stored in {}", cache.store().dir().display());
    eprintln!("Open details with: repo2score details '{}'", route);
    Ok(())
}

fn show_details(args: &Args, config: &Config, route: Route) -> Result<()> {
    let Route::FileDetails { repo, branch, file } = route else {
        debug!("detail view without repository or file, back to input");
        eprintln!("Enter a repository to analyze, for example:\n");
        eprint!("{}", samples::render());
        return Ok(());
    };
    let back = Route::Analysis {
        repo: repo.clone(),
        branch: branch.clone(),
    };
    match handoff_cache(config)?.resolve(&repo, &branch, &file) {
        Ok(result) => emit(args, &result, |r| report::render_file_details(r, &repo)),
        Err(e) => Err(fail(&e, &back)),
    }
}

fn fail(err: &AnalysisError, recover: &Route) -> anyhow::Error {
    debug!("{}", err);
    failed_view(&err.user_message(), recover)
}

/// Prints the recovery action and returns the failure for `main` to report.
fn failed_view(message: &str, recover: &Route) -> anyhow::Error {
    error!("{}", message);
    match recover {
        Route::Results { repo, branch } => {
            eprintln!(
                "Retry with: repo2score analyze --repo '{}' --branch '{}'",
                repo, branch
            )
        }
        Route::Analysis { repo, branch } => {
            eprintln!(
                "Back to analysis: repo2score bulk --repo '{}' --branch '{}'",
                repo, branch
            )
        }
        Route::Input | Route::FileDetails { .. } => {
            eprintln!("Start over with: repo2score samples")
        }
    }
    anyhow!(message.to_string())
}

/// Writes `value` as JSON or as the Markdown from `render`, to `--output` or stdout.
fn emit<T: Serialize>(args: &Args, value: &T, render: impl FnOnce(&T) -> String) -> Result<()> {
    let format = Format::choose(args.json, args.output.as_deref());
    let content = report::format_report(format, value, render)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("report written to {}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
