//! HubKit CLI - download, upload, and cache management for hub repositories.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use hubkit_client as client;
use hubkit_core::{DownloadOptions, HubToken, PushOptions, RepoId, RepoKind, Result};

#[derive(Parser)]
#[command(name = "hubkit")]
#[command(author, version, about = "Hub integration toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Repository kind accepted on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum RepoKindArg {
    /// Model repository
    #[default]
    Model,
    /// Dataset repository
    Dataset,
    /// Space repository
    Space,
}

impl From<RepoKindArg> for RepoKind {
    fn from(arg: RepoKindArg) -> Self {
        match arg {
            RepoKindArg::Model => RepoKind::Model,
            RepoKindArg::Dataset => RepoKind::Dataset,
            RepoKindArg::Space => RepoKind::Space,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download a file or a whole snapshot from a repository
    Download {
        /// Repository identifier (e.g. org/model)
        repo: String,

        /// Single file to fetch; omit to download the snapshot
        #[arg(short, long)]
        file: Option<String>,

        /// Branch, tag, or commit to resolve
        #[arg(short, long)]
        revision: Option<String>,

        /// Override the local cache location
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Bypass the cache and fetch fresh copies
        #[arg(long)]
        force: bool,

        /// Resolve from the local cache only; never touch the network
        #[arg(long)]
        offline: bool,

        /// Access token for private repositories
        #[arg(long)]
        token: Option<String>,

        /// Override the hub endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Only download files matching these patterns
        #[arg(long)]
        include: Vec<String>,

        /// Skip files matching these patterns
        #[arg(long)]
        exclude: Vec<String>,

        /// Repository kind
        #[arg(long, value_enum, default_value = "model")]
        repo_type: RepoKindArg,
    },

    /// Upload a folder to a repository as a single commit
    Upload {
        /// Local folder to upload
        folder: PathBuf,

        /// Destination repository identifier
        repo: String,

        /// Commit summary
        #[arg(short, long)]
        message: Option<String>,

        /// Create the repository as private when missing
        #[arg(long)]
        private: bool,

        /// Target branch
        #[arg(short, long)]
        branch: Option<String>,

        /// Land the commit on a new pull request
        #[arg(long)]
        create_pr: bool,

        /// Only upload files matching these patterns
        #[arg(long)]
        include: Vec<String>,

        /// Skip files matching these patterns
        #[arg(long)]
        exclude: Vec<String>,

        /// Access token
        #[arg(long)]
        token: Option<String>,

        /// Override the hub endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Repository kind
        #[arg(long, value_enum, default_value = "model")]
        repo_type: RepoKindArg,
    },

    /// Create a repository
    CreateRepo {
        /// Repository identifier
        repo: String,

        /// Create as private
        #[arg(long)]
        private: bool,

        /// Access token
        #[arg(long)]
        token: Option<String>,

        /// Override the hub endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Repository kind
        #[arg(long, value_enum, default_value = "model")]
        repo_type: RepoKindArg,
    },

    /// Inspect or clear the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory path
    Path,
    /// Print cached repositories and total size
    Size,
    /// Remove the entire cache
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Download {
            repo,
            file,
            revision,
            cache_dir,
            force,
            offline,
            token,
            endpoint,
            include,
            exclude,
            repo_type,
        } => {
            let repo_id: RepoId = repo.parse()?;
            let opts = DownloadOptions {
                revision,
                cache_dir,
                force_download: force,
                local_files_only: offline,
                token: token.map(HubToken::new),
                endpoint,
                progress: true,
                ..Default::default()
            };

            let path = match file {
                Some(filename) => {
                    client::download_file(&repo_id, &filename, repo_type.into(), &opts).await?
                }
                None => {
                    client::download_snapshot(
                        &repo_id,
                        repo_type.into(),
                        &opts,
                        slice_opt(&include),
                        slice_opt(&exclude),
                    )
                    .await?
                }
            };
            println!("{}", path.display());
        }

        Commands::Upload {
            folder,
            repo,
            message,
            private,
            branch,
            create_pr,
            include,
            exclude,
            token,
            endpoint,
            repo_type,
        } => {
            let repo_id: RepoId = repo.parse()?;
            let mut opts = PushOptions {
                private,
                branch,
                create_pr,
                allow_patterns: vec_opt(include),
                ignore_patterns: vec_opt(exclude),
                token: token.map(HubToken::new),
                endpoint,
                ..Default::default()
            };
            if let Some(message) = message {
                opts.commit_message = message;
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}").expect("valid template"),
            );
            spinner.set_message(format!("uploading {} to {repo_id}", folder.display()));
            spinner.enable_steady_tick(std::time::Duration::from_millis(120));

            client::create_repo(&repo_id, repo_type.into(), &opts).await?;
            let info = client::upload_folder(&folder, &repo_id, repo_type.into(), &opts).await?;
            spinner.finish_and_clear();

            if let Some(url) = info.pr_url.or(info.commit_url) {
                println!("{url}");
            }
        }

        Commands::CreateRepo {
            repo,
            private,
            token,
            endpoint,
            repo_type,
        } => {
            let repo_id: RepoId = repo.parse()?;
            let opts = PushOptions {
                private,
                token: token.map(HubToken::new),
                endpoint,
                ..Default::default()
            };
            let url = client::create_repo(&repo_id, repo_type.into(), &opts).await?;
            println!("{url}");
        }

        Commands::Cache { action } => match action {
            CacheAction::Path => println!("{}", client::cache_dir().display()),
            CacheAction::Size => {
                for repo in client::scan_cache(None)? {
                    println!("{:>12}  {}", human_size(repo.size_bytes), repo.repo_id);
                }
                println!("{:>12}  total", human_size(client::cache_size(None)?));
            }
            CacheAction::Clear => {
                client::clear_cache(None)?;
                tracing::info!("cache cleared");
            }
        },
    }

    Ok(())
}

fn slice_opt(patterns: &[String]) -> Option<&[String]> {
    (!patterns.is_empty()).then_some(patterns)
}

fn vec_opt(patterns: Vec<String>) -> Option<Vec<String>> {
    (!patterns.is_empty()).then_some(patterns)
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
