// ghusers command-line driver.
// Runs the sync coordinator against GitHub and prints what it returns.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ghusers::{
    Config, FileUserStore, GitHubClient, Result, SyncCoordinator, UserCache, UserSummary,
};

/// Browse GitHub users through a local cache.
#[derive(Parser)]
#[command(name = "ghusers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cache directory (overrides GHUSERS_CACHE_DIR)
    #[arg(global = true, short, long)]
    cache_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users, cache first
    List {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Fetch and cache detail for one user
    Detail {
        /// GitHub login
        login: String,
    },

    /// Purge the local cache
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ghusers=debug")
        } else {
            EnvFilter::new("ghusers=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", e.kind().label(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }

    let source = Arc::new(GitHubClient::new(&config)?);
    let store = Arc::new(FileUserStore::open(&config.cache_dir)?);
    let coordinator = SyncCoordinator::new(source, Arc::clone(&store), config.page_size);

    match cli.command {
        Commands::List { pages } => {
            print_users(&coordinator.load_initial().await?);
            for _ in 1..pages {
                let more = coordinator.load_more().await?;
                if more.is_empty() {
                    break;
                }
                print_users(&more);
            }
        }
        Commands::Detail { login } => {
            // Users not cached yet take their id from the detail response.
            let record = match store.find_by_login(&login).await? {
                Some(record) => coordinator.load_detail(&record.to_summary()).await?,
                None => coordinator.load_detail_by_login(&login).await?,
            };
            println!("{} (#{})", record.login, record.id);
            println!("  profile:   {}", record.profile_url);
            println!("  followers: {}", record.followers);
            println!("  following: {}", record.following);
            println!("  location:  {}", record.location);
            println!("  blog:      {}", record.blog);
        }
        Commands::Reset => {
            coordinator.reset().await?;
            println!("Cache cleared.");
        }
    }

    Ok(())
}

fn print_users(users: &[UserSummary]) {
    for user in users {
        println!("{:>10}  {:<24} {}", user.id, user.login, user.profile_url);
    }
}
