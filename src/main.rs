use anyhow::Result;
use clap::{Parser, Subcommand};
use hoard::areas::repository::Repository;
use hoard::commands::porcelain::log::LogOptions;
use hoard::config::{HoardConfig, LOG_ENV};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hoard",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Content-addressed version control for binary game assets",
    long_about = "hoard stores every file by the SHA-256 of its content, records project \
    snapshots as commits on per-project branches, understands engine packages well enough \
    to extract their dependencies, and watches tracked assets for corruption.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(short = 'p', long, help = "The object id to print")]
        sha: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object store"
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object store")]
        write: bool,
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "ls-tree", about = "List the files of a tree, commit or branch")]
    LsTree {
        #[arg(index = 1, help = "Tree id, commit id or branch name")]
        revision: String,
    },
    #[command(
        name = "commit",
        about = "Snapshot the working copy onto the current branch",
        long_about = "This command records every file of the working copy in a new commit on \
        HOARD_BRANCH of HOARD_PROJECT. The author comes from HOARD_AUTHOR."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(long, help = "Print the analytics record of the new commit as JSON")]
        analytics: bool,
    },
    #[command(name = "log", about = "Show the history of the current branch")]
    Log {
        #[arg(short = 'n', long = "max-count", default_value_t = usize::MAX, hide_default_value = true)]
        max_count: usize,
        #[arg(long, help = "One commit per line")]
        oneline: bool,
    },
    #[command(name = "diff", about = "Show files changed between two commits or branches")]
    Diff {
        #[arg(index = 1)]
        from: String,
        #[arg(index = 2)]
        to: String,
        #[arg(long = "diff-filter", help = "Only show Added (A), Deleted (D) or Modified (M) files")]
        diff_filter: Option<String>,
    },
    #[command(name = "branch", about = "List, create, or delete branches")]
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },
    #[command(name = "analyze", about = "Analyze engine assets and their dependencies")]
    Analyze {
        #[arg(index = 1, help = "Files to analyze; all recognised assets when omitted")]
        files: Vec<String>,
        #[arg(long, help = "Print the analysis as JSON")]
        json: bool,
    },
    #[command(name = "track", about = "Start tracking the integrity of assets")]
    Track {
        #[arg(index = 1, required = true)]
        files: Vec<String>,
    },
    #[command(
        name = "verify",
        about = "Verify tracked assets, recovering them where possible",
        long_about = "This command checks tracked assets against their recorded fingerprints. \
        Low and medium severity corruption is repaired automatically; anything else is left \
        for manual intervention and makes the command fail."
    )]
    Verify {
        #[arg(index = 1, help = "Files to verify; every tracked asset when omitted")]
        files: Vec<String>,
    },
    #[command(name = "restore", about = "Restore a tracked asset from its newest healthy backup")]
    Restore {
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "resolve", about = "Accept the current content of an asset awaiting manual intervention")]
    Resolve {
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "gc", about = "Remove objects no branch or backup refers to")]
    Gc {
        #[arg(long, default_value_t = 3600, help = "Keep unreachable objects younger than this many seconds")]
        grace_secs: u64,
    },
}

#[derive(Subcommand)]
enum BranchAction {
    #[command(name = "list", about = "List branches of the current project")]
    List,
    #[command(name = "create", about = "Create a new branch")]
    Create {
        #[arg(index = 1)]
        name: String,
        #[arg(index = 2, help = "Branch or commit id to start from")]
        source: Option<String>,
    },
    #[command(name = "delete", about = "Delete a branch")]
    Delete {
        #[arg(index = 1)]
        name: String,
    },
}

fn open_repository(path: Option<&str>, config: HoardConfig) -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    let path = path.map(str::to_string).unwrap_or_else(|| pwd.to_string_lossy().to_string());

    Repository::new(&path, Box::new(std::io::stdout()), config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = HoardConfig::load_from_env()?;

    match &cli.command {
        Commands::Init { path } => open_repository(path.as_deref(), config)?.init()?,
        Commands::CatFile { sha } => open_repository(None, config)?.cat_file(sha)?,
        Commands::HashObject { write, file } => open_repository(None, config)?.hash_object(file, *write)?,
        Commands::LsTree { revision } => open_repository(None, config)?.ls_tree(revision)?,
        Commands::Commit { message, analytics } => open_repository(None, config)?.commit(message, *analytics)?,
        Commands::Log { max_count, oneline } => open_repository(None, config)?.log(&LogOptions {
            max_count: *max_count,
            oneline: *oneline,
        })?,
        Commands::Diff { from, to, diff_filter } => {
            open_repository(None, config)?.diff(from, to, diff_filter.as_deref())?
        }
        Commands::Branch { action } => {
            let mut repository = open_repository(None, config)?;
            match action {
                BranchAction::List => repository.list_branches()?,
                BranchAction::Create { name, source } => repository.create_branch(name, source.as_deref())?,
                BranchAction::Delete { name } => repository.delete_branch(name)?,
            }
        }
        Commands::Analyze { files, json } => open_repository(None, config)?.analyze(files, *json)?,
        Commands::Track { files } => open_repository(None, config)?.track(files).await?,
        Commands::Verify { files } => open_repository(None, config)?.verify(files).await?,
        Commands::Restore { file } => open_repository(None, config)?.restore(file).await?,
        Commands::Resolve { file } => open_repository(None, config)?.resolve(file).await?,
        Commands::Gc { grace_secs } => open_repository(None, config)?.gc(Duration::from_secs(*grace_secs))?,
    }

    Ok(())
}
