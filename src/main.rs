pub mod cache;
pub mod cli;
pub mod github;
pub mod render;
pub mod stats;
pub mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::cache::{CachePaths, CacheStore, DEFAULT_COMMENT_LINES};
use crate::cli::Timings;
use crate::github::{GRAPHQL_ENDPOINT, GitHubClient};
use crate::render::{CardValues, age_between, format_thousands, padded_count};
use crate::stats::Reconciler;
use crate::types::Affiliation;

#[derive(Parser)]
#[command(
    name = "ghstats",
    about = "GitHub profile statistics with an incremental lines-of-code cache"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the LOC cache and print the totals
    Loc {
        #[command(flatten)]
        cache: CacheArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Ownership affiliations to include (repeatable); each set keeps its
        /// own cache file
        #[arg(long = "affiliation", value_enum)]
        affiliations: Vec<Affiliation>,

        /// Zero every cached row and crawl all repositories again
        #[arg(long)]
        force_rebuild: bool,
    },

    /// Print the total commit count from the existing cache
    Commits {
        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Collect every statistic and rewrite the SVG cards
    Update {
        #[command(flatten)]
        cache: CacheArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// SVG card to rewrite (repeatable)
        #[arg(long = "svg", required = true)]
        svgs: Vec<PathBuf>,

        /// Birthday used for the age line, as YYYY-MM-DD
        #[arg(long)]
        birthday: NaiveDate,

        /// Zero every cached row and crawl all repositories again
        #[arg(long)]
        force_rebuild: bool,
    },

    /// List the index and text of every tspan in an SVG card
    Elements {
        /// SVG card to inspect
        svg: PathBuf,
    },
}

#[derive(Args)]
struct CacheArgs {
    /// Account whose statistics are collected
    #[arg(long, env = "USER_NAME")]
    user: String,

    /// Directory holding the LOC cache files
    #[arg(long, env = "GHSTATS_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Number of legend lines at the top of the cache file
    #[arg(long, default_value_t = DEFAULT_COMMENT_LINES)]
    comment_lines: usize,
}

impl CacheArgs {
    /// The cache file for rows listed through `affiliations`.
    fn store(&self, affiliations: &[Affiliation]) -> CacheStore {
        let paths = match &self.cache_dir {
            Some(dir) => CachePaths::new(dir),
            None => CachePaths::default(),
        };
        CacheStore::for_account(&paths, &self.user, affiliations, self.comment_lines)
    }
}

#[derive(Args)]
struct RemoteArgs {
    /// Personal access token
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// GraphQL endpoint
    #[arg(long, env = "GHSTATS_ENDPOINT", default_value = GRAPHQL_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl RemoteArgs {
    fn client(&self, login: &str) -> GitHubClient {
        GitHubClient::with_timeout(
            login,
            self.token.as_str(),
            Duration::from_secs(self.timeout_secs),
        )
        .with_endpoint(self.endpoint.as_str())
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Loc {
            cache,
            remote,
            affiliations,
            force_rebuild,
        } => cmd_loc(&cache, &remote, &affiliations, force_rebuild),
        Commands::Commits { cache } => cmd_commits(&cache),
        Commands::Update {
            cache,
            remote,
            svgs,
            birthday,
            force_rebuild,
        } => cmd_update(&cache, &remote, &svgs, birthday, force_rebuild),
        Commands::Elements { svg } => cmd_elements(&svg),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_loc(
    cache: &CacheArgs,
    remote: &RemoteArgs,
    affiliations: &[Affiliation],
    force_rebuild: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let affiliations = if affiliations.is_empty() {
        &Affiliation::ALL[..]
    } else {
        affiliations
    };
    let store = cache.store(affiliations);
    let mut client = remote.client(&cache.user);

    let author = client.account_id()?;
    let summary = Reconciler::new(&mut client, &store, &author)
        .force_rebuild(force_rebuild)
        .run(affiliations)?;

    println!("Cache:       {}", store.path().display());
    println!(
        "Status:      {}",
        if summary.fully_cached { "cached" } else { "updated" }
    );
    println!("LOC added:   {}", format_thousands(summary.added as i64));
    println!("LOC deleted: {}", format_thousands(summary.deleted as i64));
    println!("LOC net:     {}", format_thousands(summary.net()));
    println!("API calls:   {}", client.counts());

    Ok(())
}

fn cmd_commits(cache: &CacheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let total = cache.store(&Affiliation::ALL).total_commits()?;
    println!("{}", format_thousands(total as i64));
    Ok(())
}

fn cmd_update(
    cache: &CacheArgs,
    remote: &RemoteArgs,
    svgs: &[PathBuf],
    birthday: NaiveDate,
    force_rebuild: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = cache.store(&Affiliation::ALL);
    let mut client = remote.client(&cache.user);
    let mut timings = Timings::new();

    println!("Calculation times:");

    let (author, elapsed) = Timings::measure(|| client.account_id());
    timings.record("account data", elapsed);
    let author = author?;

    let (age, elapsed) = Timings::measure(|| age_between(birthday, Local::now().date_naive()));
    timings.record("age calculation", elapsed);

    let (followers, elapsed) = Timings::measure(|| client.followers());
    timings.record("follower counter", elapsed);
    let followers = followers?;

    let (owned, elapsed) = Timings::measure(|| client.repo_stats(&[Affiliation::Owner]));
    timings.record("stars & my repos", elapsed);
    let owned = owned?;

    let (contributed, elapsed) = Timings::measure(|| client.repo_stats(&Affiliation::ALL));
    timings.record("contributed repos", elapsed);
    let contributed = contributed?;

    let (summary, elapsed) = Timings::measure(|| {
        Reconciler::new(&mut client, &store, &author)
            .force_rebuild(force_rebuild)
            .run(&Affiliation::ALL)
    });
    let summary = summary?;
    timings.record(
        if summary.fully_cached {
            "LOC (cached)"
        } else {
            "LOC (no cache)"
        },
        elapsed,
    );

    let (commits, elapsed) = Timings::measure(|| store.total_commits());
    timings.record("commit counter", elapsed);
    let commits = commits?;

    let values = CardValues {
        age: age.to_string(),
        repos: padded_count(owned.repositories, 2),
        contributed: padded_count(contributed.repositories, 2),
        commits: padded_count(commits, 7),
        stars: format_thousands(owned.stars as i64),
        followers: padded_count(followers, 4),
        loc_net: format_thousands(summary.net()),
        loc_added: format_thousands(summary.added as i64),
        loc_deleted: format_thousands(summary.deleted as i64),
    };
    for svg in svgs {
        render::overwrite_card(svg, &values)?;
    }

    cli::print_summary(&timings, client.counts());
    Ok(())
}

fn cmd_elements(svg: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(svg)?;
    for (index, content) in render::tspan_texts(&text).into_iter().enumerate() {
        match content {
            Some(content) => println!("{} {}", index, content),
            None => println!("{} <empty>", index),
        }
    }
    Ok(())
}
