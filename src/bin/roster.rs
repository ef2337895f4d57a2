//! Command-line client for the roster mock backend.
//!
//! Drives the users cache over HTTP, seeded from the persisted preferences.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use user_roster::client::{CacheSnapshot, HttpUsersApi, UsersCache};
use user_roster::config::Config;
use user_roster::models::{Gender, Profile};
use user_roster::prefs::{JsonFileStore, PreferencesHandle};

#[derive(Debug, Parser)]
#[command(name = "roster", about = "Browse and edit the mock users backend")]
struct Args {
    /// Base URL of the roster server (overrides ROSTER_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List users matching the saved (or given) search
    List {
        /// Search text; saved for next time
        #[arg(long)]
        q: Option<String>,
        /// Page size 1..=50; saved for next time
        #[arg(long)]
        limit: Option<usize>,
        /// Follow cursors until every match is loaded
        #[arg(long)]
        all: bool,
    },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_parser = parse_gender)]
        gender: Gender,
        #[arg(long)]
        title: String,
    },
    /// Delete a user by id
    Delete { id: u64 },
}

fn parse_gender(raw: &str) -> Result<Gender, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let prefs = PreferencesHandle::load(JsonFileStore::new(&config.prefs_path));
    let api_url = args.api_url.unwrap_or(config.api_url);
    let cache = UsersCache::new(HttpUsersApi::new(api_url));

    match run(args.command, &prefs, &cache).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    prefs: &PreferencesHandle<JsonFileStore>,
    cache: &UsersCache<HttpUsersApi>,
) -> Result<(), String> {
    match command {
        Command::List { q, limit, all } => {
            if let Some(q) = q {
                prefs.set_query(q).map_err(|e| e.to_string())?;
            }
            if let Some(limit) = limit {
                prefs.set_limit(limit).map_err(|e| e.to_string())?;
            }

            let current = prefs.current();
            cache
                .query(current.filter(), current.limit, None, true)
                .await
                .map_err(|e| e.to_string())?;

            while all && cache.snapshot().has_more() {
                cache.load_more().await.map_err(|e| e.to_string())?;
            }

            print_snapshot(&cache.snapshot());
        }
        Command::Create {
            name,
            email,
            gender,
            title,
        } => {
            let user = cache
                .create_optimistic(Profile {
                    name,
                    email,
                    gender,
                    title,
                })
                .await
                .map_err(|e| e.to_string())?;
            println!("Created user {} ({})", user.id, user.profile.name);
        }
        Command::Delete { id } => {
            let removed = cache
                .delete_optimistic(id)
                .await
                .map_err(|e| e.to_string())?;
            println!("Deleted user {} ({})", removed.id, removed.profile.name);
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &CacheSnapshot) {
    println!(
        "{:>5}  {:<24} {:<36} {:<11} {}",
        "ID", "NAME", "EMAIL", "GENDER", "TITLE"
    );
    for user in snapshot.items() {
        let id = user.id().map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:>5}  {:<24} {:<36} {:<11} {}",
            id,
            user.profile.name,
            user.profile.email,
            user.profile.gender.as_str(),
            user.profile.title
        );
    }

    println!(
        "\nShowing {} of {}{}",
        snapshot.items().len(),
        snapshot.total(),
        if snapshot.has_more() {
            " (use --all to load the rest)"
        } else {
            ""
        }
    );

    let counts = snapshot
        .gender_counts()
        .iter()
        .map(|(gender, count)| format!("{}: {}", gender, count))
        .collect::<Vec<_>>()
        .join(", ");
    if !counts.is_empty() {
        println!("By gender: {}", counts);
    }
}
