use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tutorcal::cache::CachedSource;
use tutorcal::config::Config;
use tutorcal::model::adapter::to_ics;
use tutorcal::schedule::{self, ScheduleSources};
use tutorcal::storage::FileStore;

const USAGE: &str = "\
Usage: tutorcal [--ics] [--config <PATH>] [BASE_URL]

Prints the expanded lesson calendar as JSON (default) or iCalendar (--ics).
Without BASE_URL the config file is read (default: ~/.config/tutorcal/config.toml).
Set RUST_LOG=info (or debug) for diagnostics on stderr.";

#[derive(Debug, Default)]
struct Args {
    ics: bool,
    config: Option<PathBuf>,
    base_url: Option<String>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = Args::default();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--ics" => args.ics = true,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => bail!("unknown option {}", other),
            other => args.base_url = Some(other.to_string()),
        }
    }
    Ok(Some(args))
}

async fn run() -> Result<()> {
    let Some(args) = parse_args()? else {
        println!("{}", USAGE);
        return Ok(());
    };

    // --- CONFIGURATION LOGIC ---
    // Explicit URL wins, then explicit config path, then the default config file
    let config = match (&args.base_url, &args.config) {
        (Some(url), _) => Config::new(url),
        (None, Some(path)) => Config::load_from(path)?,
        (None, None) => Config::load().map_err(|e| {
            eprintln!("{}", USAGE);
            e
        })?,
    };

    let store = match &config.cache_dir {
        Some(dir) => FileStore::new(dir.clone())?,
        None => FileStore::open_default()?,
    };
    tracing::debug!(cache_dir = %store.dir().display(), "using cache");

    let sources = ScheduleSources::from_config(&config)?;
    let cache = CachedSource::new(store);
    let loaded = schedule::load(&sources, &cache).await?;

    if let Some(ts) = loaded.sources.oldest_stale() {
        eprintln!(
            "Offline: showing data cached at {}",
            ts.format("%Y-%m-%d %H:%M UTC")
        );
    }
    for skipped in &loaded.skipped {
        eprintln!(
            "Skipped schedule {} ({}): {}",
            skipped.regular_id, skipped.student, skipped.reason
        );
    }

    let output = if args.ics {
        to_ics(&loaded.occurrences)
    } else {
        serde_json::to_string_pretty(&loaded.occurrences)?
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Failed to load schedule: {:#}", e);
        std::process::exit(1);
    }
}
