//! `pagetrack replay` — Feed a command buffer through a live tracker.

use pagetrack_agent::{CommandQueue, ElementAttributes, Tracker};
use pagetrack_config::{ConfigError, SeedConfig, TrackerConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

pub struct ReplayArgs {
    pub buffer: Option<PathBuf>,
    pub seed: Option<PathBuf>,
    pub stdin: bool,
    pub endpoint: Option<String>,
    pub wait: u64,
}

pub async fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TrackerConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    override_endpoint(&mut config, args.endpoint)?;

    let queue = match &args.buffer {
        Some(path) => {
            let raw: Vec<Value> = read_json(path)?;
            let (queue, errors) = CommandQueue::from_wire_buffer(&raw);
            for e in &errors {
                println!("  ⚠️  Skipping buffer entry: {e}");
            }
            println!("  Loaded {} command(s) from {}", queue.len(), path.display());
            queue
        }
        None => CommandQueue::new(),
    };

    println!("📦 Delivering to {}", config.track_url());
    let tracker = Tracker::from_config(&config, queue)?;

    if let Some(path) = &args.seed {
        match seed_from_file(&tracker, &config.seed, path)? {
            SeedOutcome::Seeded => println!("  Seeded product event from {}", path.display()),
            SeedOutcome::NothingToSeed => println!("  No seedable element in {}", path.display()),
            SeedOutcome::Disabled => {
                println!("  Auto-seed disabled in config, ignoring {}", path.display())
            }
        }
    }

    if args.stdin {
        let report = feed_lines(&tracker, BufReader::new(tokio::io::stdin())).await?;
        println!(
            "  Read {} command(s) from stdin, skipped {} invalid line(s)",
            report.accepted, report.invalid
        );
    }

    if !settle(&tracker, Duration::from_secs(args.wait)).await {
        println!(
            "\n  ⚠️  Gave up waiting after {}s with {} delivery(ies) in flight",
            args.wait,
            tracker.in_flight()
        );
    }

    let stats = tracker.stats();
    println!(
        "\n📊 Session {} (started {})",
        tracker.session().id(),
        tracker.session().started_at().to_rfc3339()
    );
    println!("  Issued:     {}", stats.issued);
    println!("  Delivered:  {}", stats.delivered);
    println!("  Failed:     {}", stats.failed);
    println!("  Retried:    {}", stats.retried);
    println!("  Deferred:   {}", stats.deferred);
    println!("  Rejected:   {}", stats.rejected);
    println!("  Discarded:  {}", stats.discarded);
    println!("  Abandoned:  {}", stats.abandoned);
    println!("  Pending:    {}", tracker.pending());
    tracing::debug!(?stats, "Replay finished");

    Ok(())
}

/// Apply `--endpoint` over the loaded config and re-validate.
fn override_endpoint(
    config: &mut TrackerConfig,
    endpoint: Option<String>,
) -> Result<(), ConfigError> {
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
        config.validate()?;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum SeedOutcome {
    Seeded,
    NothingToSeed,
    Disabled,
}

/// Seed from a JSON array of element attribute maps. The file is not read
/// when auto-seed is disabled.
fn seed_from_file(
    tracker: &Tracker,
    seed: &SeedConfig,
    path: &Path,
) -> pagetrack_core::Result<SeedOutcome> {
    if !seed.enabled {
        return Ok(SeedOutcome::Disabled);
    }
    let elements: Vec<ElementAttributes> = read_json(path)?;
    Ok(match tracker.seed(&elements, &seed.marker_attribute) {
        Some(_) => SeedOutcome::Seeded,
        None => SeedOutcome::NothingToSeed,
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FeedReport {
    accepted: usize,
    invalid: usize,
}

/// Push one wire command per non-blank line. Lines that are not JSON are
/// skipped; JSON that is not a command is rejected by the tracker.
async fn feed_lines<R: AsyncBufRead + Unpin>(
    tracker: &Tracker,
    reader: R,
) -> std::io::Result<FeedReport> {
    let mut report = FeedReport::default();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(raw) => {
                tracker.push_wire(&raw);
                report.accepted += 1;
            }
            Err(e) => {
                println!("  ⚠️  Skipping invalid JSON line: {e}");
                report.invalid += 1;
            }
        }
    }
    Ok(report)
}

/// Wait for in-flight deliveries. Returns false if `wait` ran out first.
async fn settle(tracker: &Tracker, wait: Duration) -> bool {
    tokio::time::timeout(wait, tracker.wait_idle()).await.is_ok()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> pagetrack_core::Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
